//! Workspace VPC lifecycle.
//!
//! Driven synchronously from Workspace admission: CREATE makes sure the VPC
//! exists, DELETE makes sure it is gone, anything else is a no-op. With the
//! `default` prefix there are no per-workspace VPCs and nothing happens.
//!
//! The existence check and the create/delete are separate store calls, not
//! a compare-and-swap. Two admissions racing on the same workspace can leave
//! the VPC out of step with the last operation; workspace lifecycle events
//! are rare enough that no lock is taken.

use std::fmt;

use kube::core::admission::Operation;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::crd::Vpc;
use crate::store::{self, ClusterStore};
use crate::webhooks::naming::resolve_vpc_name;
use crate::{Error, Result};

/// What the driver did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VpcAction {
    /// Shared default VPC or an operation that does not touch VPCs
    Skipped,
    /// CREATE found the VPC already there
    AlreadyPresent(String),
    /// CREATE made a new VPC
    Created(String),
    /// DELETE found no VPC
    AlreadyAbsent(String),
    /// DELETE removed the VPC
    Deleted(String),
}

impl VpcAction {
    /// Metric label for the action
    pub fn as_str(&self) -> &'static str {
        match self {
            VpcAction::Skipped => "skipped",
            VpcAction::AlreadyPresent(_) => "already_present",
            VpcAction::Created(_) => "created",
            VpcAction::AlreadyAbsent(_) => "already_absent",
            VpcAction::Deleted(_) => "deleted",
        }
    }
}

impl fmt::Display for VpcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric and log label of an admission operation
pub fn operation_label(operation: &Operation) -> &'static str {
    #[allow(unreachable_patterns)]
    match operation {
        Operation::Create => "create",
        Operation::Update => "update",
        Operation::Delete => "delete",
        Operation::Connect => "connect",
        _ => "unknown",
    }
}

fn lifecycle_error(name: &str, operation: &Operation, source: Error) -> Error {
    error!(
        vpc = %name,
        operation = operation_label(operation),
        error = %source,
        "VPC lifecycle failed"
    );
    Error::VpcLifecycle {
        name: name.to_string(),
        operation: operation.clone(),
        source: Box::new(source),
    }
}

/// Bring the workspace VPC in line with the admitted operation
pub async fn drive(
    config: &ServerConfig,
    store: &dyn ClusterStore,
    operation: &Operation,
    workspace: &str,
) -> Result<VpcAction> {
    if config.uses_default_vpc() {
        return Ok(VpcAction::Skipped);
    }

    let name = resolve_vpc_name(workspace, &config.vpc_prefix, &config.irregular_workspaces);

    match operation {
        Operation::Create => {
            let exists = store::vpc_exists(store, &name)
                .await
                .map_err(|e| lifecycle_error(&name, operation, e))?;
            if exists {
                info!(vpc = %name, workspace, "VPC already exists");
                return Ok(VpcAction::AlreadyPresent(name));
            }

            let vpc = Vpc::for_workspace(&name, &config.cluster_name, workspace);
            store::create_vpc(store, &vpc)
                .await
                .map_err(|e| lifecycle_error(&name, operation, e))?;
            info!(vpc = %name, workspace, cluster = %config.cluster_name, "Created VPC");
            Ok(VpcAction::Created(name))
        }
        Operation::Delete => {
            let exists = store::vpc_exists(store, &name)
                .await
                .map_err(|e| lifecycle_error(&name, operation, e))?;
            if !exists {
                info!(vpc = %name, workspace, "VPC already absent");
                return Ok(VpcAction::AlreadyAbsent(name));
            }

            match store::delete_vpc(store, &name).await {
                Ok(()) => {
                    info!(vpc = %name, workspace, "Deleted VPC");
                    Ok(VpcAction::Deleted(name))
                }
                // Removed by someone else since the check
                Err(e) if e.is_not_found() => {
                    info!(vpc = %name, workspace, "VPC already absent");
                    Ok(VpcAction::AlreadyAbsent(name))
                }
                Err(e) => Err(lifecycle_error(&name, operation, e)),
            }
        }
        _ => Ok(VpcAction::Skipped),
    }
}
