//! VPC label for Namespaces.
//!
//! A namespace must belong to a workspace. Its `nci.yunshan.net/vpc` label
//! is set to the VPC resolved for that workspace. This is the only policy
//! that rejects objects outright.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Namespace;
use tracing::{info, warn};

use super::{VPC_LABEL, Verdict, WORKSPACE_LABEL, mutation_required};
use crate::config::ServerConfig;
use crate::store::{ClusterStore, workspace_exists};
use crate::webhooks::naming::resolve_vpc_name;
use crate::webhooks::patch::{TargetField, merge_patch};
use crate::{Error, Result};

/// Evaluate a Namespace
pub async fn evaluate(
    config: &ServerConfig,
    store: &dyn ClusterStore,
    namespace: &Namespace,
) -> Result<Verdict> {
    let meta = &namespace.metadata;
    let name = meta.name.clone().unwrap_or_default();

    if !mutation_required(meta) {
        info!(namespace = %name, "Skipping mutation due to policy check");
        return Ok(Verdict::Allow);
    }

    let labels = meta.labels.as_ref();
    let Some(workspace) = labels.and_then(|l| l.get(WORKSPACE_LABEL)) else {
        warn!(namespace = %name, "Namespace not in any workspace");
        return Err(Error::MissingLabel {
            namespace: name,
            key: WORKSPACE_LABEL.to_string(),
        });
    };

    if config.verify_workspace && !workspace_exists(store, workspace).await? {
        return Err(Error::WorkspaceNotFound(workspace.clone()));
    }

    let vpc = resolve_vpc_name(workspace, &config.vpc_prefix, &config.irregular_workspaces);

    if labels.and_then(|l| l.get(VPC_LABEL)) == Some(&vpc) {
        info!(namespace = %name, vpc = %vpc, "VPC label already set");
        return Ok(Verdict::Allow);
    }

    info!(namespace = %name, workspace = %workspace, vpc = %vpc, "Labelling namespace with VPC");
    let additions = BTreeMap::from([(VPC_LABEL.to_string(), vpc)]);
    Ok(Verdict::patch(merge_patch(
        TargetField::Labels,
        labels,
        &additions,
    )))
}
