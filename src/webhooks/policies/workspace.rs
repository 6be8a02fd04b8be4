//! Workspace admission.
//!
//! Not subject to the mutation-required gate: the request operation alone
//! decides what happens to the workspace VPC, and the object is always
//! admitted unchanged when that succeeds.

use kube::core::admission::Operation;
use tracing::info;

use super::Verdict;
use crate::Result;
use crate::config::ServerConfig;
use crate::store::ClusterStore;
use crate::webhooks::vpc_lifecycle::{self, VpcAction};

/// Evaluate a Workspace admission
pub async fn evaluate(
    config: &ServerConfig,
    store: &dyn ClusterStore,
    operation: &Operation,
    workspace: &str,
) -> Result<(Verdict, VpcAction)> {
    let action = vpc_lifecycle::drive(config, store, operation, workspace).await?;
    info!(
        workspace,
        operation = vpc_lifecycle::operation_label(operation),
        %action,
        "Workspace admitted"
    );
    Ok((Verdict::Allow, action))
}
