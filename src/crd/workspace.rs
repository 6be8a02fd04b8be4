//! KubeSphere Workspace Custom Resource Definition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label placed on namespaces that belong to a workspace
pub const WORKSPACE_LABEL: &str = "kubesphere.io/workspace";

/// KubeSphere tenant workspace (cluster scoped).
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "tenant.kubesphere.io",
    version = "v1alpha1",
    kind = "Workspace",
    plural = "workspaces"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    /// Workspace manager user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,

    /// Network isolation toggle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_isolation: Option<bool>,
}
