//! VPC Custom Resource Definition.
//!
//! A VPC is the tenant network backing every namespace of a workspace. The
//! webhook creates one when a workspace is created and deletes it with the
//! workspace. It carries no spec of its own; the SDN controller fills in
//! the rest.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label recording the cluster a VPC was created for
pub const VPC_CLUSTER_LABEL: &str = "cluster";
/// Label recording the workspace a VPC belongs to
pub const VPC_WORKSPACE_LABEL: &str = "workspace";

/// Per-workspace virtual network.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "nci.yunshan.net",
    version = "v1",
    kind = "VPC",
    plural = "vpcs"
)]
pub struct VpcSpec {}

/// The derive names the resource after its kind
pub type Vpc = VPC;

impl Vpc {
    /// Build the VPC object created for a workspace
    pub fn for_workspace(name: &str, cluster: &str, workspace: &str) -> Self {
        let labels = BTreeMap::from([
            (VPC_CLUSTER_LABEL.to_string(), cluster.to_string()),
            (VPC_WORKSPACE_LABEL.to_string(), workspace.to_string()),
        ]);
        Vpc {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: VpcSpec::default(),
        }
    }
}
