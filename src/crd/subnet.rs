//! Subnet Custom Resource Definition.
//!
//! A Subnet exposes the CIDR block allocated to a namespace by the SDN
//! controller. The webhook only ever reads `spec.cidr`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Subnet allocated to a namespace.
///
/// Example:
/// ```yaml
/// apiVersion: nci.yunshan.net/v1
/// kind: Subnet
/// metadata:
///   name: team-a-dev
///   namespace: team-a-dev
/// spec:
///   cidr: 10.64.88.0/24
///   gateway: 10.64.88.254
///   protocol: IPv4
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "nci.yunshan.net",
    version = "v1",
    kind = "Subnet",
    plural = "subnets",
    status = "SubnetStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// CIDR block, e.g. `10.64.88.0/24`
    #[serde(default)]
    pub cidr: String,

    /// Gateway address of the subnet
    #[serde(default)]
    pub gateway: String,

    /// IP protocol (`IPv4` or `IPv6`)
    #[serde(default)]
    pub protocol: String,
}

/// Allocation status reported by the SDN controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    #[serde(default)]
    pub available_ips: String,
    #[serde(default)]
    pub num_available_ips: i64,
    #[serde(default)]
    pub num_using_ips: i64,
    #[serde(default)]
    pub valid: bool,
}
