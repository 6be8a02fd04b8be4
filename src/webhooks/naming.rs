//! VPC naming.
//!
//! Maps a workspace to the name of the VPC its namespaces attach to. The
//! order of the rules matters: the `default` prefix beats the irregular
//! workspace list, which beats the reserved names, which beat the generic
//! `<prefix>-<workspace>` join.

use std::collections::BTreeSet;

use crate::config::DEFAULT_VPC_PREFIX;

/// VPC shared by the whole cluster
pub const DEFAULT_VPC: &str = "default";

/// Workspaces that always live in the cluster default VPC
const RESERVED_WORKSPACES: &[&str] = &["system-workspace", "firefly"];

/// Legacy VPC names of irregular workspaces
fn legacy_vpc_name(workspace: &str) -> &str {
    match workspace {
        "midcloud" => "db-middleware",
        "bigdata-usercenter2" => "bigdata-jh-ks",
        other => other,
    }
}

/// Resolve the VPC name for a workspace
pub fn resolve_vpc_name(workspace: &str, prefix: &str, irregular: &BTreeSet<String>) -> String {
    if prefix == DEFAULT_VPC_PREFIX {
        return DEFAULT_VPC.to_string();
    }

    if irregular.contains(workspace) {
        return legacy_vpc_name(workspace).to_string();
    }

    if RESERVED_WORKSPACES.contains(&workspace) {
        return DEFAULT_VPC.to_string();
    }

    format!("{}-{}", prefix, workspace)
}
