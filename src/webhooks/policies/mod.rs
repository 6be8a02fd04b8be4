//! Mutation policies for the admitted kinds.
//!
//! Each policy looks at one typed object and returns a [`Verdict`]:
//! - `pod`: raise container ephemeral storage to the 2Gi floor
//! - `namespace`: label the namespace with its workspace VPC
//! - `deployment`: pin ingress gateway pods to fixed subnet addresses
//! - `workspace`: create or delete the workspace VPC
//!
//! Pod, Namespace and Deployment first pass the mutation-required gate.

pub mod deployment;
pub mod namespace;
pub mod pod;
pub mod workspace;

use json_patch::PatchOperation;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::info;

/// Annotation that opts an object out of mutation
pub const MUTATE_ANNOTATION: &str = "admission-webhook-ks.cmft/mutate";
/// Namespace label holding the VPC name
pub const VPC_LABEL: &str = "nci.yunshan.net/vpc";
/// Pod template annotation holding the fixed gateway addresses
pub const IPS_ANNOTATION: &str = "nci.yunshan.net/ips";
pub use crate::crd::WORKSPACE_LABEL;

/// Annotation values that switch mutation off
const OPT_OUT_VALUES: &[&str] = &["n", "no", "false", "off", "disable", ""];

/// Outcome of a policy
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Admit the object unchanged
    Allow,
    /// Admit the object with a JSON patch
    Patch(Vec<PatchOperation>),
    /// Reject the request with a message
    Deny(String),
}

impl Verdict {
    /// Patch verdict, or plain allow when there is nothing to apply
    pub fn patch(ops: Vec<PatchOperation>) -> Self {
        if ops.is_empty() {
            Verdict::Allow
        } else {
            Verdict::Patch(ops)
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, Verdict::Deny(_))
    }
}

/// Whether an object should be mutated.
///
/// Absent annotation means yes; the annotation only opts out.
pub fn mutation_required(meta: &ObjectMeta) -> bool {
    let required = match meta
        .annotations
        .as_ref()
        .and_then(|a| a.get(MUTATE_ANNOTATION))
    {
        Some(value) => !OPT_OUT_VALUES.contains(&value.to_lowercase().as_str()),
        None => true,
    };
    info!(name = ?meta.name, required, "Mutation policy");
    required
}
