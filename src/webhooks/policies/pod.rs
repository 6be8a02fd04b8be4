//! Ephemeral storage floor for Pods.
//!
//! Every container whose `ephemeral-storage` limit is unset, zero or at most
//! 2Gi gets both request and limit set to exactly 2Gi. Containers above the
//! floor are left alone, so the patch may skip indices.

use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, info};

use super::{Verdict, mutation_required};
use crate::quantity::{GIB, parse_quantity};
use crate::webhooks::patch::{EPHEMERAL_STORAGE, ephemeral_storage_ops};

/// Ephemeral storage floor as a quantity string
pub const EPHEMERAL_STORAGE_FLOOR: &str = "2Gi";
const EPHEMERAL_STORAGE_FLOOR_BYTES: i128 = 2 * GIB;

/// Whether a container limit needs raising to the floor
pub fn needs_floor(limit: Option<&str>) -> bool {
    match limit.and_then(parse_quantity) {
        None => true,
        Some(bytes) => bytes <= EPHEMERAL_STORAGE_FLOOR_BYTES,
    }
}

/// Evaluate a Pod
pub fn evaluate(pod: &Pod) -> Verdict {
    let name = pod.metadata.name.as_deref().unwrap_or_default();
    if !mutation_required(&pod.metadata) {
        info!(name, "Skipping mutation due to policy check");
        return Verdict::Allow;
    }

    let Some(spec) = pod.spec.as_ref() else {
        return Verdict::Allow;
    };

    let mut ops = Vec::new();
    for (index, container) in spec.containers.iter().enumerate() {
        let limit = container
            .resources
            .as_ref()
            .and_then(|r| r.limits.as_ref())
            .and_then(|l| l.get(EPHEMERAL_STORAGE))
            .map(|q| q.0.as_str());

        if needs_floor(limit) {
            debug!(name, container = %container.name, ?limit, "Raising ephemeral storage");
            ops.extend(ephemeral_storage_ops(
                index,
                container,
                EPHEMERAL_STORAGE_FLOOR,
            ));
        }
    }

    Verdict::patch(ops)
}
