//! JSON patch construction.
//!
//! The webhook only ever emits `add` operations. Each one either creates a
//! map key or replaces a map wholesale, and every path points at a map that
//! already exists in the admitted object (or is created by an earlier
//! operation of the same patch).

use std::collections::BTreeMap;

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation};
use k8s_openapi::api::core::v1::Container;
use serde_json::{Map, Value};

/// Resource name of container scratch storage
pub const EPHEMERAL_STORAGE: &str = "ephemeral-storage";

/// Which string map of the admitted object a merge patch replaces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetField {
    /// `/metadata/labels` of the object itself
    Labels,
    /// `/spec/template/metadata/annotations` of a workload's pod template
    Annotations,
}

impl TargetField {
    fn tokens(self) -> &'static [&'static str] {
        match self {
            TargetField::Labels => &["metadata", "labels"],
            TargetField::Annotations => &["spec", "template", "metadata", "annotations"],
        }
    }

    /// JSON pointer of the map
    pub fn pointer(self) -> PointerBuf {
        PointerBuf::from_tokens(self.tokens().iter().copied())
    }
}

/// `/spec/containers/{index}/resources` followed by `extra`
fn container_pointer<'a>(index: &'a str, extra: &[&'a str]) -> PointerBuf {
    let base = ["spec", "containers", index, "resources"];
    PointerBuf::from_tokens(base.into_iter().chain(extra.iter().copied()))
}

fn add(path: PointerBuf, value: Value) -> PatchOperation {
    PatchOperation::Add(AddOperation { path, value })
}

/// Overlay `additions` onto `existing` and emit one `add` replacing the map.
///
/// Additions win on conflict. Nothing is emitted when there is nothing to add.
pub fn merge_patch(
    target: TargetField,
    existing: Option<&BTreeMap<String, String>>,
    additions: &BTreeMap<String, String>,
) -> Vec<PatchOperation> {
    if additions.is_empty() {
        return Vec::new();
    }

    let mut values = existing.cloned().unwrap_or_default();
    values.extend(additions.iter().map(|(k, v)| (k.clone(), v.clone())));

    let value = values
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect::<Map<String, Value>>();

    vec![add(target.pointer(), Value::Object(value))]
}

/// Set a container's ephemeral storage request and limit to `quantity`.
///
/// Always two operations, request first. When the `resources`, `requests` or
/// `limits` map is missing the operation creates it instead of a key inside it.
pub fn ephemeral_storage_ops(
    index: usize,
    container: &Container,
    quantity: &str,
) -> Vec<PatchOperation> {
    let index = index.to_string();
    let pointer = |extra: &[&str]| container_pointer(&index, extra);
    let storage = || {
        let mut map = Map::new();
        map.insert(EPHEMERAL_STORAGE.to_string(), Value::String(quantity.to_string()));
        Value::Object(map)
    };

    let resources = container.resources.as_ref();
    let has_requests = resources.is_some_and(|r| r.requests.is_some());
    let has_limits = resources.is_some_and(|r| r.limits.is_some());

    let request = match (resources, has_requests) {
        (None, _) => {
            let mut map = Map::new();
            map.insert("requests".to_string(), storage());
            add(pointer(&[]), Value::Object(map))
        }
        (Some(_), false) => add(pointer(&["requests"]), storage()),
        (Some(_), true) => add(
            pointer(&["requests", EPHEMERAL_STORAGE]),
            Value::String(quantity.to_string()),
        ),
    };

    let limit = if has_limits {
        add(
            pointer(&["limits", EPHEMERAL_STORAGE]),
            Value::String(quantity.to_string()),
        )
    } else {
        add(pointer(&["limits"]), storage())
    };

    vec![request, limit]
}
