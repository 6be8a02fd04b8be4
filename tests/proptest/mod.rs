// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for vpc-admission-webhook.
//!
//! Uses proptest to generate random inputs and verify invariants.

use std::collections::{BTreeMap, BTreeSet};

use json_patch::PatchOperation;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use proptest::prelude::*;
use serde_json::{Value, json};

use vpc_admission_webhook::webhooks::naming::resolve_vpc_name;
use vpc_admission_webhook::webhooks::patch::{TargetField, merge_patch};
use vpc_admission_webhook::webhooks::policies::deployment::gateway_addresses;
use vpc_admission_webhook::webhooks::policies::{MUTATE_ANNOTATION, mutation_required};

/// Strategy for generating workspace names (DNS labels).
fn workspace_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}[a-z0-9]"
}

/// Strategy for generating VPC prefixes other than `default`.
fn prefix() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,10}".prop_filter("not the default prefix", |p| p != "default")
}

/// Strategy for generating irregular workspace lists.
fn irregular_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(workspace_name(), 0..5)
}

/// Strategy for generating label or annotation maps.
fn string_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z./-]{1,20}", "[a-zA-Z0-9-]{0,12}", 0..6)
}

fn apply(doc: &Value, ops: &[PatchOperation]) -> Value {
    let mut doc = doc.clone();
    json_patch::patch(&mut doc, ops).unwrap();
    doc
}

proptest! {
    /// The same inputs always resolve to the same name.
    #[test]
    fn vpc_name_is_deterministic(
        ws in workspace_name(),
        prefix in prefix(),
        irregular in irregular_set(),
    ) {
        prop_assert_eq!(
            resolve_vpc_name(&ws, &prefix, &irregular),
            resolve_vpc_name(&ws, &prefix, &irregular)
        );
    }

    /// The default prefix routes every workspace to the default VPC.
    #[test]
    fn default_prefix_always_wins(ws in workspace_name(), irregular in irregular_set()) {
        let mut irregular = irregular;
        irregular.insert(ws.clone());
        prop_assert_eq!(resolve_vpc_name(&ws, "default", &irregular), "default");
    }

    /// Ordinary workspaces get `<prefix>-<workspace>`.
    #[test]
    fn regular_workspaces_are_prefixed(ws in workspace_name(), prefix in prefix()) {
        prop_assume!(ws != "system-workspace" && ws != "firefly");
        prop_assert_eq!(
            resolve_vpc_name(&ws, &prefix, &BTreeSet::new()),
            format!("{}-{}", prefix, ws)
        );
    }

    /// Only the listed opt-out values switch mutation off.
    #[test]
    fn gate_matches_opt_out_list(value in "[a-zA-Z]{0,8}") {
        let meta = ObjectMeta {
            annotations: Some(BTreeMap::from([(MUTATE_ANNOTATION.to_string(), value.clone())])),
            ..Default::default()
        };
        let opted_out = ["n", "no", "false", "off", "disable", ""]
            .contains(&value.to_lowercase().as_str());
        prop_assert_eq!(mutation_required(&meta), !opted_out);
    }

    /// Gateway addresses are consecutive and stay inside the network's /24.
    #[test]
    fn gateway_addresses_are_consecutive(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=240) {
        let ips = gateway_addresses(&format!("{}.{}.{}.{}/24", a, b, c, d)).unwrap();
        prop_assert_eq!(ips.len(), 15);
        for (offset, ip) in ips.iter().enumerate() {
            let octets = ip.octets();
            prop_assert_eq!(&octets[..3], &[a, b, c][..]);
            prop_assert_eq!(usize::from(octets[3]), usize::from(d) + offset + 1);
        }
    }

    /// Applying a merge patch keeps existing keys and lets additions win.
    #[test]
    fn merge_patch_overlays_additions(existing in string_map(), additions in string_map()) {
        let ops = merge_patch(TargetField::Labels, Some(&existing), &additions);
        prop_assert_eq!(ops.len(), usize::from(!additions.is_empty()));

        let doc = json!({ "metadata": { "labels": existing } });
        let patched = apply(&doc, &ops);
        let labels: BTreeMap<String, String> =
            serde_json::from_value(patched["metadata"]["labels"].clone()).unwrap();

        let mut expected = existing.clone();
        expected.extend(additions.clone());
        prop_assert_eq!(labels, expected);
    }

    /// Merge patches create the target map when it is missing.
    #[test]
    fn merge_patch_creates_missing_map(additions in string_map()) {
        prop_assume!(!additions.is_empty());
        let ops = merge_patch(TargetField::Annotations, None, &additions);

        let doc = json!({ "spec": { "template": { "metadata": {} } } });
        let patched = apply(&doc, &ops);
        let annotations: BTreeMap<String, String> = serde_json::from_value(
            patched["spec"]["template"]["metadata"]["annotations"].clone(),
        )
        .unwrap();
        prop_assert_eq!(annotations, additions);
    }
}
