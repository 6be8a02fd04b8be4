//! Fixed addresses for the ingress gateway Deployment.
//!
//! The KubeSphere ingress-nginx controller of a namespace is pinned to the
//! first fifteen host addresses of the namespace subnet through the
//! `nci.yunshan.net/ips` pod template annotation. Other Deployments pass
//! through untouched.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::info;

use super::{IPS_ANNOTATION, Verdict, mutation_required};
use crate::store::{ClusterStore, namespace_subnet_cidr};
use crate::webhooks::patch::{TargetField, merge_patch};
use crate::{Error, Result};

/// Labels identifying the ingress gateway controller
pub const GATEWAY_LABELS: &[(&str, &str)] = &[
    ("app.kubernetes.io/component", "controller"),
    ("app.kubernetes.io/name", "ingress-nginx"),
];

/// Number of addresses reserved for the gateway
pub const GATEWAY_ADDRESS_COUNT: u8 = 15;

/// Whether the Deployment is the ingress gateway controller
pub fn is_ingress_gateway(meta: &ObjectMeta) -> bool {
    let Some(labels) = meta.labels.as_ref() else {
        return false;
    };
    GATEWAY_LABELS
        .iter()
        .all(|(key, value)| labels.get(*key).map(String::as_str) == Some(*value))
}

/// The fifteen addresses following the subnet address.
///
/// Only the address part of the CIDR is used; the last octet is incremented
/// one through fifteen.
pub fn gateway_addresses(cidr: &str) -> Result<Vec<Ipv4Addr>> {
    let invalid = |reason: &str| Error::InvalidCidr {
        cidr: cidr.to_string(),
        reason: reason.to_string(),
    };

    let (address, prefix) = match cidr.trim().split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (cidr.trim(), None),
    };
    if let Some(prefix) = prefix {
        match prefix.parse::<u8>() {
            Ok(len) if len <= 32 => {}
            _ => return Err(invalid("prefix length must be 0-32")),
        }
    }

    let address: Ipv4Addr = address
        .parse()
        .map_err(|_| invalid("not an IPv4 address"))?;
    let [a, b, c, d] = address.octets();

    (1..=GATEWAY_ADDRESS_COUNT)
        .map(|offset| {
            d.checked_add(offset)
                .map(|last| Ipv4Addr::new(a, b, c, last))
                .ok_or_else(|| invalid("not enough addresses left in the last octet"))
        })
        .collect()
}

/// Annotation carrying the comma separated gateway addresses
pub fn create_annotation(cidr: &str) -> Result<BTreeMap<String, String>> {
    let ips = gateway_addresses(cidr)?
        .iter()
        .map(Ipv4Addr::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Ok(BTreeMap::from([(IPS_ANNOTATION.to_string(), ips)]))
}

/// Evaluate a Deployment living in `namespace`
pub async fn evaluate(
    store: &dyn ClusterStore,
    namespace: &str,
    deployment: &Deployment,
) -> Result<Verdict> {
    let meta = &deployment.metadata;
    let name = meta.name.as_deref().unwrap_or_default();

    if !mutation_required(meta) {
        info!(name, namespace, "Skipping mutation due to policy check");
        return Ok(Verdict::Allow);
    }

    if !is_ingress_gateway(meta) {
        info!(name, namespace, "Not the platform gateway, skipping address pinning");
        return Ok(Verdict::Allow);
    }

    let cidr = namespace_subnet_cidr(store, namespace).await?;
    let additions = create_annotation(&cidr)?;

    let template_annotations = deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.annotations.as_ref());

    if template_annotations.and_then(|a| a.get(IPS_ANNOTATION)) == additions.get(IPS_ANNOTATION) {
        info!(name, namespace, "Gateway addresses already pinned");
        return Ok(Verdict::Allow);
    }

    info!(name, namespace, cidr = %cidr, "Pinning gateway addresses");
    Ok(Verdict::patch(merge_patch(
        TargetField::Annotations,
        template_annotations,
        &additions,
    )))
}
