//! Test fixtures and builder patterns for admission requests.

use std::collections::BTreeMap;

use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionReview};
use serde_json::{Value, json};

pub const TEST_UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// Builder for AdmissionReview test payloads.
///
/// # Example
/// ```
/// let review = ReviewBuilder::new("Namespace", "team-a-dev")
///     .operation("CREATE")
///     .object(namespace_object("team-a-dev", &[("kubesphere.io/workspace", "team-a")], &[]))
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct ReviewBuilder {
    kind: String,
    name: String,
    namespace: Option<String>,
    operation: String,
    object: Option<Value>,
}

impl ReviewBuilder {
    /// Create a new builder for a request of `kind` naming `name`.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            operation: "CREATE".to_string(),
            object: None,
        }
    }

    /// Set the request namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the operation (CREATE, UPDATE, DELETE, CONNECT).
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Set the admitted object.
    pub fn object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }

    /// Build the AdmissionReview JSON.
    pub fn build(self) -> Value {
        let (group, version, resource) = match self.kind.as_str() {
            "Deployment" => ("apps", "v1", "deployments"),
            "Workspace" => ("tenant.kubesphere.io", "v1alpha1", "workspaces"),
            "Namespace" => ("", "v1", "namespaces"),
            "Pod" => ("", "v1", "pods"),
            _ => ("", "v1", "configmaps"),
        };
        let mut request = json!({
            "uid": TEST_UID,
            "kind": { "group": group, "version": version, "kind": self.kind },
            "resource": { "group": group, "version": version, "resource": resource },
            "name": self.name,
            "operation": self.operation,
            "userInfo": { "username": "admin" },
            "dryRun": false
        });
        if let Some(namespace) = self.namespace {
            request["namespace"] = json!(namespace);
        }
        if let Some(object) = self.object {
            request["object"] = object;
        }
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": request
        })
    }

    /// Build the typed admission request.
    pub fn request(self) -> AdmissionRequest<DynamicObject> {
        let review: AdmissionReview<DynamicObject> =
            serde_json::from_value(self.build()).expect("valid AdmissionReview");
        review.try_into().expect("review carries a request")
    }
}

fn string_map(pairs: &[(&str, &str)]) -> Value {
    let map: BTreeMap<&str, &str> = pairs.iter().copied().collect();
    json!(map)
}

/// Namespace object with the given labels and annotations.
pub fn namespace_object(name: &str, labels: &[(&str, &str)], annotations: &[(&str, &str)]) -> Value {
    let mut metadata = json!({ "name": name });
    if !labels.is_empty() {
        metadata["labels"] = string_map(labels);
    }
    if !annotations.is_empty() {
        metadata["annotations"] = string_map(annotations);
    }
    json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": metadata })
}

/// Labels carried by the platform ingress gateway Deployment.
pub const GATEWAY: &[(&str, &str)] = &[
    ("app.kubernetes.io/component", "controller"),
    ("app.kubernetes.io/name", "ingress-nginx"),
];

/// Deployment object with the given labels and pod template annotations.
pub fn deployment_object(
    name: &str,
    namespace: &str,
    labels: &[(&str, &str)],
    template_annotations: &[(&str, &str)],
) -> Value {
    let mut template_metadata = json!({ "labels": { "app": name } });
    if !template_annotations.is_empty() {
        template_metadata["annotations"] = string_map(template_annotations);
    }
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": namespace, "labels": string_map(labels) },
        "spec": {
            "selector": { "matchLabels": { "app": name } },
            "template": {
                "metadata": template_metadata,
                "spec": { "containers": [{ "name": "controller", "image": "ingress-nginx" }] }
            }
        }
    })
}

/// Pod object whose containers carry the given resources blocks.
pub fn pod_object(name: &str, namespace: &str, resources: &[Option<Value>]) -> Value {
    let containers: Vec<Value> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut container = json!({ "name": format!("c{}", i), "image": "nginx" });
            if let Some(r) = r {
                container["resources"] = r.clone();
            }
            container
        })
        .collect();
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "containers": containers }
    })
}

/// Workspace object.
pub fn workspace_object(name: &str) -> Value {
    json!({
        "apiVersion": "tenant.kubesphere.io/v1alpha1",
        "kind": "Workspace",
        "metadata": { "name": name },
        "spec": { "manager": "admin" }
    })
}

/// Workspace as seeded into a cluster store.
pub fn workspace(name: &str) -> DynamicObject {
    serde_json::from_value(workspace_object(name)).expect("valid workspace")
}

/// Subnet allocated to a namespace.
pub fn subnet(namespace: &str, name: &str, cidr: &str) -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "nci.yunshan.net/v1",
        "kind": "Subnet",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "cidr": cidr, "gateway": "", "protocol": "IPv4" }
    }))
    .expect("valid subnet")
}

/// Pre-existing VPC.
pub fn vpc(name: &str) -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "nci.yunshan.net/v1",
        "kind": "VPC",
        "metadata": { "name": name },
        "spec": {}
    }))
    .expect("valid vpc")
}
