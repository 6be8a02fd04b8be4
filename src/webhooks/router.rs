//! Dispatch of admission requests to policies.
//!
//! [`KindRegistry`] maps the kind declared by a request to the policy that
//! handles it. It is built once at startup and owned by the [`Dispatcher`];
//! nothing is registered globally.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use json_patch::Patch;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::store::ClusterStore;
use crate::webhooks::policies::{self, Verdict};
use crate::webhooks::vpc_lifecycle::VpcAction;
use crate::{Error, Result};

/// Kinds the webhook mutates
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Pod,
    Namespace,
    Deployment,
    Workspace,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Workspace => "Workspace",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup table from request kind to policy
#[derive(Clone, Debug)]
pub struct KindRegistry {
    kinds: BTreeMap<String, ResourceKind>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KindRegistry {
    /// Registry with every supported kind
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for kind in [
            ResourceKind::Pod,
            ResourceKind::Namespace,
            ResourceKind::Deployment,
            ResourceKind::Workspace,
        ] {
            registry.register(kind);
        }
        registry
    }

    /// Registry that handles nothing
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, kind: ResourceKind) {
        self.kinds.insert(kind.as_str().to_string(), kind);
    }

    pub fn resolve(&self, kind: &str) -> Option<ResourceKind> {
        self.kinds.get(kind).copied()
    }
}

/// Decode the request object into its typed form
fn decode<K: DeserializeOwned>(
    kind: ResourceKind,
    request: &AdmissionRequest<DynamicObject>,
) -> Result<K> {
    let object = request.object.as_ref().ok_or_else(|| Error::MissingObject {
        kind: kind.to_string(),
        name: request.name.clone(),
    })?;
    let value = serde_json::to_value(object)?;
    serde_json::from_value(value).map_err(|source| Error::Decode {
        kind: kind.to_string(),
        source,
    })
}

/// Result of one admission decision
#[derive(Debug)]
pub struct Admission {
    /// Kind label for logs and metrics (`unknown` when unsupported)
    pub kind: String,
    pub verdict: Verdict,
    /// Set for Workspace requests that reached the VPC driver
    pub vpc_action: Option<VpcAction>,
    /// Set when the verdict is a denial caused by an error
    pub error: Option<Error>,
}

/// Routes requests to policies and builds the responses
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    store: Arc<dyn ClusterStore>,
    registry: KindRegistry,
}

impl Dispatcher {
    pub fn new(
        config: Arc<ServerConfig>,
        store: Arc<dyn ClusterStore>,
        registry: KindRegistry,
    ) -> Self {
        Self {
            config,
            store,
            registry,
        }
    }

    /// Decide on a request
    pub async fn admit(&self, request: &AdmissionRequest<DynamicObject>) -> Admission {
        info!(
            uid = %request.uid,
            kind = %request.kind.kind,
            name = %request.name,
            namespace = ?request.namespace,
            operation = ?request.operation,
            user = ?request.user_info.username,
            "AdmissionReview received"
        );

        let Some(kind) = self.registry.resolve(&request.kind.kind) else {
            let err = Error::UnsupportedKind(request.kind.kind.clone());
            warn!(uid = %request.uid, error = %err, "Unsupported kind");
            return Admission {
                kind: "unknown".to_string(),
                verdict: Verdict::Deny(err.to_string()),
                vpc_action: None,
                error: Some(err),
            };
        };

        let mut vpc_action = None;
        let result = match kind {
            ResourceKind::Pod => {
                decode::<Pod>(kind, request).map(|pod| policies::pod::evaluate(&pod))
            }
            ResourceKind::Namespace => match decode::<Namespace>(kind, request) {
                Ok(ns) => {
                    policies::namespace::evaluate(&self.config, self.store.as_ref(), &ns).await
                }
                Err(e) => Err(e),
            },
            ResourceKind::Deployment => match decode::<Deployment>(kind, request) {
                Ok(deployment) => {
                    let namespace = deployment
                        .metadata
                        .namespace
                        .clone()
                        .or_else(|| request.namespace.clone())
                        .unwrap_or_default();
                    policies::deployment::evaluate(self.store.as_ref(), &namespace, &deployment)
                        .await
                }
                Err(e) => Err(e),
            },
            ResourceKind::Workspace => {
                // DELETE carries no object, the name comes from the request
                policies::workspace::evaluate(
                    &self.config,
                    self.store.as_ref(),
                    &request.operation,
                    &request.name,
                )
                .await
                .map(|(verdict, action)| {
                    vpc_action = Some(action);
                    verdict
                })
            }
        };

        match result {
            Ok(verdict) => {
                debug!(uid = %request.uid, %kind, ?verdict, "Policy verdict");
                Admission {
                    kind: kind.to_string(),
                    verdict,
                    vpc_action,
                    error: None,
                }
            }
            Err(err) => {
                if err.is_external() {
                    error!(uid = %request.uid, %kind, error = %err, "Admission failed");
                } else {
                    warn!(uid = %request.uid, %kind, error = %err, "Admission denied");
                }
                Admission {
                    kind: kind.to_string(),
                    verdict: Verdict::Deny(err.to_string()),
                    vpc_action,
                    error: Some(err),
                }
            }
        }
    }
}

/// Build the response for a verdict. The request UID is always carried over.
pub fn into_response(
    request: &AdmissionRequest<DynamicObject>,
    verdict: Verdict,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    match verdict {
        Verdict::Allow => response,
        Verdict::Patch(ops) => match response.clone().with_patch(Patch(ops)) {
            Ok(patched) => patched,
            Err(e) => {
                let err = Error::from(e);
                error!(uid = %request.uid, error = %err, "Failed to serialize patch");
                response.deny(err.to_string())
            }
        },
        Verdict::Deny(message) => response.deny(message),
    }
}
