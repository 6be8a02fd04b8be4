//! Webhook module for mutating admission requests.
//!
//! This module provides a single MutatingAdmissionWebhook endpoint that
//! dispatches on the request kind:
//! - Pod: ephemeral storage floor on every container
//! - Namespace: workspace VPC label
//! - Deployment: fixed ingress gateway addresses
//! - Workspace: VPC creation and deletion

pub mod naming;
pub mod patch;
pub mod policies;
pub mod router;
pub mod server;
pub mod vpc_lifecycle;

pub use policies::Verdict;
pub use router::{Admission, Dispatcher, KindRegistry, ResourceKind, into_response};
pub use server::{
    WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError, WebhookState,
    create_webhook_router, run_webhook_server,
};
pub use vpc_lifecycle::VpcAction;

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
