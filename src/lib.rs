//! vpc-admission-webhook library crate
//!
//! This module exports the admission dispatcher, mutation policies, CRD
//! models and the cluster store the policies read and write through.

pub mod config;
pub mod crd;
pub mod error;
pub mod health;
pub mod quantity;
pub mod store;
pub mod webhooks;

pub use config::{ServerConfig, WebhookArgs};
pub use error::{Error, Result};
pub use health::HealthState;
pub use store::{ClusterStore, KubeStore, MemoryStore};
pub use webhooks::{
    Dispatcher, KindRegistry, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError,
    WebhookState, run_webhook_server,
};
