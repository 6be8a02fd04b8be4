//! Admission webhook server.
//!
//! Provides the HTTPS `/mutate` endpoint for Kubernetes admission webhooks.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a MutatingWebhookConfiguration for Pods, Namespaces,
//!    Deployments and Workspaces pointing at `/mutate`
//! 3. Mount the TLS certificate secret to the webhook pod at /etc/webhook/certs/

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tracing::{error, info};

use crate::health::{HealthState, outcome};
use crate::webhooks::router::{Dispatcher, into_response};
use crate::webhooks::vpc_lifecycle::operation_label;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub dispatcher: Dispatcher,
    pub health: Arc<HealthState>,
}

impl WebhookState {
    pub fn new(dispatcher: Dispatcher, health: Arc<HealthState>) -> Self {
        Self { dispatcher, health }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate))
        .with_state(state)
}

/// Mutating admission webhook handler
async fn mutate(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let started = Instant::now();
    let admission = state.dispatcher.admit(&request).await;

    let metrics = &state.health.metrics;
    metrics.record_admission(
        &admission.kind,
        outcome(&admission.verdict),
        started.elapsed().as_secs_f64(),
    );
    let operation = operation_label(&request.operation);
    if let Some(action) = &admission.vpc_action {
        metrics.record_vpc_operation(operation, action.as_str());
    } else if admission
        .error
        .as_ref()
        .is_some_and(|e| matches!(e, crate::Error::VpcLifecycle { .. }))
    {
        metrics.record_vpc_operation(operation, "failed");
    }

    let response = into_response(&request, admission.verdict);
    info!(
        uid = %request.uid,
        kind = %admission.kind,
        allowed = response.allowed,
        patched = response.patch.is_some(),
        "AdmissionResponse sent"
    );

    (StatusCode::OK, Json(response.into_review()))
}

/// Errors that can occur when running the webhook server
#[derive(Debug)]
pub enum WebhookError {
    /// TLS configuration error
    TlsConfig(String),
    /// Server error
    Server(String),
}

impl std::fmt::Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookError::TlsConfig(msg) => write!(f, "TLS configuration error: {}", msg),
            WebhookError::Server(msg) => write!(f, "Webhook server error: {}", msg),
        }
    }
}

impl std::error::Error for WebhookError {}

/// Run the webhook server with TLS
///
/// Binds to `0.0.0.0:<port>` and serves the /mutate endpoint.
///
/// # Arguments
/// * `state` - Dispatcher and health state shared by all requests
/// * `port` - Port to listen on
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    port: u16,
    cert_path: &str,
    key_path: &str,
) -> Result<(), WebhookError> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let health = state.health.clone();
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(PathBuf::from(cert_path), PathBuf::from(key_path))
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening with TLS");
    health.set_ready(true).await;

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
