//! Harness wiring a `MemoryStore` into the dispatcher and router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use vpc_admission_webhook::health::{self, HealthState};
use vpc_admission_webhook::store::{ClusterStore, MemoryStore};
use vpc_admission_webhook::webhooks::{
    Admission, Dispatcher, KindRegistry, Verdict, WebhookState, create_webhook_router,
};
use vpc_admission_webhook::ServerConfig;

use crate::fixtures::ReviewBuilder;

/// Prefix used by most tests
pub const PREFIX: &str = "acme";

/// Dispatcher, router and the store behind them.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub state: Arc<WebhookState>,
}

impl Harness {
    /// Harness with `prefix`, irregular workspace `midcloud` and cluster `poc`.
    pub fn new(prefix: &str) -> Self {
        Self::with_config(ServerConfig::new(prefix, ["midcloud"], "poc").unwrap())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(config, store.clone(), store)
    }

    /// Harness whose dispatcher talks to `backend` while `store` is kept for assertions.
    pub fn with_store(
        config: ServerConfig,
        store: Arc<MemoryStore>,
        backend: Arc<dyn ClusterStore>,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::new(config), backend, KindRegistry::new());
        let state = Arc::new(WebhookState::new(dispatcher, Arc::new(HealthState::new())));
        Self { store, state }
    }

    /// Decide on a request without going through HTTP.
    pub async fn admit(&self, review: ReviewBuilder) -> Admission {
        self.state.dispatcher.admit(&review.request()).await
    }

    pub fn router(&self) -> Router {
        create_webhook_router(self.state.clone())
    }

    /// POST an AdmissionReview to `/mutate`.
    pub async fn post(&self, review: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/mutate")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&review).unwrap()))
            .unwrap();
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Scrape the metrics endpoint of the health router.
    pub async fn metrics(&self) -> String {
        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = health::create_router(self.state.health.clone())
            .oneshot(request)
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

/// Apply a verdict's patch to an object, as the API server would.
pub fn apply(object: &Value, verdict: &Verdict) -> Value {
    let mut patched = object.clone();
    if let Verdict::Patch(ops) = verdict {
        json_patch::patch(&mut patched, ops).unwrap();
    }
    patched
}

/// Message of a denial, panicking on any other verdict.
pub fn denial(verdict: &Verdict) -> &str {
    match verdict {
        Verdict::Deny(message) => message,
        other => panic!("expected denial, got {:?}", other),
    }
}
