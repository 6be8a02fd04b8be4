//! vpc-admission-webhook - binds KubeSphere workspaces to SDN VPCs at admission time.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Parses configuration from flags and environment
//! - Creates the Kubernetes client and cluster store
//! - Starts the health server and the TLS webhook server

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kube::Client;
use tokio::signal;
use tracing::{error, info};

use vpc_admission_webhook::health::{HealthState, run_health_server};
use vpc_admission_webhook::{
    Dispatcher, KindRegistry, KubeStore, ServerConfig, WebhookArgs, WebhookState,
    run_webhook_server,
};

/// Grace period for in-flight admissions to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install the crypto provider before any TLS config is built
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        return Err("failed to install rustls crypto provider".into());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vpc_admission_webhook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    let args = WebhookArgs::parse();
    let config = Arc::new(ServerConfig::from_args(&args)?);
    info!(
        vpc_prefix = %config.vpc_prefix,
        cluster = %config.cluster_name,
        irregular_workspaces = ?config.irregular_workspaces,
        verify_workspace = config.verify_workspace,
        "Starting vpc-admission-webhook"
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let health_state = Arc::new(HealthState::new());
    let dispatcher = Dispatcher::new(
        config,
        Arc::new(KubeStore::new(client)),
        KindRegistry::new(),
    );
    let webhook_state = Arc::new(WebhookState::new(dispatcher, health_state.clone()));

    let health_handle = {
        let health_state = health_state.clone();
        let port = args.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let webhook_handle = {
        let port = args.port;
        let cert = args.tls_cert_file.clone();
        let key = args.tls_key_file.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(webhook_state, port, &cert, &key).await {
                error!("Webhook server error: {}", e);
            }
        })
    };

    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Stop receiving new admissions
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admissions to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
