//! Process configuration.
//!
//! Command line flags (each also readable from the environment) are parsed
//! once at startup into an immutable [`ServerConfig`] that every admission
//! call reads through an `Arc`.

use std::collections::BTreeSet;

use clap::Parser;

use crate::webhooks::server::{WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT};
use crate::{Error, Result};

/// VPC prefix that routes every namespace into the cluster-wide default VPC
pub const DEFAULT_VPC_PREFIX: &str = "default";

/// Default health server port
pub const HEALTH_PORT: u16 = 8080;

/// Mutating admission webhook binding KubeSphere workspaces to SDN VPCs
#[derive(Parser, Debug, Clone)]
#[command(name = "vpc-admission-webhook", version, about, long_about = None)]
pub struct WebhookArgs {
    /// Webhook server port
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = WEBHOOK_PORT)]
    pub port: u16,

    /// File containing the x509 certificate for HTTPS
    #[arg(long, env = "WEBHOOK_TLS_CERT_FILE", default_value = WEBHOOK_CERT_PATH)]
    pub tls_cert_file: String,

    /// File containing the x509 private key matching --tls-cert-file
    #[arg(long, env = "WEBHOOK_TLS_KEY_FILE", default_value = WEBHOOK_KEY_PATH)]
    pub tls_key_file: String,

    /// Prefix joined with the workspace name to form the VPC name
    #[arg(long, env = "VPC_PREFIX", default_value = DEFAULT_VPC_PREFIX)]
    pub vpc_prefix: String,

    /// Cluster name stamped on created VPCs
    #[arg(long, env = "CLUSTER_NAME", default_value = "poc")]
    pub cluster: String,

    /// Workspaces whose VPC predates the prefix naming, e.g. shanlv,tuangou
    #[arg(long = "irregular-workspaces", env = "IRREGULAR_WORKSPACES", value_delimiter = ',')]
    pub irregular_workspaces: Vec<String>,

    /// Port for the health and metrics server
    #[arg(long, env = "HEALTH_PORT", default_value_t = HEALTH_PORT)]
    pub health_port: u16,

    /// Reject namespaces whose workspace does not exist
    #[arg(
        long,
        env = "VERIFY_WORKSPACE",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub verify_workspace: bool,
}

/// Read-only configuration shared by every admission call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Prefix for per-workspace VPC names, or `default` for the shared VPC
    pub vpc_prefix: String,
    /// Workspaces with legacy VPC names
    pub irregular_workspaces: BTreeSet<String>,
    /// Cluster name recorded on created VPCs
    pub cluster_name: String,
    /// Whether namespace admission checks that the workspace exists
    pub verify_workspace: bool,
}

impl ServerConfig {
    /// Create a configuration, rejecting blank prefix or cluster name
    pub fn new(
        vpc_prefix: impl Into<String>,
        irregular_workspaces: impl IntoIterator<Item = impl AsRef<str>>,
        cluster_name: impl Into<String>,
    ) -> Result<Self> {
        let vpc_prefix = vpc_prefix.into();
        let cluster_name = cluster_name.into();

        if vpc_prefix.trim().is_empty() {
            return Err(Error::Config("vpc prefix must not be empty".to_string()));
        }
        if cluster_name.trim().is_empty() {
            return Err(Error::Config("cluster name must not be empty".to_string()));
        }

        let irregular_workspaces = irregular_workspaces
            .into_iter()
            .map(|ws| ws.as_ref().trim().to_string())
            .filter(|ws| !ws.is_empty())
            .collect();

        Ok(Self {
            vpc_prefix,
            irregular_workspaces,
            cluster_name,
            verify_workspace: true,
        })
    }

    /// Build the configuration from parsed command line flags
    pub fn from_args(args: &WebhookArgs) -> Result<Self> {
        let config = Self::new(&*args.vpc_prefix, &args.irregular_workspaces, &*args.cluster)?;
        Ok(config.with_verify_workspace(args.verify_workspace))
    }

    /// Toggle the workspace existence check
    pub fn with_verify_workspace(mut self, verify: bool) -> Self {
        self.verify_workspace = verify;
        self
    }

    /// Whether all namespaces share the cluster default VPC
    pub fn uses_default_vpc(&self) -> bool {
        self.vpc_prefix == DEFAULT_VPC_PREFIX
    }
}
