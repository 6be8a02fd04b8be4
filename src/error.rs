//! Error types for the admission webhook.
//!
//! Every variant renders as the human-readable message that ends up in the
//! `result.message` of a denied `AdmissionResponse`.

use kube::core::admission::{Operation, SerializePatchError};
use thiserror::Error;

/// Error type for admission and startup operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The admitted object could not be decoded into its typed form
    #[error("Could not decode {kind} object: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request carried no object where one is required
    #[error("Admission request for {kind} {name:?} carries no object")]
    MissingObject { kind: String, name: String },

    /// A required label is missing from the object
    #[error("Invalid namespace: {namespace:?} not in workspace (missing label {key})")]
    MissingLabel { namespace: String, key: String },

    /// The workspace a namespace claims membership of does not exist
    #[error("Workspace {0:?} does not exist")]
    WorkspaceNotFound(String),

    /// No subnet is associated with the namespace
    #[error("Namespace {0:?} is not associated with any subnet, check the SDN network")]
    SubnetNotFound(String),

    /// The subnet CIDR cannot be turned into a host address list
    #[error("Invalid subnet CIDR {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    /// Creating or deleting the workspace VPC failed
    #[error("Vpc {name} {operation:?} failed: {source}")]
    VpcLifecycle {
        name: String,
        operation: Operation,
        #[source]
        source: Box<Error>,
    },

    /// The webhook received a kind it does not handle
    #[error("Not support for this Kind of resource {0}")]
    UnsupportedKind(String),

    /// The JSON patch could not be serialized into the response
    #[error("Serialization error: {0}")]
    Patch(#[from] SerializePatchError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// Whether the failure came from a collaborator rather than the request itself
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::Kube(_) | Error::SubnetNotFound(_) | Error::VpcLifecycle { .. }
        )
    }
}

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, Error>;
