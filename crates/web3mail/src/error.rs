//! Error types for the web3mail library.

use thiserror::Error;

use crate::order::OrderKind;
use crate::validation::ValidationError;

/// Errors returned by the collaborators this library talks to
/// (marketplace client, content storage, indexer).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("{service} is unreachable: {message}")]
    Unreachable {
        /// Name of the service.
        service: &'static str,
        /// Transport-level description.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with something we cannot interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service refused the request for a reason tied to its inputs.
    #[error("{0}")]
    Rejected(String),
}

impl ServiceError {
    /// Creates an `Unreachable` error.
    #[must_use]
    pub fn unreachable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unreachable {
            service,
            message: message.into(),
        }
    }

    /// Whether the failure comes from the infrastructure rather than the request.
    ///
    /// Protocol errors are worth retrying later without changing the inputs.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Errors that can occur in web3mail operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A mandatory argument was not supplied.
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// An argument failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The protected data is not a dataset exposing an email.
    #[error("ProtectedData is not valid")]
    InvalidProtectedData,

    /// No order of this kind fits the caller's price ceiling.
    #[error("No {0} order found for the desired price")]
    NoOrder(OrderKind),

    /// The email content could not be encrypted.
    #[error("Failed to encrypt email content")]
    Encryption(#[source] ServiceError),

    /// The encrypted content could not be uploaded.
    #[error("Failed to upload encrypted email content")]
    Upload(#[source] ServiceError),

    /// A collaborator call failed.
    #[error("{context}: {source}")]
    Service {
        /// What the library was doing.
        context: &'static str,
        /// Underlying failure.
        #[source]
        source: ServiceError,
    },
}

impl Error {
    /// Wraps a collaborator failure with the operation that triggered it.
    #[must_use]
    pub const fn service(context: &'static str, source: ServiceError) -> Self {
        Self::Service { context, source }
    }

    /// Whether the failure is a protocol error.
    ///
    /// Protocol errors mean the marketplace, storage or indexer is unreachable
    /// or misconfigured. Every other error needs different inputs to succeed.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        match self {
            Self::Encryption(source) | Self::Upload(source) | Self::Service { source, .. } => {
                source.is_protocol_error()
            }
            Self::MissingParameter(_)
            | Self::Validation(_)
            | Self::InvalidProtectedData
            | Self::NoOrder(_) => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
