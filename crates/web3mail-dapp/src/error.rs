//! Error types for the compute task.

use std::io;

use web3mail::{ServiceError, ValidationError};

/// Result type alias for compute task operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Compute task error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment variable is absent or empty.
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// The developer secret is not the expected JSON object.
    #[error("Failed to parse the developer secret")]
    DeveloperSecret(#[source] serde_json::Error),

    /// The legacy options secret is not the expected JSON object.
    #[error("Failed to parse options from requester secret")]
    RequesterOptions(#[source] serde_json::Error),

    /// A requester-supplied value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The content reference is not an `/ipfs/<cid>` multiaddress.
    #[error("Invalid email content multiaddress: {0}")]
    InvalidMultiaddr(String),

    /// The protected data archive cannot be read.
    #[error("Failed to read protectedData: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The protected data carries no email.
    #[error("Missing email in protectedData")]
    MissingEmail,

    /// The encrypted content cannot be downloaded.
    #[error("Failed to download encrypted email content")]
    Download(#[source] ServiceError),

    /// The content cannot be decrypted with the supplied key.
    #[error("Failed to decrypt email content: {0}")]
    Decryption(&'static str),

    /// The mail provider refused or could not be reached.
    #[error("Failed to send email")]
    Send(#[source] reqwest::Error),

    /// An endpoint URL cannot be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
