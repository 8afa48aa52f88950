//! Requester secret provisioning.
//!
//! The email body never travels in clear: it is encrypted with a fresh key,
//! uploaded to content storage, and only its address plus the key are pushed
//! to the marketplace secret store, readable by the confidential task alone.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result, ServiceError};
use crate::marketplace::Marketplace;
use crate::storage::{ContentStorage, multiaddr};
use crate::validation::ContentType;

/// Bytes of entropy in a requester secret id.
pub const SECRET_ID_BYTES: usize = 16;

/// Payload stored in the requester secret slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterSecretBundle {
    /// Email subject.
    pub email_subject: String,
    /// `/ipfs/<cid>` of the encrypted body.
    pub email_content_multi_addr: String,
    /// Body format.
    #[serde(default)]
    pub content_type: ContentType,
    /// Display name of the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Key the body was encrypted with.
    pub email_content_encryption_key: String,
}

/// Mail fields to provision.
#[derive(Debug, Clone, Copy)]
pub struct MailContent<'a> {
    /// Email subject.
    pub subject: &'a str,
    /// Email body.
    pub content: &'a str,
    /// Body format.
    pub content_type: ContentType,
    /// Display name of the sender.
    pub sender_name: Option<&'a str>,
}

/// Generates a single-use requester secret id.
#[must_use]
pub fn generate_secret_id() -> String {
    let mut bytes = [0u8; SECRET_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Encrypts and uploads the body, then pushes the bundle under a fresh id.
///
/// Returns the secret id.
///
/// # Errors
///
/// Returns [`Error::Encryption`] or [`Error::Upload`] for the matching stage,
/// and [`Error::Service`] if the secret store rejects the push.
pub async fn provision_secret<M, S>(
    marketplace: &M,
    storage: &S,
    mail: &MailContent<'_>,
) -> Result<String>
where
    M: Marketplace + ?Sized,
    S: ContentStorage + ?Sized,
{
    let key = marketplace.generate_encryption_key();
    let encrypted = marketplace
        .encrypt(mail.content.as_bytes(), &key)
        .await
        .map_err(Error::Encryption)?;
    let cid = storage.add(&encrypted).await.map_err(Error::Upload)?;
    debug!(%cid, size = encrypted.len(), "Uploaded encrypted email content");

    let bundle = RequesterSecretBundle {
        email_subject: mail.subject.to_owned(),
        email_content_multi_addr: multiaddr(&cid),
        content_type: mail.content_type,
        sender_name: mail.sender_name.map(str::to_owned),
        email_content_encryption_key: key,
    };
    let value = serde_json::to_string(&bundle)
        .map_err(|e| Error::service("Failed to push requester secret", ServiceError::from(e)))?;

    let secret_id = generate_secret_id();
    marketplace
        .push_requester_secret(&secret_id, &value)
        .await
        .map_err(|e| Error::service("Failed to push requester secret", e))?;
    debug!(%secret_id, "Pushed requester secret");

    Ok(secret_id)
}
