//! Task environment.
//!
//! The enclave runtime hands everything to the task through environment
//! variables: input and output directories, the protected data file name,
//! the developer secret and up to three requester secrets.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use url::Url;
use web3mail::config::BELLECOUR_IPFS_GATEWAY;
use web3mail::secret::RequesterSecretBundle;
use web3mail::validation::{self, ContentType};

use crate::error::{Error, Result};

/// Input directory.
pub const IEXEC_IN: &str = "IEXEC_IN";
/// Output directory.
pub const IEXEC_OUT: &str = "IEXEC_OUT";
/// Protected data file name, inside the input directory.
pub const IEXEC_DATASET_FILENAME: &str = "IEXEC_DATASET_FILENAME";
/// Developer secret, JSON.
pub const IEXEC_APP_DEVELOPER_SECRET: &str = "IEXEC_APP_DEVELOPER_SECRET";
/// First requester secret.
pub const IEXEC_REQUESTER_SECRET_1: &str = "IEXEC_REQUESTER_SECRET_1";
/// Second requester secret, legacy format only.
pub const IEXEC_REQUESTER_SECRET_2: &str = "IEXEC_REQUESTER_SECRET_2";
/// Third requester secret, legacy format only.
pub const IEXEC_REQUESTER_SECRET_3: &str = "IEXEC_REQUESTER_SECRET_3";
/// Optional gateway override.
pub const IPFS_GATEWAY: &str = "IPFS_GATEWAY";

/// Mail provider credentials set by the app developer.
#[derive(Clone, Deserialize)]
pub struct DeveloperSecret {
    /// Mailjet public API key.
    #[serde(rename = "MJ_APIKEY_PUBLIC")]
    pub mailjet_public_key: String,
    /// Mailjet private API key.
    #[serde(rename = "MJ_APIKEY_PRIVATE")]
    pub mailjet_private_key: String,
    /// Sender address registered with Mailjet.
    #[serde(rename = "MJ_SENDER")]
    pub sender: String,
}

impl fmt::Debug for DeveloperSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeveloperSecret")
            .field("mailjet_public_key", &self.mailjet_public_key)
            .field("mailjet_private_key", &"[redacted]")
            .field("sender", &self.sender)
            .finish()
    }
}

impl DeveloperSecret {
    /// Parses the developer secret JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeveloperSecret`] if the JSON is malformed or a key is
    /// missing.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::DeveloperSecret)
    }
}

/// Where the email body comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum EmailContent {
    /// Body carried in clear in a requester secret.
    Inline(String),
    /// Body stored encrypted at a multiaddress.
    Encrypted {
        /// `/ipfs/<cid>` of the ciphertext.
        multiaddr: String,
        /// Base64 AES key.
        key: String,
    },
}

impl fmt::Debug for EmailContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(content) => f
                .debug_tuple("Inline")
                .field(&format_args!("{} chars", content.chars().count()))
                .finish(),
            Self::Encrypted { multiaddr, .. } => f
                .debug_struct("Encrypted")
                .field("multiaddr", multiaddr)
                .finish_non_exhaustive(),
        }
    }
}

/// The email requested by the task's requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    /// Subject line.
    pub subject: String,
    /// Body source.
    pub content: EmailContent,
    /// Body format.
    pub content_type: ContentType,
    /// Sender display name.
    pub sender_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyOptions {
    #[serde(default)]
    content_type: ContentType,
    email_content_encryption_key: Option<String>,
}

impl EmailRequest {
    /// Reads the request from the requester secrets.
    ///
    /// Secret 1 holds the JSON bundle pushed by current clients. Older tasks
    /// spread the request over three slots: subject, content or its
    /// multiaddress, and optional JSON options.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot is missing, the options are malformed or a
    /// value fails validation.
    pub fn from_secrets(
        secret_1: Option<&str>,
        secret_2: Option<&str>,
        secret_3: Option<&str>,
    ) -> Result<Self> {
        let first = non_empty(secret_1).ok_or(Error::MissingEnv(IEXEC_REQUESTER_SECRET_1))?;

        let request = match serde_json::from_str::<RequesterSecretBundle>(first) {
            Ok(bundle) => Self {
                subject: bundle.email_subject,
                content: EmailContent::Encrypted {
                    multiaddr: bundle.email_content_multi_addr,
                    key: bundle.email_content_encryption_key,
                },
                content_type: bundle.content_type,
                sender_name: bundle.sender_name,
            },
            Err(_) => {
                let second =
                    non_empty(secret_2).ok_or(Error::MissingEnv(IEXEC_REQUESTER_SECRET_2))?;
                let options = match non_empty(secret_3) {
                    Some(json) => serde_json::from_str(json).map_err(Error::RequesterOptions)?,
                    None => LegacyOptions::default(),
                };
                let content = match options.email_content_encryption_key {
                    Some(key) => EmailContent::Encrypted {
                        multiaddr: second.to_owned(),
                        key,
                    },
                    None => EmailContent::Inline(second.to_owned()),
                };
                Self {
                    subject: first.to_owned(),
                    content,
                    content_type: options.content_type,
                    sender_name: None,
                }
            }
        };

        request.validate()
    }

    fn validate(self) -> Result<Self> {
        validation::email_subject(&self.subject)?;
        validation::sender_name(self.sender_name.as_deref())?;
        if let EmailContent::Inline(content) = &self.content {
            validation::email_content(content)?;
        }
        Ok(self)
    }
}

/// Everything the task reads from its environment.
#[derive(Debug, Clone)]
pub struct TaskEnv {
    /// Input directory.
    pub input_dir: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Protected data file name.
    pub dataset_filename: String,
    /// Mail provider credentials.
    pub developer_secret: DeveloperSecret,
    /// Requested email.
    pub request: EmailRequest,
    /// Gateway serving encrypted content.
    pub ipfs_gateway: Url,
}

impl TaskEnv {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// See [`TaskEnv::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the environment through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any secret is
    /// malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(Error::MissingEnv(name))
        };

        let developer_secret = DeveloperSecret::parse(&required(IEXEC_APP_DEVELOPER_SECRET)?)?;
        let input_dir = PathBuf::from(required(IEXEC_IN)?);
        let output_dir = PathBuf::from(required(IEXEC_OUT)?);
        let dataset_filename = required(IEXEC_DATASET_FILENAME)?;

        let secret_1 = lookup(IEXEC_REQUESTER_SECRET_1);
        let secret_2 = lookup(IEXEC_REQUESTER_SECRET_2);
        let secret_3 = lookup(IEXEC_REQUESTER_SECRET_3);
        let request = EmailRequest::from_secrets(
            secret_1.as_deref(),
            secret_2.as_deref(),
            secret_3.as_deref(),
        )?;

        let gateway = lookup(IPFS_GATEWAY).unwrap_or_else(|| BELLECOUR_IPFS_GATEWAY.to_owned());
        let ipfs_gateway = validation::url("ipfsGateway", &gateway)?;

        Ok(Self {
            input_dir,
            output_dir,
            dataset_filename,
            developer_secret,
            request,
            ipfs_gateway,
        })
    }

    /// Path of the protected data archive.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.input_dir.join(&self.dataset_filename)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
