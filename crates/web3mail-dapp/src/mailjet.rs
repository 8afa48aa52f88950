//! Mail delivery through the Mailjet v3.1 send API.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;
use web3mail::ContentType;

use crate::env::DeveloperSecret;
use crate::error::{Error, Result};

/// Production Mailjet API.
pub const MAILJET_API_URL: &str = "https://api.mailjet.com/";

/// Display name used when the requester gave none.
pub const DEFAULT_SENDER_NAME: &str = "Web3mail Dapp Sender";

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Body.
    pub content: String,
    /// Body format.
    pub content_type: ContentType,
    /// Requester's display name.
    pub sender_name: Option<String>,
}

impl OutgoingMail {
    /// Display name shown to the recipient.
    #[must_use]
    pub fn from_name(&self) -> String {
        self.sender_name.as_deref().map_or_else(
            || DEFAULT_SENDER_NAME.to_owned(),
            |name| format!("{name} via Web3mail"),
        )
    }
}

/// Mail delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers `mail`.
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Message<'a> {
    from: Contact<'a>,
    to: [Contact<'a>; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_part: Option<&'a str>,
    #[serde(rename = "HTMLPart", skip_serializing_if = "Option::is_none")]
    html_part: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

/// Mailjet API client.
#[derive(Clone)]
pub struct MailjetClient {
    send_url: Url,
    public_key: String,
    private_key: String,
    sender: String,
    http_client: Client,
}

impl MailjetClient {
    /// Creates a client for the API rooted at `base_url`, authenticated and
    /// sending with the developer's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `base_url` cannot carry a path.
    pub fn new(base_url: &Url, secret: &DeveloperSecret) -> Result<Self> {
        let mut send_url = base_url.clone();
        send_url
            .path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["v3.1", "send"]);
        Ok(Self {
            send_url,
            public_key: secret.mailjet_public_key.clone(),
            private_key: secret.mailjet_private_key.clone(),
            sender: secret.sender.clone(),
            http_client: Client::new(),
        })
    }
}

impl fmt::Debug for MailjetClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailjetClient")
            .field("send_url", &self.send_url)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailTransport for MailjetClient {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let from_name = mail.from_name();
        let (text_part, html_part) = match mail.content_type {
            ContentType::Plain => (Some(mail.content.as_str()), None),
            ContentType::Html => (None, Some(mail.content.as_str())),
        };
        let body = SendRequest {
            messages: [Message {
                from: Contact {
                    email: &self.sender,
                    name: &from_name,
                },
                to: [Contact {
                    email: &mail.to,
                    name: "",
                }],
                subject: &mail.subject,
                text_part,
                html_part,
            }],
        };

        let response = self
            .http_client
            .post(self.send_url.clone())
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::Send)?;
        debug!(status = %response.status(), "Mailjet accepted the message");
        Ok(())
    }
}
