//! Task entry point.

use std::path::PathBuf;

use tracing::{debug, info};
use web3mail::IpfsClient;
use web3mail::storage::cid_from_multiaddr;
use web3mail::validation;

use crate::cipher;
use crate::env::{EmailContent, TaskEnv};
use crate::error::{Error, Result};
use crate::mailjet::{MailTransport, OutgoingMail};
use crate::output::{SendResult, write_outputs};
use crate::protected_data::extract_email_from_file;

/// Resolves the email body, downloading and decrypting it when stored
/// remotely.
///
/// # Errors
///
/// Returns an error if the multiaddress is malformed, the download fails or
/// the content cannot be decrypted.
pub async fn resolve_content(content: &EmailContent, ipfs: &IpfsClient) -> Result<String> {
    match content {
        EmailContent::Inline(content) => Ok(content.clone()),
        EmailContent::Encrypted { multiaddr, key } => {
            let cid = cid_from_multiaddr(multiaddr)
                .ok_or_else(|| Error::InvalidMultiaddr(multiaddr.clone()))?;
            let sealed = ipfs.cat(cid).await.map_err(Error::Download)?;
            debug!(%cid, size = sealed.len(), "Downloaded encrypted email content");
            let plain = cipher::decrypt(&sealed, key)?;
            String::from_utf8(plain).map_err(|_| Error::Decryption("content is not UTF-8"))
        }
    }
}

/// Runs the task: reads the recipient, resolves the body, delivers the mail
/// and writes the deterministic output.
///
/// Returns the path of the result file.
///
/// # Errors
///
/// Returns the first failing stage.
pub async fn run<T>(env: &TaskEnv, ipfs: &IpfsClient, transport: &T) -> Result<PathBuf>
where
    T: MailTransport + ?Sized,
{
    let to = extract_email_from_file(&env.dataset_path())?;
    let content = resolve_content(&env.request.content, ipfs).await?;
    validation::email_content(&content)?;

    let mail = OutgoingMail {
        to,
        subject: env.request.subject.clone(),
        content,
        content_type: env.request.content_type,
        sender_name: env.request.sender_name.clone(),
    };
    transport.send(&mail).await?;
    info!(content_type = %mail.content_type, "Email sent");

    write_outputs(&env.output_dir, &SendResult::SENT).await
}
