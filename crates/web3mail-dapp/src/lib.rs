//! # web3mail-dapp
//!
//! The confidential compute task behind web3mail. It runs inside an enclave,
//! reads the recipient address from the protected data, fetches and
//! decrypts the requester's message and relays it through Mailjet.
//!
//! ## Modules
//!
//! - [`env`]: Task environment and requester secrets
//! - [`protected_data`]: Protected data archive
//! - [`cipher`]: Email content cipher
//! - [`mailjet`]: Mail delivery
//! - [`output`]: Deterministic task output

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod app;
pub mod cipher;
pub mod env;
mod error;
pub mod mailjet;
pub mod output;
pub mod protected_data;

pub use app::{resolve_content, run};
pub use env::{DeveloperSecret, EmailContent, EmailRequest, TaskEnv};
pub use error::{Error, Result};
pub use mailjet::{MailTransport, MailjetClient, OutgoingMail};
