//! # web3mail
//!
//! Send email to the owners of protected data without ever learning their
//! address.
//!
//! An owner protects their email as an encrypted dataset and grants the mail
//! app access to it. A sender then picks that dataset, writes a message and
//! schedules a confidential task: the app decrypts the address and the
//! message inside an enclave and delivers the mail.
//!
//! ## Quick Start
//!
//! ```ignore
//! use web3mail::{SendEmailParams, Web3Mail, Web3MailConfig};
//!
//! async fn notify(marketplace: impl web3mail::Marketplace) -> web3mail::Result<()> {
//!     let web3mail = Web3Mail::from_config(Web3MailConfig::bellecour(), marketplace)?;
//!
//!     let contacts = web3mail.fetch_my_contacts(false).await?;
//!     for contact in contacts {
//!         let params = SendEmailParams::builder()
//!             .protected_data(contact.address)
//!             .email_subject("Release notes")
//!             .email_content("Version 2 is out.")
//!             .build()?;
//!         let task = web3mail.send_email(&params).await?;
//!         println!("scheduled task {task}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Network presets and client configuration
//! - [`contacts`]: Contact discovery
//! - [`indexer`]: Protected data subgraph
//! - [`marketplace`]: Marketplace client interface
//! - [`order`]: Order types, selection and submission
//! - [`secret`]: Requester secret provisioning
//! - [`storage`]: IPFS content storage
//! - [`validation`]: Input validation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod config;
pub mod contacts;
mod error;
pub mod indexer;
pub mod marketplace;
pub mod order;
pub mod secret;
mod service;
pub mod storage;
pub mod validation;

pub use client::Web3Mail;
pub use config::{Web3MailConfig, Web3MailConfigBuilder};
pub use contacts::Contact;
pub use error::{Error, Result, ServiceError};
pub use indexer::{Indexer, SubgraphClient};
pub use marketplace::Marketplace;
pub use order::{MaxPrices, OrderKind, TaskHandle};
pub use service::{SendEmailParams, SendEmailParamsBuilder};
pub use storage::{ContentStorage, IpfsClient};
pub use validation::{ContentType, ValidationError};
