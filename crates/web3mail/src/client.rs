//! The Web3Mail client.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::config::Web3MailConfig;
use crate::contacts::{Contact, ContactQuery, discover_contacts};
use crate::error::{Error, Result};
use crate::indexer::{Indexer, SubgraphClient};
use crate::marketplace::Marketplace;
use crate::order::TaskHandle;
use crate::service::SendEmailParams;
use crate::service::send::{SendContext, send_email};
use crate::storage::{ContentStorage, IpfsClient};
use crate::validation;

type SharedRng = Mutex<Box<dyn RngCore + Send>>;

/// Sends email to protected data owners and lists the ones reachable.
///
/// The client never learns an email address: it only selects orders, stores
/// the encrypted message and submits a task that the mail app runs inside an
/// enclave.
pub struct Web3Mail<M, I = SubgraphClient, S = IpfsClient> {
    config: Web3MailConfig,
    marketplace: M,
    indexer: I,
    storage: S,
    rng: SharedRng,
}

impl<M> Web3Mail<M, SubgraphClient, IpfsClient>
where
    M: Marketplace,
{
    /// Creates a client using the configured subgraph and IPFS endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn from_config(config: Web3MailConfig, marketplace: M) -> Result<Self> {
        let config = config.validate()?;
        let indexer = SubgraphClient::new(validation::url("subgraphUrl", &config.subgraph_url)?);
        let storage = IpfsClient::new(
            validation::url("ipfsNode", &config.ipfs_node)?,
            validation::url("ipfsGateway", &config.ipfs_gateway)?,
        );
        Self::new(config, marketplace, indexer, storage)
    }
}

impl<M, I, S> Web3Mail<M, I, S>
where
    M: Marketplace,
    I: Indexer,
    S: ContentStorage,
{
    /// Creates a client over explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration is invalid.
    pub fn new(config: Web3MailConfig, marketplace: M, indexer: I, storage: S) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            marketplace,
            indexer,
            storage,
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        })
    }

    /// Replaces the random source used to pick workerpool orders.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Web3MailConfig {
        &self.config
    }

    /// Underlying marketplace client.
    #[must_use]
    pub const fn marketplace(&self) -> &M {
        &self.marketplace
    }

    /// Sends an email to the owner of `params.protected_data`.
    ///
    /// Returns once the task is scheduled; delivery happens inside the task.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for any invalid input, before any network call
    /// - [`Error::InvalidProtectedData`] if the protected data exposes no email
    /// - [`Error::NoOrder`] if no order fits the price ceilings
    /// - [`Error::Encryption`], [`Error::Upload`] or [`Error::Service`] when a
    ///   collaborator fails
    pub async fn send_email(&self, params: &SendEmailParams) -> Result<TaskHandle> {
        let ctx = SendContext {
            config: &self.config,
            marketplace: &self.marketplace,
            indexer: &self.indexer,
            storage: &self.storage,
            rng: &self.rng,
        };
        send_email(&ctx, params).await
    }

    /// Lists the protected data whose owners granted this wallet access.
    ///
    /// With `is_user_strict`, grants open to any requester are excluded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the wallet, an order book or the indexer
    /// cannot be queried.
    pub async fn fetch_my_contacts(&self, is_user_strict: bool) -> Result<Vec<Contact>> {
        let user = self
            .marketplace
            .address()
            .await
            .map_err(|e| Error::service("Failed to fetch my contacts", e))?;
        self.contacts_of(&format!("{user:#x}"), is_user_strict)
            .await
    }

    /// Lists the protected data whose owners granted `user_address` access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the address is malformed, otherwise as
    /// [`Web3Mail::fetch_my_contacts`].
    pub async fn fetch_user_contacts(
        &self,
        user_address: &str,
        is_user_strict: bool,
    ) -> Result<Vec<Contact>> {
        let user = validation::address("userAddress", user_address)?;
        self.contacts_of(&user, is_user_strict).await
    }

    async fn contacts_of(&self, user: &str, is_user_strict: bool) -> Result<Vec<Contact>> {
        debug!(user, is_user_strict, "Fetching contacts");
        discover_contacts(
            &self.marketplace,
            &self.indexer,
            &ContactQuery {
                user,
                app: &self.config.dapp_address,
                whitelist_app: &self.config.dapp_whitelist_address,
                is_user_strict,
                page_size: self.config.page_size,
            },
        )
        .await
    }
}

impl<M, I, S> fmt::Debug for Web3Mail<M, I, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Mail")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
