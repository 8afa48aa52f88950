//! Client configuration.
//!
//! Every network-specific value lives here rather than in code. The
//! [`Web3MailConfig::bellecour`] preset targets the production network; other
//! deployments build their own or deserialize one from a file.

use serde::Deserialize;

use crate::order::MaxPrices;
use crate::validation::{self, ValidationResult};

/// ENS name of the production mail app.
pub const BELLECOUR_DAPP_ADDRESS: &str = "web3mail.apps.iexec.eth";

/// Whitelist contract allowed to use protected data on behalf of the mail app.
pub const BELLECOUR_WHITELIST_ADDRESS: &str = "0x781482c39cce25546583eac4957fb7bf04c277d2";

/// ENS name of the production workerpool.
pub const BELLECOUR_WORKERPOOL_ADDRESS: &str = "prod-v8-bellecour.main.pools.iexec.eth";

/// IPFS upload node.
pub const BELLECOUR_IPFS_NODE: &str = "https://ipfs-upload.v8-bellecour.iex.ec";

/// IPFS read gateway.
pub const BELLECOUR_IPFS_GATEWAY: &str = "https://ipfs-gateway.v8-bellecour.iex.ec";

/// Protected data subgraph.
pub const BELLECOUR_SUBGRAPH_URL: &str =
    "https://thegraph.bellecour.iex.ec/subgraphs/name/bellecour/dataprotector";

/// Default order book page size for contact discovery.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Web3Mail client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Web3MailConfig {
    /// Mail app address or ENS name.
    pub dapp_address: String,
    /// Whitelist contract address.
    pub dapp_whitelist_address: String,
    /// Default workerpool address or ENS name.
    pub workerpool_address: String,
    /// IPFS upload node URL.
    pub ipfs_node: String,
    /// IPFS gateway URL.
    pub ipfs_gateway: String,
    /// Subgraph GraphQL endpoint.
    pub subgraph_url: String,
    /// Default dataset price ceiling, nRLC.
    pub data_max_price: u64,
    /// Default app price ceiling, nRLC.
    pub app_max_price: u64,
    /// Default workerpool price ceiling, nRLC.
    pub workerpool_max_price: u64,
    /// Order book page size for contact discovery.
    pub page_size: u32,
}

impl Default for Web3MailConfig {
    fn default() -> Self {
        Self::bellecour()
    }
}

impl Web3MailConfig {
    /// Production network preset. All price ceilings are zero.
    #[must_use]
    pub fn bellecour() -> Self {
        Self {
            dapp_address: BELLECOUR_DAPP_ADDRESS.to_string(),
            dapp_whitelist_address: BELLECOUR_WHITELIST_ADDRESS.to_string(),
            workerpool_address: BELLECOUR_WORKERPOOL_ADDRESS.to_string(),
            ipfs_node: BELLECOUR_IPFS_NODE.to_string(),
            ipfs_gateway: BELLECOUR_IPFS_GATEWAY.to_string(),
            subgraph_url: BELLECOUR_SUBGRAPH_URL.to_string(),
            data_max_price: 0,
            app_max_price: 0,
            workerpool_max_price: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Creates a configuration builder starting from the production preset.
    #[must_use]
    pub fn builder() -> Web3MailConfigBuilder {
        Web3MailConfigBuilder::new()
    }

    /// Default price ceilings.
    #[must_use]
    pub const fn max_prices(&self) -> MaxPrices {
        MaxPrices {
            dataset: self.data_max_price,
            app: self.app_max_price,
            workerpool: self.workerpool_max_price,
        }
    }

    /// Validates every field and returns the configuration with addresses
    /// lower-cased.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(self) -> ValidationResult<Self> {
        validation::url("ipfsNode", &self.ipfs_node)?;
        validation::url("ipfsGateway", &self.ipfs_gateway)?;
        validation::url("subgraphUrl", &self.subgraph_url)?;
        Ok(Self {
            dapp_address: validation::address_or_ens("dappAddressOrENS", &self.dapp_address)?,
            dapp_whitelist_address: validation::address(
                "dappWhitelistAddress",
                &self.dapp_whitelist_address,
            )?,
            workerpool_address: validation::address_or_ens(
                "workerpoolAddressOrEns",
                &self.workerpool_address,
            )?,
            ..self
        })
    }
}

/// Builder for [`Web3MailConfig`].
#[derive(Debug, Clone)]
pub struct Web3MailConfigBuilder {
    config: Web3MailConfig,
}

impl Default for Web3MailConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Web3MailConfigBuilder {
    /// Creates a builder with the production preset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Web3MailConfig::bellecour(),
        }
    }

    /// Sets the mail app.
    #[must_use]
    pub fn dapp_address(mut self, address: impl Into<String>) -> Self {
        self.config.dapp_address = address.into();
        self
    }

    /// Sets the whitelist contract.
    #[must_use]
    pub fn dapp_whitelist_address(mut self, address: impl Into<String>) -> Self {
        self.config.dapp_whitelist_address = address.into();
        self
    }

    /// Sets the default workerpool.
    #[must_use]
    pub fn workerpool_address(mut self, address: impl Into<String>) -> Self {
        self.config.workerpool_address = address.into();
        self
    }

    /// Sets the IPFS upload node.
    #[must_use]
    pub fn ipfs_node(mut self, url: impl Into<String>) -> Self {
        self.config.ipfs_node = url.into();
        self
    }

    /// Sets the IPFS gateway.
    #[must_use]
    pub fn ipfs_gateway(mut self, url: impl Into<String>) -> Self {
        self.config.ipfs_gateway = url.into();
        self
    }

    /// Sets the subgraph endpoint.
    #[must_use]
    pub fn subgraph_url(mut self, url: impl Into<String>) -> Self {
        self.config.subgraph_url = url.into();
        self
    }

    /// Sets the default price ceilings.
    #[must_use]
    pub const fn max_prices(mut self, prices: MaxPrices) -> Self {
        self.config.data_max_price = prices.dataset;
        self.config.app_max_price = prices.app;
        self.config.workerpool_max_price = prices.workerpool;
        self
    }

    /// Sets the contact discovery page size.
    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn build(self) -> ValidationResult<Web3MailConfig> {
        self.config.validate()
    }
}
