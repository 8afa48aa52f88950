//! Marketplace client interface.
//!
//! The marketplace owns the wallet identity, the three sell order books,
//! the secret store and order matching. This crate only drives it; the
//! blockchain plumbing lives behind [`Marketplace`].

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256, keccak256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::order::{
    AppOrder, DatasetOrder, OrderQuad, Orderbook, RequestOrder, Tag, WorkerpoolOrder,
};

/// Wildcard accepted in place of a dataset address by the dataset book.
pub const ANY_DATASET: &str = "any";

/// Filters for a dataset order book query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetOrderbookQuery {
    /// Only orders usable by this app.
    pub app: Option<String>,
    /// Only orders usable by this requester.
    pub requester: Option<String>,
    /// Exclude orders open to any app.
    pub is_app_strict: bool,
    /// Exclude orders open to any requester.
    pub is_requester_strict: bool,
    /// Page size; the marketplace default when unset.
    pub page_size: Option<u32>,
}

/// Filters for an app order book query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppOrderbookQuery {
    /// Only orders usable on this workerpool.
    pub workerpool: Option<String>,
    /// Minimum tag.
    pub min_tag: Tag,
    /// Maximum tag.
    pub max_tag: Tag,
}

/// Filters for a workerpool order book query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerpoolOrderbookQuery {
    /// Only orders of this workerpool.
    pub workerpool: Option<String>,
    /// Only orders usable by this app.
    pub app: Option<String>,
    /// Only orders usable with this dataset.
    pub dataset: Option<String>,
    /// Minimum tag.
    pub min_tag: Tag,
    /// Maximum tag.
    pub max_tag: Tag,
    /// Task category.
    pub category: u64,
}

/// Execution parameters attached to a request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Expose the app's logs to the developer.
    pub iexec_developer_logger: bool,
    /// Requester secret slots, by index.
    pub iexec_secrets: BTreeMap<u32, String>,
    /// Command line arguments for the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iexec_args: Option<String>,
}

/// Unsigned request order fields supplied by the caller.
///
/// Identities may be addresses or ENS names; the marketplace resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrderTemplate {
    /// App to run.
    pub app: String,
    /// Dataset to use.
    pub dataset: String,
    /// Workerpool to run on.
    pub workerpool: String,
    /// Highest app price accepted.
    pub appmaxprice: u64,
    /// Highest dataset price accepted.
    pub datasetmaxprice: u64,
    /// Highest workerpool price accepted.
    pub workerpoolmaxprice: u64,
    /// Task category.
    pub category: u64,
    /// Execution requirements.
    pub tag: Tag,
    /// Execution parameters.
    pub params: RequestParams,
}

/// Options for order matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Simulate the match before sending the transaction.
    pub preflight_check: bool,
    /// Pay with the requester's voucher.
    pub use_voucher: bool,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deal {
    /// Deal identifier.
    pub deal_id: B256,
    /// Number of tasks in the deal.
    pub volume: u64,
    /// Match transaction hash.
    pub tx_hash: B256,
}

/// Marketplace client operations.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Address of the wallet driving the client.
    async fn address(&self) -> Result<Address, ServiceError>;

    /// Whether a content storage token is registered for `address`.
    async fn storage_token_exists(&self, address: Address) -> Result<bool, ServiceError>;

    /// Logs into the default content storage and registers the token.
    async fn init_storage(&self) -> Result<(), ServiceError>;

    /// Queries the dataset order book. `dataset` may be [`ANY_DATASET`].
    async fn fetch_dataset_orderbook(
        &self,
        dataset: &str,
        query: &DatasetOrderbookQuery,
    ) -> Result<Orderbook<DatasetOrder>, ServiceError>;

    /// Queries the app order book.
    async fn fetch_app_orderbook(
        &self,
        app: &str,
        query: &AppOrderbookQuery,
    ) -> Result<Orderbook<AppOrder>, ServiceError>;

    /// Queries the workerpool order book.
    async fn fetch_workerpool_orderbook(
        &self,
        query: &WorkerpoolOrderbookQuery,
    ) -> Result<Orderbook<WorkerpoolOrder>, ServiceError>;

    /// Generates a fresh dataset encryption key.
    fn generate_encryption_key(&self) -> String;

    /// Encrypts `content` with `key` in the dataset format.
    async fn encrypt(&self, content: &[u8], key: &str) -> Result<Vec<u8>, ServiceError>;

    /// Stores a requester secret under `id`.
    async fn push_requester_secret(&self, id: &str, value: &str) -> Result<(), ServiceError>;

    /// Builds an unsigned request order for the wallet.
    async fn create_request_order(
        &self,
        template: &RequestOrderTemplate,
    ) -> Result<RequestOrder, ServiceError>;

    /// Signs a request order with the wallet.
    async fn sign_request_order(&self, order: RequestOrder)
    -> Result<RequestOrder, ServiceError>;

    /// Matches the four orders into a deal.
    async fn match_orders(
        &self,
        orders: &OrderQuad,
        options: MatchOptions,
    ) -> Result<Deal, ServiceError>;

    /// Task identifier of task `index` in `deal_id`.
    ///
    /// `keccak256(deal_id ++ uint256(index))`.
    fn compute_task_id(&self, deal_id: B256, index: u64) -> B256 {
        task_id(deal_id, index)
    }
}

/// Task identifier of task `index` in `deal_id`.
#[must_use]
pub fn task_id(deal_id: B256, index: u64) -> B256 {
    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(deal_id.as_slice());
    packed[32..].copy_from_slice(&U256::from(index).to_be_bytes::<32>());
    keccak256(packed)
}
