//! Marketplace order types.
//!
//! Field names follow the marketplace's wire format so the types can be
//! exchanged with the order book API unchanged.

use std::fmt;

use alloy_primitives::{Address, B256, Bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three order books a send draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    /// Access to the protected data.
    Dataset,
    /// Execution of the mail app.
    App,
    /// Compute capacity.
    Workerpool,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dataset => "Dataset",
            Self::App => "App",
            Self::Workerpool => "Workerpool",
        })
    }
}

/// Order tag: a bit set of execution requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub B256);

impl Tag {
    /// No requirement.
    pub const NONE: Self = Self(B256::ZERO);

    /// Trusted execution inside a Scone enclave (`tee` + `scone`).
    pub const TEE_SCONE: Self = Self::from_low_bits(0b11);

    const fn from_low_bits(bits: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = bits;
        Self(B256::new(bytes))
    }

    /// Whether every bit of `self` is also set in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(mine, theirs)| mine & !theirs == 0)
    }
}

/// Read access to the price and tag every order carries.
pub trait PricedOrder {
    /// Unit price in nRLC.
    fn price(&self) -> u64;
    /// Execution requirements.
    fn tag(&self) -> Tag;
}

/// Dataset sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOrder {
    /// Dataset address.
    pub dataset: Address,
    /// Price per task.
    pub datasetprice: u64,
    /// Number of tasks this order can fund.
    pub volume: u64,
    /// Execution requirements.
    pub tag: Tag,
    /// App allowed to use the dataset (zero means any).
    pub apprestrict: Address,
    /// Workerpool allowed to run the task (zero means any).
    pub workerpoolrestrict: Address,
    /// Requester allowed to buy (zero means any).
    pub requesterrestrict: Address,
    /// Order salt.
    pub salt: B256,
    /// Owner signature.
    pub sign: Bytes,
}

/// App sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOrder {
    /// App address.
    pub app: Address,
    /// Price per task.
    pub appprice: u64,
    /// Number of tasks this order can fund.
    pub volume: u64,
    /// Execution requirements.
    pub tag: Tag,
    /// Dataset allowed (zero means any).
    pub datasetrestrict: Address,
    /// Workerpool allowed (zero means any).
    pub workerpoolrestrict: Address,
    /// Requester allowed (zero means any).
    pub requesterrestrict: Address,
    /// Order salt.
    pub salt: B256,
    /// Owner signature.
    pub sign: Bytes,
}

/// Workerpool sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerpoolOrder {
    /// Workerpool address.
    pub workerpool: Address,
    /// Price per task.
    pub workerpoolprice: u64,
    /// Number of tasks this order can run.
    pub volume: u64,
    /// Execution requirements.
    pub tag: Tag,
    /// Task category (time budget).
    pub category: u64,
    /// Replication trust level.
    pub trust: u64,
    /// App allowed (zero means any).
    pub apprestrict: Address,
    /// Dataset allowed (zero means any).
    pub datasetrestrict: Address,
    /// Requester allowed (zero means any).
    pub requesterrestrict: Address,
    /// Order salt.
    pub salt: B256,
    /// Owner signature.
    pub sign: Bytes,
}

/// Buy order emitted by the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrder {
    /// App to run.
    pub app: Address,
    /// Highest app price accepted.
    pub appmaxprice: u64,
    /// Dataset to use.
    pub dataset: Address,
    /// Highest dataset price accepted.
    pub datasetmaxprice: u64,
    /// Workerpool to run on.
    pub workerpool: Address,
    /// Highest workerpool price accepted.
    pub workerpoolmaxprice: u64,
    /// Requester address.
    pub requester: Address,
    /// Number of tasks requested.
    pub volume: u64,
    /// Execution requirements.
    pub tag: Tag,
    /// Task category.
    pub category: u64,
    /// Replication trust level.
    pub trust: u64,
    /// Result beneficiary.
    pub beneficiary: Address,
    /// Callback contract.
    pub callback: Address,
    /// JSON-encoded execution parameters.
    pub params: String,
    /// Order salt.
    pub salt: B256,
    /// Requester signature, absent until signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Bytes>,
}

impl RequestOrder {
    /// Whether the order carries a signature.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.sign.is_some()
    }
}

impl PricedOrder for DatasetOrder {
    fn price(&self) -> u64 {
        self.datasetprice
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

impl PricedOrder for AppOrder {
    fn price(&self) -> u64 {
        self.appprice
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

impl PricedOrder for WorkerpoolOrder {
    fn price(&self) -> u64 {
        self.workerpoolprice
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

/// An order as listed in an order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedOrder<T> {
    /// The signed order.
    pub order: T,
    /// EIP-712 hash of the order.
    pub order_hash: B256,
    /// Chain the order lives on.
    pub chain_id: u64,
    /// When the order was published.
    pub publication_timestamp: DateTime<Utc>,
    /// Signer address.
    pub signer: Address,
    /// Book status (`open`, `filled`, ...).
    pub status: String,
    /// Remaining volume.
    pub remaining: u64,
}

/// One page of an order book, in the book's default ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderbook<T> {
    /// Orders, cheapest first.
    pub orders: Vec<PublishedOrder<T>>,
    /// Total number of matching orders.
    #[serde(default)]
    pub count: u64,
}

impl<T> Default for Orderbook<T> {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            count: 0,
        }
    }
}

/// The four orders matched into a deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuad {
    /// App sell order.
    pub app_order: AppOrder,
    /// Dataset sell order.
    pub dataset_order: DatasetOrder,
    /// Workerpool sell order.
    pub workerpool_order: WorkerpoolOrder,
    /// Signed request order.
    pub request_order: RequestOrder,
}
