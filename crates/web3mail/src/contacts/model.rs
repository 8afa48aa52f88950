//! Contact model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::order::{DatasetOrder, PublishedOrder};

/// A protected data the requester may email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Protected data address, lowercase.
    pub address: String,
    /// Owner of the protected data, lowercase.
    pub owner: String,
    /// When access was granted.
    pub access_grant_timestamp: DateTime<Utc>,
    /// Whether the grant names this requester rather than anyone.
    pub is_user_strict: bool,
    /// Emails left on the grant.
    pub remaining_access: u64,
    /// Price per email, in nRLC.
    pub access_price: u64,
}

impl Contact {
    /// Builds a contact from a dataset order granting access.
    #[must_use]
    pub fn from_order(published: &PublishedOrder<DatasetOrder>) -> Self {
        Self {
            address: format!("{:#x}", published.order.dataset),
            owner: format!("{:#x}", published.signer),
            access_grant_timestamp: published.publication_timestamp,
            is_user_strict: !published.order.requesterrestrict.is_zero(),
            remaining_access: published.remaining,
            access_price: published.order.datasetprice,
        }
    }
}
