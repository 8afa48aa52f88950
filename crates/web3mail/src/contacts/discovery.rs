//! Contact discovery pass.

use std::collections::HashSet;

use tracing::debug;

use super::model::Contact;
use crate::error::{Error, Result};
use crate::indexer::{Indexer, mailable_addresses};
use crate::marketplace::{ANY_DATASET, DatasetOrderbookQuery, Marketplace};

/// Whose contacts to list, and through which apps.
#[derive(Debug, Clone, Copy)]
pub struct ContactQuery<'a> {
    /// Requester address, lowercase.
    pub user: &'a str,
    /// Mail app address or ENS.
    pub app: &'a str,
    /// Whitelist app address.
    pub whitelist_app: &'a str,
    /// Only grants naming `user` explicitly.
    pub is_user_strict: bool,
    /// Order book page size.
    pub page_size: u32,
}

/// Lists the protected data granted to `query.user` through either app.
///
/// Grants from both apps are merged and deduplicated by address, keeping the
/// first occurrence (primary app first). Addresses the indexer does not know
/// as a protected data exposing an email are dropped.
///
/// # Errors
///
/// Returns [`Error::Service`] if an order book or the indexer cannot be queried.
pub async fn discover_contacts<M, I>(
    marketplace: &M,
    indexer: &I,
    query: &ContactQuery<'_>,
) -> Result<Vec<Contact>>
where
    M: Marketplace + ?Sized,
    I: Indexer + ?Sized,
{
    let book_query = |app: &str| DatasetOrderbookQuery {
        app: Some(app.to_owned()),
        requester: Some(query.user.to_owned()),
        is_app_strict: true,
        is_requester_strict: query.is_user_strict,
        page_size: Some(query.page_size),
    };
    let primary_query = book_query(query.app);
    let whitelist_query = book_query(query.whitelist_app);

    let (primary, whitelist) = tokio::try_join!(
        marketplace.fetch_dataset_orderbook(ANY_DATASET, &primary_query),
        marketplace.fetch_dataset_orderbook(ANY_DATASET, &whitelist_query),
    )
    .map_err(|e| Error::service("Failed to fetch my contacts", e))?;

    let mut seen = HashSet::new();
    let candidates: Vec<Contact> = primary
        .orders
        .iter()
        .chain(whitelist.orders.iter())
        .map(Contact::from_order)
        .filter(|contact| seen.insert(contact.address.clone()))
        .collect();

    let addresses: Vec<String> = candidates.iter().map(|c| c.address.clone()).collect();
    let valid = mailable_addresses(indexer, &addresses)
        .await
        .map_err(|e| Error::service("Failed to fetch my contacts", e))?;

    let (contacts, dropped): (Vec<Contact>, Vec<Contact>) = candidates
        .into_iter()
        .partition(|contact| valid.contains(&contact.address));
    for contact in &dropped {
        debug!(
            address = %contact.address,
            "Skipping grant: not a protected data exposing an email"
        );
    }
    debug!(
        candidates = addresses.len(),
        contacts = contacts.len(),
        "Resolved contacts"
    );
    Ok(contacts)
}
