//! Concurrent order book fan-out for a send.

use std::sync::{Mutex, PoisonError};

use alloy_primitives::Address;
use rand::Rng;
use tracing::debug;

use super::model::{AppOrder, DatasetOrder, Tag, WorkerpoolOrder};
use super::selection::{select_app_order, select_dataset_order, select_workerpool_order};
use crate::error::{Error, Result};
use crate::marketplace::{
    AppOrderbookQuery, DatasetOrderbookQuery, Marketplace, WorkerpoolOrderbookQuery,
};

/// Price ceilings, one per order book, in nRLC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxPrices {
    /// Ceiling for the dataset order.
    pub dataset: u64,
    /// Ceiling for the app order.
    pub app: u64,
    /// Ceiling for the workerpool order.
    pub workerpool: u64,
}

/// Identities and ceilings for an order acquisition.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionRequest<'a> {
    /// Protected data address.
    pub dataset: &'a str,
    /// Requester wallet.
    pub requester: Address,
    /// Mail app address or ENS.
    pub app: &'a str,
    /// Whitelist app address.
    pub whitelist_app: &'a str,
    /// Workerpool address or ENS.
    pub workerpool: &'a str,
    /// Price ceilings.
    pub max_prices: MaxPrices,
}

/// The three sell orders chosen for a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOrders {
    /// Dataset order.
    pub dataset_order: DatasetOrder,
    /// App order.
    pub app_order: AppOrder,
    /// Workerpool order.
    pub workerpool_order: WorkerpoolOrder,
}

/// Queries the dataset (primary and whitelist grants), app and workerpool
/// books concurrently, then applies the selection policies.
///
/// The first failing query aborts the whole acquisition. App and workerpool
/// selection are checked before the dataset fallback.
///
/// # Errors
///
/// Returns [`Error::Service`] when a book query fails and [`Error::NoOrder`]
/// when a book has nothing affordable.
pub async fn acquire_orders<M, R>(
    marketplace: &M,
    request: &AcquisitionRequest<'_>,
    rng: &Mutex<R>,
) -> Result<SelectedOrders>
where
    M: Marketplace + ?Sized,
    R: Rng + ?Sized,
{
    let requester = format!("{:#x}", request.requester);
    let primary_query = DatasetOrderbookQuery {
        app: Some(request.app.to_owned()),
        requester: Some(requester.clone()),
        ..DatasetOrderbookQuery::default()
    };
    let whitelist_query = DatasetOrderbookQuery {
        app: Some(request.whitelist_app.to_owned()),
        requester: Some(requester),
        ..DatasetOrderbookQuery::default()
    };
    let app_query = AppOrderbookQuery {
        workerpool: Some(request.workerpool.to_owned()),
        min_tag: Tag::TEE_SCONE,
        max_tag: Tag::TEE_SCONE,
    };
    let workerpool_query = WorkerpoolOrderbookQuery {
        workerpool: Some(request.workerpool.to_owned()),
        app: Some(request.app.to_owned()),
        dataset: Some(request.dataset.to_owned()),
        min_tag: Tag::TEE_SCONE,
        max_tag: Tag::TEE_SCONE,
        category: 0,
    };

    let (primary_book, whitelist_book, app_book, workerpool_book) = tokio::try_join!(
        async {
            marketplace
                .fetch_dataset_orderbook(request.dataset, &primary_query)
                .await
                .map_err(|e| Error::service("Failed to fetch dataset orderbook", e))
        },
        async {
            marketplace
                .fetch_dataset_orderbook(request.dataset, &whitelist_query)
                .await
                .map_err(|e| Error::service("Failed to fetch dataset orderbook", e))
        },
        async {
            marketplace
                .fetch_app_orderbook(request.app, &app_query)
                .await
                .map_err(|e| Error::service("Failed to fetch app orderbook", e))
        },
        async {
            marketplace
                .fetch_workerpool_orderbook(&workerpool_query)
                .await
                .map_err(|e| Error::service("Failed to fetch workerpool orderbook", e))
        },
    )?;

    debug!(
        dataset_orders = primary_book.orders.len(),
        whitelist_orders = whitelist_book.orders.len(),
        app_orders = app_book.orders.len(),
        workerpool_orders = workerpool_book.orders.len(),
        "Fetched orderbooks"
    );

    let app_order = select_app_order(&app_book, request.max_prices.app)?;
    let workerpool_order = {
        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        select_workerpool_order(&workerpool_book, request.max_prices.workerpool, &mut *rng)?
    };
    let dataset_order =
        select_dataset_order(&primary_book, &whitelist_book, request.max_prices.dataset)?;

    Ok(SelectedOrders {
        dataset_order,
        app_order,
        workerpool_order,
    })
}
