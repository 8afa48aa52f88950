//! Order selection policies.
//!
//! Order books list their orders cheapest first. Dataset and app orders are
//! taken from the head of the filtered book; workerpool orders are drawn
//! uniformly at random so load spreads across operators.

use rand::Rng;
use rand::seq::SliceRandom;

use super::model::{
    AppOrder, DatasetOrder, OrderKind, Orderbook, PricedOrder, Tag, WorkerpoolOrder,
};
use crate::error::{Error, Result};

/// How an order's tag must relate to the required tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// The order may require less than the request offers.
    Subset,
    /// The order must require exactly the request's tag.
    Exact,
}

impl TagMatch {
    fn accepts(self, order: Tag, required: Tag) -> bool {
        match self {
            Self::Subset => order.is_subset_of(&required),
            Self::Exact => order == required,
        }
    }
}

/// Orders of `book` priced at most `max_price` and compatible with `required`,
/// in book order.
pub fn affordable<T: PricedOrder>(
    book: &Orderbook<T>,
    max_price: u64,
    required: Tag,
    tag_match: TagMatch,
) -> impl Iterator<Item = &T> {
    book.orders
        .iter()
        .map(|published| &published.order)
        .filter(move |order| {
            order.price() <= max_price && tag_match.accepts(order.tag(), required)
        })
}

/// Picks the dataset order: the first affordable order granted to the primary
/// app, otherwise the first one granted to the whitelist.
///
/// Prices are not compared across the two books.
///
/// # Errors
///
/// Returns [`Error::NoOrder`] if neither book has an affordable order.
pub fn select_dataset_order(
    primary: &Orderbook<DatasetOrder>,
    whitelist: &Orderbook<DatasetOrder>,
    max_price: u64,
) -> Result<DatasetOrder> {
    affordable(primary, max_price, Tag::TEE_SCONE, TagMatch::Subset)
        .next()
        .or_else(|| affordable(whitelist, max_price, Tag::TEE_SCONE, TagMatch::Subset).next())
        .cloned()
        .ok_or(Error::NoOrder(OrderKind::Dataset))
}

/// Picks the first affordable app order.
///
/// # Errors
///
/// Returns [`Error::NoOrder`] if the book has no affordable order.
pub fn select_app_order(book: &Orderbook<AppOrder>, max_price: u64) -> Result<AppOrder> {
    affordable(book, max_price, Tag::TEE_SCONE, TagMatch::Exact)
        .next()
        .cloned()
        .ok_or(Error::NoOrder(OrderKind::App))
}

/// Picks an affordable workerpool order uniformly at random.
///
/// # Errors
///
/// Returns [`Error::NoOrder`] if the book has no affordable order.
pub fn select_workerpool_order<R: Rng + ?Sized>(
    book: &Orderbook<WorkerpoolOrder>,
    max_price: u64,
    rng: &mut R,
) -> Result<WorkerpoolOrder> {
    let candidates: Vec<&WorkerpoolOrder> =
        affordable(book, max_price, Tag::TEE_SCONE, TagMatch::Exact).collect();
    candidates
        .choose(rng)
        .map(|order| (*order).clone())
        .ok_or(Error::NoOrder(OrderKind::Workerpool))
}
