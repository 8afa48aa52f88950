//! Marketplace orders: types, selection policies, acquisition and submission.

mod acquisition;
mod model;
mod selection;
mod submission;

pub use acquisition::{AcquisitionRequest, MaxPrices, SelectedOrders, acquire_orders};
pub use model::{
    AppOrder, DatasetOrder, OrderKind, OrderQuad, Orderbook, PricedOrder, PublishedOrder,
    RequestOrder, Tag, WorkerpoolOrder,
};
pub use selection::{
    TagMatch, affordable, select_app_order, select_dataset_order, select_workerpool_order,
};
pub use submission::{SubmissionRequest, TaskHandle, submit};
