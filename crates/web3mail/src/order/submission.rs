//! Request order construction, signing and matching.

use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::B256;
use tracing::debug;

use super::acquisition::SelectedOrders;
use super::model::{OrderQuad, Tag};
use crate::error::{Error, Result};
use crate::marketplace::{Marketplace, MatchOptions, RequestOrderTemplate, RequestParams};

/// Secret slot the requester bundle is bound to.
const REQUESTER_SECRET_SLOT: u32 = 1;

/// Request-side inputs for a submission.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    /// Mail app address or ENS.
    pub app: &'a str,
    /// Protected data address.
    pub dataset: &'a str,
    /// Workerpool address or ENS.
    pub workerpool: &'a str,
    /// Requester secret holding the mail bundle.
    pub secret_id: &'a str,
    /// Opaque label forwarded to the task as its arguments.
    pub label: Option<&'a str>,
    /// Pay with the requester's voucher.
    pub use_voucher: bool,
}

/// Handle on the task created by a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    /// Deal the task belongs to.
    pub deal_id: B256,
    /// Task index within the deal.
    pub index: u64,
    /// Task identifier.
    pub task_id: B256,
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.task_id)
    }
}

/// Builds the request order for `orders`, signs it, matches the four orders
/// and derives the id of task 0 of the resulting deal.
///
/// Max prices come from the selected orders, not from the caller's ceilings.
///
/// # Errors
///
/// Returns [`Error::Service`] if order creation, signing or matching fails.
pub async fn submit<M: Marketplace + ?Sized>(
    marketplace: &M,
    orders: SelectedOrders,
    request: &SubmissionRequest<'_>,
) -> Result<TaskHandle> {
    let SelectedOrders {
        dataset_order,
        app_order,
        workerpool_order,
    } = orders;

    let template = RequestOrderTemplate {
        app: request.app.to_owned(),
        dataset: request.dataset.to_owned(),
        workerpool: request.workerpool.to_owned(),
        appmaxprice: app_order.appprice,
        datasetmaxprice: dataset_order.datasetprice,
        workerpoolmaxprice: workerpool_order.workerpoolprice,
        category: workerpool_order.category,
        tag: Tag::TEE_SCONE,
        params: RequestParams {
            iexec_developer_logger: true,
            iexec_secrets: BTreeMap::from([(
                REQUESTER_SECRET_SLOT,
                request.secret_id.to_owned(),
            )]),
            iexec_args: request.label.map(str::to_owned),
        },
    };

    let unsigned = marketplace
        .create_request_order(&template)
        .await
        .map_err(|e| Error::service("Failed to create request order", e))?;
    let request_order = marketplace
        .sign_request_order(unsigned)
        .await
        .map_err(|e| Error::service("Failed to sign request order", e))?;

    let quad = OrderQuad {
        app_order,
        dataset_order,
        workerpool_order,
        request_order,
    };
    let options = MatchOptions {
        preflight_check: false,
        use_voucher: request.use_voucher,
    };
    let deal = marketplace
        .match_orders(&quad, options)
        .await
        .map_err(|e| Error::service("Failed to match orders", e))?;
    debug!(deal_id = %deal.deal_id, tx_hash = %deal.tx_hash, "Orders matched");

    let index = 0;
    Ok(TaskHandle {
        deal_id: deal.deal_id,
        index,
        task_id: marketplace.compute_task_id(deal.deal_id, index),
    })
}
