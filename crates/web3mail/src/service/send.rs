//! The send pipeline: validation, order acquisition, secret provisioning and
//! order submission, strictly in that order.

use std::sync::Mutex;

use rand::Rng;
use tracing::{debug, info};

use crate::config::Web3MailConfig;
use crate::error::{Error, Result};
use crate::indexer::{Indexer, mailable_addresses};
use crate::marketplace::Marketplace;
use crate::order::{
    AcquisitionRequest, MaxPrices, SubmissionRequest, TaskHandle, acquire_orders, submit,
};
use crate::secret::{MailContent, provision_secret};
use crate::storage::ContentStorage;
use crate::validation::{self, ContentType};

/// Parameters of a send. Built with [`SendEmailParams::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEmailParams {
    /// Protected data address or ENS name.
    pub protected_data: String,
    /// Email subject.
    pub email_subject: String,
    /// Email body.
    pub email_content: String,
    /// Body format.
    pub content_type: ContentType,
    /// Display name of the sender.
    pub sender_name: Option<String>,
    /// Opaque label forwarded to the task.
    pub label: Option<String>,
    /// Workerpool override.
    pub workerpool_address: Option<String>,
    /// Dataset price ceiling override.
    pub data_max_price: Option<u64>,
    /// App price ceiling override.
    pub app_max_price: Option<u64>,
    /// Workerpool price ceiling override.
    pub workerpool_max_price: Option<u64>,
    /// Pay with the requester's voucher.
    pub use_voucher: bool,
}

impl SendEmailParams {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> SendEmailParamsBuilder {
        SendEmailParamsBuilder::default()
    }

    fn max_prices(&self, defaults: MaxPrices) -> MaxPrices {
        MaxPrices {
            dataset: self.data_max_price.unwrap_or(defaults.dataset),
            app: self.app_max_price.unwrap_or(defaults.app),
            workerpool: self.workerpool_max_price.unwrap_or(defaults.workerpool),
        }
    }
}

/// Builder for [`SendEmailParams`].
#[derive(Debug, Clone, Default)]
pub struct SendEmailParamsBuilder {
    protected_data: Option<String>,
    email_subject: Option<String>,
    email_content: Option<String>,
    content_type: ContentType,
    sender_name: Option<String>,
    label: Option<String>,
    workerpool_address: Option<String>,
    data_max_price: Option<u64>,
    app_max_price: Option<u64>,
    workerpool_max_price: Option<u64>,
    use_voucher: bool,
}

impl SendEmailParamsBuilder {
    /// Sets the protected data to email.
    #[must_use]
    pub fn protected_data(mut self, address: impl Into<String>) -> Self {
        self.protected_data = Some(address.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn email_subject(mut self, subject: impl Into<String>) -> Self {
        self.email_subject = Some(subject.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn email_content(mut self, content: impl Into<String>) -> Self {
        self.email_content = Some(content.into());
        self
    }

    /// Sets the body format.
    #[must_use]
    pub const fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the sender display name.
    #[must_use]
    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Sets the task label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Overrides the configured workerpool.
    #[must_use]
    pub fn workerpool_address(mut self, address: impl Into<String>) -> Self {
        self.workerpool_address = Some(address.into());
        self
    }

    /// Overrides the dataset price ceiling.
    #[must_use]
    pub const fn data_max_price(mut self, price: u64) -> Self {
        self.data_max_price = Some(price);
        self
    }

    /// Overrides the app price ceiling.
    #[must_use]
    pub const fn app_max_price(mut self, price: u64) -> Self {
        self.app_max_price = Some(price);
        self
    }

    /// Overrides the workerpool price ceiling.
    #[must_use]
    pub const fn workerpool_max_price(mut self, price: u64) -> Self {
        self.workerpool_max_price = Some(price);
        self
    }

    /// Pays with the requester's voucher.
    #[must_use]
    pub const fn use_voucher(mut self, use_voucher: bool) -> Self {
        self.use_voucher = use_voucher;
        self
    }

    /// Builds the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if the protected data, subject or
    /// content was never set.
    pub fn build(self) -> Result<SendEmailParams> {
        Ok(SendEmailParams {
            protected_data: self
                .protected_data
                .ok_or(Error::MissingParameter("protectedData"))?,
            email_subject: self
                .email_subject
                .ok_or(Error::MissingParameter("emailSubject"))?,
            email_content: self
                .email_content
                .ok_or(Error::MissingParameter("emailContent"))?,
            content_type: self.content_type,
            sender_name: self.sender_name,
            label: self.label,
            workerpool_address: self.workerpool_address,
            data_max_price: self.data_max_price,
            app_max_price: self.app_max_price,
            workerpool_max_price: self.workerpool_max_price,
            use_voucher: self.use_voucher,
        })
    }
}

/// Collaborators a send runs against.
pub(crate) struct SendContext<'a, M: ?Sized, I: ?Sized, S: ?Sized, R: ?Sized> {
    pub config: &'a Web3MailConfig,
    pub marketplace: &'a M,
    pub indexer: &'a I,
    pub storage: &'a S,
    pub rng: &'a Mutex<R>,
}

/// Runs the send pipeline.
///
/// Every input is validated before the first network call.
pub(crate) async fn send_email<M, I, S, R>(
    ctx: &SendContext<'_, M, I, S, R>,
    params: &SendEmailParams,
) -> Result<TaskHandle>
where
    M: Marketplace + ?Sized,
    I: Indexer + ?Sized,
    S: ContentStorage + ?Sized,
    R: Rng + ?Sized,
{
    let dataset = validation::address_or_ens("protectedData", &params.protected_data)?;
    let subject = validation::email_subject(&params.email_subject)?;
    let content = validation::email_content(&params.email_content)?;
    let sender_name = validation::sender_name(params.sender_name.as_deref())?;
    let label = validation::label(params.label.as_deref())?;
    let workerpool = validation::address_or_ens(
        "workerpoolAddressOrEns",
        params
            .workerpool_address
            .as_deref()
            .unwrap_or(&ctx.config.workerpool_address),
    )?;
    let max_prices = params.max_prices(ctx.config.max_prices());

    let valid = mailable_addresses(ctx.indexer, std::slice::from_ref(&dataset))
        .await
        .map_err(|e| Error::service("Failed to check protected data validity", e))?;
    if !valid.contains(&dataset) {
        return Err(Error::InvalidProtectedData);
    }

    let requester = ctx
        .marketplace
        .address()
        .await
        .map_err(|e| Error::service("Failed to resolve requester address", e))?;

    let storage_ready = ctx
        .marketplace
        .storage_token_exists(requester)
        .await
        .map_err(|e| Error::service("Failed to check storage token", e))?;
    if !storage_ready {
        debug!(%requester, "Initializing content storage");
        ctx.marketplace
            .init_storage()
            .await
            .map_err(|e| Error::service("Failed to initialize storage", e))?;
    }

    let orders = acquire_orders(
        ctx.marketplace,
        &AcquisitionRequest {
            dataset: &dataset,
            requester,
            app: &ctx.config.dapp_address,
            whitelist_app: &ctx.config.dapp_whitelist_address,
            workerpool: &workerpool,
            max_prices,
        },
        ctx.rng,
    )
    .await?;

    let secret_id = provision_secret(
        ctx.marketplace,
        ctx.storage,
        &MailContent {
            subject,
            content,
            content_type: params.content_type,
            sender_name,
        },
    )
    .await?;

    let task = submit(
        ctx.marketplace,
        orders,
        &SubmissionRequest {
            app: &ctx.config.dapp_address,
            dataset: &dataset,
            workerpool: &workerpool,
            secret_id: &secret_id,
            label,
            use_voucher: params.use_voucher,
        },
    )
    .await?;

    info!(task_id = %task.task_id, protected_data = %dataset, "Email task submitted");
    Ok(task)
}
