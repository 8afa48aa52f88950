//! In-memory collaborators that record every call.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use chrono::DateTime;
use rand::SeedableRng;
use rand::rngs::StdRng;

use web3mail::config::{BELLECOUR_DAPP_ADDRESS, BELLECOUR_WHITELIST_ADDRESS};
use web3mail::indexer::{EMAIL_SCHEMA, ProtectedDataRecord};
use web3mail::marketplace::{
    AppOrderbookQuery, DatasetOrderbookQuery, Deal, MatchOptions, RequestOrderTemplate,
    WorkerpoolOrderbookQuery,
};
use web3mail::order::{
    AppOrder, DatasetOrder, OrderKind, OrderQuad, Orderbook, PublishedOrder, RequestOrder, Tag,
    WorkerpoolOrder,
};
use web3mail::{ContentStorage, Indexer, Marketplace, ServiceError, Web3Mail, Web3MailConfig};

pub const PROTECTED_DATA: &str = "0x35396912db97ff130411301ec722fc92ac37b00d";
pub const WALLET: Address = Address::repeat_byte(0xaa);
pub const DEAL_ID: B256 = B256::repeat_byte(0x11);
pub const ENCRYPTION_KEY: &str = "ZW5jcnlwdGlvbi1rZXk=";
pub const CID: &str = "QmaDdYQwGt3cm5Fm4hYpCHY5uaD3AWd3X3ySZDs3g6W9kh";

/// Everything the fake marketplace saw.
#[derive(Debug, Default)]
pub struct MarketplaceLog {
    pub dataset_queries: Vec<(String, DatasetOrderbookQuery)>,
    pub app_queries: Vec<(String, AppOrderbookQuery)>,
    pub workerpool_queries: Vec<WorkerpoolOrderbookQuery>,
    pub storage_inits: usize,
    pub encrypted: Vec<Vec<u8>>,
    pub secrets: Vec<(String, String)>,
    pub templates: Vec<RequestOrderTemplate>,
    pub matches: Vec<(OrderQuad, MatchOptions)>,
}

impl MarketplaceLog {
    /// Number of order book queries of any kind.
    pub fn book_queries(&self) -> usize {
        self.dataset_queries.len() + self.app_queries.len() + self.workerpool_queries.len()
    }

    /// Whether anything was written: storage, secrets or orders.
    pub fn has_writes(&self) -> bool {
        self.storage_inits > 0
            || !self.encrypted.is_empty()
            || !self.secrets.is_empty()
            || !self.templates.is_empty()
            || !self.matches.is_empty()
    }
}

/// Marketplace serving fixed order books, keyed by the app they were
/// granted to.
#[derive(Debug)]
pub struct FakeMarketplace {
    pub dataset_books: HashMap<String, Orderbook<DatasetOrder>>,
    pub app_book: Orderbook<AppOrder>,
    pub workerpool_book: Orderbook<WorkerpoolOrder>,
    pub storage_ready: bool,
    pub fail_encrypt: bool,
    pub unreachable_book: Option<OrderKind>,
    pub log: Mutex<MarketplaceLog>,
}

impl Default for FakeMarketplace {
    fn default() -> Self {
        Self {
            dataset_books: HashMap::new(),
            app_book: Orderbook::default(),
            workerpool_book: Orderbook::default(),
            storage_ready: true,
            fail_encrypt: false,
            unreachable_book: None,
            log: Mutex::new(MarketplaceLog::default()),
        }
    }
}

impl FakeMarketplace {
    /// Marketplace with one affordable order in each book, granted through
    /// the primary app.
    pub fn with_free_orders() -> Self {
        let dataset = PROTECTED_DATA.parse().unwrap();
        Self::default()
            .with_dataset_orders(
                BELLECOUR_DAPP_ADDRESS,
                vec![dataset_order(dataset, 0, Address::ZERO)],
            )
            .with_app_orders(vec![app_order(0)])
            .with_workerpool_orders(vec![workerpool_order(0)])
    }

    #[must_use]
    pub fn with_dataset_orders(
        mut self,
        app: &str,
        orders: Vec<PublishedOrder<DatasetOrder>>,
    ) -> Self {
        self.dataset_books.insert(app.to_owned(), book(orders));
        self
    }

    #[must_use]
    pub fn with_app_orders(mut self, orders: Vec<PublishedOrder<AppOrder>>) -> Self {
        self.app_book = book(orders);
        self
    }

    #[must_use]
    pub fn with_workerpool_orders(mut self, orders: Vec<PublishedOrder<WorkerpoolOrder>>) -> Self {
        self.workerpool_book = book(orders);
        self
    }

    /// Makes every query on the `kind` book fail as if the market were down.
    #[must_use]
    pub fn with_unreachable_book(mut self, kind: OrderKind) -> Self {
        self.unreachable_book = Some(kind);
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, MarketplaceLog> {
        self.log.lock().unwrap()
    }

    fn book_available(&self, kind: OrderKind) -> Result<(), ServiceError> {
        if self.unreachable_book == Some(kind) {
            return Err(ServiceError::unreachable("iexec market", "connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl Marketplace for FakeMarketplace {
    async fn address(&self) -> Result<Address, ServiceError> {
        Ok(WALLET)
    }

    async fn storage_token_exists(&self, _address: Address) -> Result<bool, ServiceError> {
        Ok(self.storage_ready)
    }

    async fn init_storage(&self) -> Result<(), ServiceError> {
        self.log().storage_inits += 1;
        Ok(())
    }

    async fn fetch_dataset_orderbook(
        &self,
        dataset: &str,
        query: &DatasetOrderbookQuery,
    ) -> Result<Orderbook<DatasetOrder>, ServiceError> {
        self.log().dataset_queries.push((dataset.to_owned(), query.clone()));
        self.book_available(OrderKind::Dataset)?;
        let app = query.app.clone().unwrap_or_default();
        Ok(self.dataset_books.get(&app).cloned().unwrap_or_default())
    }

    async fn fetch_app_orderbook(
        &self,
        app: &str,
        query: &AppOrderbookQuery,
    ) -> Result<Orderbook<AppOrder>, ServiceError> {
        self.log().app_queries.push((app.to_owned(), query.clone()));
        self.book_available(OrderKind::App)?;
        Ok(self.app_book.clone())
    }

    async fn fetch_workerpool_orderbook(
        &self,
        query: &WorkerpoolOrderbookQuery,
    ) -> Result<Orderbook<WorkerpoolOrder>, ServiceError> {
        self.log().workerpool_queries.push(query.clone());
        self.book_available(OrderKind::Workerpool)?;
        Ok(self.workerpool_book.clone())
    }

    fn generate_encryption_key(&self) -> String {
        ENCRYPTION_KEY.to_owned()
    }

    async fn encrypt(&self, content: &[u8], _key: &str) -> Result<Vec<u8>, ServiceError> {
        if self.fail_encrypt {
            return Err(ServiceError::Rejected("cipher unavailable".into()));
        }
        self.log().encrypted.push(content.to_vec());
        Ok(content.iter().rev().copied().collect())
    }

    async fn push_requester_secret(&self, id: &str, value: &str) -> Result<(), ServiceError> {
        self.log().secrets.push((id.to_owned(), value.to_owned()));
        Ok(())
    }

    async fn create_request_order(
        &self,
        template: &RequestOrderTemplate,
    ) -> Result<RequestOrder, ServiceError> {
        self.log().templates.push(template.clone());
        Ok(RequestOrder {
            app: Address::repeat_byte(0x0a),
            appmaxprice: template.appmaxprice,
            dataset: template.dataset.parse().unwrap_or_default(),
            datasetmaxprice: template.datasetmaxprice,
            workerpool: Address::repeat_byte(0x0b),
            workerpoolmaxprice: template.workerpoolmaxprice,
            requester: WALLET,
            volume: 1,
            tag: template.tag,
            category: template.category,
            trust: 0,
            beneficiary: WALLET,
            callback: Address::ZERO,
            params: serde_json::to_string(&template.params).map_err(ServiceError::from)?,
            salt: B256::repeat_byte(0x5a),
            sign: None,
        })
    }

    async fn sign_request_order(
        &self,
        mut order: RequestOrder,
    ) -> Result<RequestOrder, ServiceError> {
        order.sign = Some(Bytes::from_static(&[0x51; 65]));
        Ok(order)
    }

    async fn match_orders(
        &self,
        orders: &OrderQuad,
        options: MatchOptions,
    ) -> Result<Deal, ServiceError> {
        self.log().matches.push((orders.clone(), options));
        Ok(Deal {
            deal_id: DEAL_ID,
            volume: 1,
            tx_hash: B256::repeat_byte(0x77),
        })
    }
}

/// Indexer over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct FakeIndexer {
    pub records: Vec<ProtectedDataRecord>,
    pub queries: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeIndexer {
    /// Indexer knowing each address as a mailable protected data.
    pub fn mailable(addresses: &[&str]) -> Self {
        Self {
            records: addresses.iter().map(|a| record(a, &[EMAIL_SCHEMA])).collect(),
            queries: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_record(mut self, record: ProtectedDataRecord) -> Self {
        self.records.push(record);
        self
    }
}

#[async_trait]
impl Indexer for FakeIndexer {
    async fn protected_data(
        &self,
        addresses: &[String],
        required_schema: &[&str],
    ) -> Result<Vec<ProtectedDataRecord>, ServiceError> {
        self.queries.lock().unwrap().push(addresses.to_vec());
        Ok(self
            .records
            .iter()
            .filter(|r| addresses.contains(&r.id))
            .filter(|r| required_schema.iter().all(|s| r.schema.iter().any(|e| e == s)))
            .cloned()
            .collect())
    }
}

/// Storage keeping uploads in memory.
#[derive(Debug, Clone, Default)]
pub struct FakeStorage {
    pub fail: bool,
    pub uploads: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl ContentStorage for FakeStorage {
    async fn add(&self, content: &[u8]) -> Result<String, ServiceError> {
        if self.fail {
            return Err(ServiceError::unreachable("ipfs", "connection refused"));
        }
        self.uploads.lock().unwrap().push(content.to_vec());
        Ok(CID.to_owned())
    }
}

pub type TestClient = Web3Mail<FakeMarketplace, FakeIndexer, FakeStorage>;

/// Client on the production preset with a seeded workerpool picker.
pub fn client(
    marketplace: FakeMarketplace,
    indexer: FakeIndexer,
    storage: FakeStorage,
) -> TestClient {
    Web3Mail::new(Web3MailConfig::bellecour(), marketplace, indexer, storage)
        .unwrap()
        .with_rng(StdRng::seed_from_u64(7))
}

pub fn record(address: &str, schema: &[&str]) -> ProtectedDataRecord {
    ProtectedDataRecord {
        id: address.to_owned(),
        name: "my email".to_owned(),
        owner: format!("{:#x}", Address::repeat_byte(0xee)),
        schema: schema.iter().map(|s| (*s).to_owned()).collect(),
        creation_timestamp: 1_686_847_000,
    }
}

fn book<T>(orders: Vec<PublishedOrder<T>>) -> Orderbook<T> {
    let count = orders.len() as u64;
    Orderbook { orders, count }
}

fn published<T>(order: T, signer: Address) -> PublishedOrder<T> {
    PublishedOrder {
        order,
        order_hash: B256::repeat_byte(0x42),
        chain_id: 134,
        publication_timestamp: DateTime::from_timestamp(1_686_847_162, 0).unwrap(),
        signer,
        status: "open".to_owned(),
        remaining: 10,
    }
}

pub fn dataset_order(
    dataset: Address,
    price: u64,
    requester: Address,
) -> PublishedOrder<DatasetOrder> {
    published(
        DatasetOrder {
            dataset,
            datasetprice: price,
            volume: 10,
            tag: Tag::TEE_SCONE,
            apprestrict: Address::ZERO,
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: requester,
            salt: B256::repeat_byte(0x01),
            sign: Bytes::from_static(&[0x51; 65]),
        },
        Address::repeat_byte(0xee),
    )
}

pub fn app_order(price: u64) -> PublishedOrder<AppOrder> {
    published(
        AppOrder {
            app: Address::repeat_byte(0x0a),
            appprice: price,
            volume: 1000,
            tag: Tag::TEE_SCONE,
            datasetrestrict: Address::ZERO,
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::repeat_byte(0x02),
            sign: Bytes::from_static(&[0x51; 65]),
        },
        Address::repeat_byte(0x0a),
    )
}

pub fn workerpool_order(price: u64) -> PublishedOrder<WorkerpoolOrder> {
    published(
        WorkerpoolOrder {
            workerpool: Address::repeat_byte(0x0b),
            workerpoolprice: price,
            volume: 1,
            tag: Tag::TEE_SCONE,
            category: 0,
            trust: 0,
            apprestrict: Address::ZERO,
            datasetrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::repeat_byte(0x03),
            sign: Bytes::from_static(&[0x51; 65]),
        },
        Address::repeat_byte(0x0b),
    )
}

/// The whitelist key under which fallback grants are served.
pub const WHITELIST: &str = BELLECOUR_WHITELIST_ADDRESS;
