//! Protected data indexer.
//!
//! The indexer tracks every protected data registered in the dataset
//! registry together with its schema. Apps and other registry objects are not
//! indexed, so an address absent from the indexer is not a protected data.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::ServiceError;

/// Schema entry a protected data must declare to be mailable.
pub const EMAIL_SCHEMA: &str = "email:string";

/// Ids per indexer query.
pub const QUERY_BATCH_SIZE: usize = 1000;

const PROTECTED_DATA_QUERY: &str = r#"
query ProtectedData($ids: [String!]!, $requiredSchema: [String!]!, $start: Int!, $range: Int!) {
  protectedDatas(
    where: { transactionHash_not: "0x", id_in: $ids, schema_contains: $requiredSchema }
    skip: $start
    first: $range
    orderBy: creationTimestamp
    orderDirection: desc
  ) {
    id
    name
    owner { id }
    schema
    creationTimestamp
  }
}
"#;

/// A protected data as indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedDataRecord {
    /// Dataset address, lowercase.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owner address, lowercase.
    pub owner: String,
    /// Declared `path:type` schema entries.
    pub schema: Vec<String>,
    /// Creation time, seconds since the epoch.
    pub creation_timestamp: u64,
}

impl ProtectedDataRecord {
    /// Whether the schema declares an email field.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.schema.iter().any(|entry| entry == EMAIL_SCHEMA)
    }
}

/// Lookup of protected data by address.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Records of the protected data among `addresses` whose schema contains
    /// every entry of `required_schema`.
    async fn protected_data(
        &self,
        addresses: &[String],
        required_schema: &[&str],
    ) -> Result<Vec<ProtectedDataRecord>, ServiceError>;
}

/// Subset of `addresses` that are protected data exposing an email.
///
/// # Errors
///
/// Returns an error if the indexer query fails.
pub async fn mailable_addresses<I: Indexer + ?Sized>(
    indexer: &I,
    addresses: &[String],
) -> Result<HashSet<String>, ServiceError> {
    if addresses.is_empty() {
        return Ok(HashSet::new());
    }
    let wanted: HashSet<String> = addresses.iter().map(|a| a.to_lowercase()).collect();
    let records = indexer.protected_data(addresses, &[EMAIL_SCHEMA]).await?;
    Ok(records
        .into_iter()
        .filter(ProtectedDataRecord::has_email)
        .map(|record| record.id.to_lowercase())
        .filter(|id| wanted.contains(id))
        .collect())
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ProtectedDataPage>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtectedDataPage {
    protected_datas: Vec<RawProtectedData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProtectedData {
    id: String,
    #[serde(default)]
    name: String,
    owner: RawOwner,
    #[serde(default)]
    schema: Vec<String>,
    creation_timestamp: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    id: String,
}

impl TryFrom<RawProtectedData> for ProtectedDataRecord {
    type Error = ServiceError;

    fn try_from(raw: RawProtectedData) -> Result<Self, Self::Error> {
        let creation_timestamp = raw.creation_timestamp.parse().map_err(|_| {
            ServiceError::InvalidResponse(format!(
                "invalid creationTimestamp for {}: {}",
                raw.id, raw.creation_timestamp
            ))
        })?;
        Ok(Self {
            id: raw.id.to_lowercase(),
            name: raw.name,
            owner: raw.owner.id.to_lowercase(),
            schema: raw.schema,
            creation_timestamp,
        })
    }
}

/// Indexer backed by the protected data subgraph.
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    endpoint: Url,
    http_client: Client,
}

impl SubgraphClient {
    /// Creates a client for a subgraph GraphQL endpoint.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            http_client: Client::new(),
        }
    }

    async fn query_batch(
        &self,
        ids: &[String],
        required_schema: &[&str],
    ) -> Result<Vec<ProtectedDataRecord>, ServiceError> {
        let body = json!({
            "query": PROTECTED_DATA_QUERY,
            "variables": {
                "ids": ids,
                "requiredSchema": required_schema,
                "start": 0,
                "range": ids.len(),
            },
        });
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ServiceError::unreachable(
                "subgraph",
                format!("HTTP {}", response.status()),
            ));
        }

        let response: GraphQlResponse = response.json().await?;
        if let Some(error) = response.errors.first() {
            return Err(ServiceError::InvalidResponse(error.message.clone()));
        }
        let page = response
            .data
            .ok_or_else(|| ServiceError::InvalidResponse("missing data".into()))?;
        page.protected_datas
            .into_iter()
            .map(ProtectedDataRecord::try_from)
            .collect()
    }
}

#[async_trait]
impl Indexer for SubgraphClient {
    async fn protected_data(
        &self,
        addresses: &[String],
        required_schema: &[&str],
    ) -> Result<Vec<ProtectedDataRecord>, ServiceError> {
        let ids: Vec<String> = addresses.iter().map(|a| a.to_lowercase()).collect();
        let mut records = Vec::new();
        for batch in ids.chunks(QUERY_BATCH_SIZE) {
            records.extend(self.query_batch(batch, required_schema).await?);
        }
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    struct StaticIndexer(Vec<ProtectedDataRecord>);

    #[async_trait]
    impl Indexer for StaticIndexer {
        async fn protected_data(
            &self,
            _addresses: &[String],
            _required_schema: &[&str],
        ) -> Result<Vec<ProtectedDataRecord>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    fn record(id: &str, schema: &[&str]) -> ProtectedDataRecord {
        ProtectedDataRecord {
            id: id.into(),
            name: "test do not use".into(),
            owner: "0xowner".into(),
            schema: schema.iter().map(ToString::to_string).collect(),
            creation_timestamp: 1_686_847_162,
        }
    }

    #[tokio::test]
    async fn test_mailable_addresses_filters_schema_and_unknown_ids() {
        let indexer = StaticIndexer(vec![
            record("0xaaa", &["email:string"]),
            record("0xbbb", &["foo:string"]),
            record("0xccc", &["email:string"]),
        ]);
        let addresses = vec!["0xAAA".to_string(), "0xbbb".to_string()];

        let valid = mailable_addresses(&indexer, &addresses).await.unwrap();

        assert_eq!(valid, HashSet::from(["0xaaa".to_string()]));
    }

    #[tokio::test]
    async fn test_mailable_addresses_skips_query_when_empty() {
        let indexer = StaticIndexer(vec![record("0xaaa", &["email:string"])]);
        assert!(mailable_addresses(&indexer, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subgraph_client_parses_records() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/subgraph")
                    .body_contains("email:string")
                    .body_contains("0x35396912db97ff130411301ec722fc92ac37b00d");
                then.status(200).json_body(json!({
                    "data": {
                        "protectedDatas": [{
                            "id": "0x35396912db97ff130411301ec722fc92ac37b00d",
                            "name": "test do not use",
                            "owner": { "id": "0xD52C27CC2c7D3fb5BA4440ffa825c12EA5658D60" },
                            "schema": ["email:string"],
                            "creationTimestamp": "1686847162"
                        }]
                    }
                }));
            })
            .await;
        let client = SubgraphClient::new(Url::parse(&server.url("/subgraph")).unwrap());

        let records = client
            .protected_data(
                &["0x35396912Db97ff130411301Ec722Fc92Ac37B00d".to_string()],
                &[EMAIL_SCHEMA],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].has_email());
        assert_eq!(records[0].owner, "0xd52c27cc2c7d3fb5ba4440ffa825c12ea5658d60");
        assert_eq!(records[0].creation_timestamp, 1_686_847_162);
    }

    #[tokio::test]
    async fn test_subgraph_errors_are_protocol_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(json!({ "errors": [{ "message": "indexing_error" }] }));
            })
            .await;
        let client = SubgraphClient::new(Url::parse(&server.base_url()).unwrap());

        let err = client
            .protected_data(&["0xaaa".to_string()], &[EMAIL_SCHEMA])
            .await
            .unwrap_err();

        assert!(err.is_protocol_error());
        assert_eq!(err.to_string(), "Invalid response: indexing_error");
    }
}
