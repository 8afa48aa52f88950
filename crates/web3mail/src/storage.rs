//! Content-addressed storage.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::error::ServiceError;

/// Storage that returns a content identifier for every upload.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    /// Uploads `content` and returns its content identifier.
    async fn add(&self, content: &[u8]) -> Result<String, ServiceError>;
}

/// Multiaddress of a content identifier.
#[must_use]
pub fn multiaddr(cid: &str) -> String {
    format!("/ipfs/{cid}")
}

/// Content identifier of an `/ipfs/<cid>` multiaddress.
#[must_use]
pub fn cid_from_multiaddr(multiaddr: &str) -> Option<&str> {
    multiaddr
        .strip_prefix("/ipfs/")
        .filter(|cid| !cid.is_empty() && !cid.contains('/'))
}

/// Appends path segments to `base`, keeping any path it already has.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ServiceError::InvalidResponse(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// IPFS client: uploads through a node's HTTP API, reads through a gateway.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    node: Url,
    gateway: Url,
    http_client: Client,
}

impl IpfsClient {
    /// Creates a client for an upload node and a read gateway.
    #[must_use]
    pub fn new(node: Url, gateway: Url) -> Self {
        Self {
            node,
            gateway,
            http_client: Client::new(),
        }
    }

    /// Gateway URL serving `cid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn gateway_url(&self, cid: &str) -> Result<Url, ServiceError> {
        endpoint(&self.gateway, &["ipfs", cid])
    }

    /// Downloads `cid` through the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unreachable or does not serve the content.
    pub async fn cat(&self, cid: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self.http_client.get(self.gateway_url(cid)?).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::unreachable(
                "ipfs gateway",
                format!("failed to load {cid}: HTTP {}", response.status()),
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentStorage for IpfsClient {
    async fn add(&self, content: &[u8]) -> Result<String, ServiceError> {
        let mut url = endpoint(&self.node, &["api", "v0", "add"])?;
        url.query_pairs_mut().append_pair("pin", "true");

        let form = Form::new().part("file", Part::bytes(content.to_vec()).file_name("file"));
        let response = self.http_client.post(url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::unreachable(
                "ipfs node",
                format!("upload failed: HTTP {}", response.status()),
            ));
        }
        let added: AddResponse = response.json().await?;

        // The gateway must serve the content before a task can fetch it.
        let check = self
            .http_client
            .get(self.gateway_url(&added.hash)?)
            .send()
            .await?;
        if !check.status().is_success() {
            return Err(ServiceError::unreachable(
                "ipfs gateway",
                format!("failed to load uploaded file at {}", added.hash),
            ));
        }

        Ok(added.hash)
    }
}
