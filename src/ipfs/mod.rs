//! IPFS archival of finalized curation records.
//!
//! Records are added (and pinned) through an IPFS daemon's HTTP API; the
//! returned CID is published as a URL under a fixed public gateway.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;

/// Content-addressed store for serialized records.
#[async_trait]
pub trait ArchivalSink: Send + Sync {
    /// Store `data` and return its content address.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be stored.
    async fn store(&self, data: Vec<u8>, filename: &str) -> Result<String>;

    /// Public URL for a content address.
    fn public_url(&self, address: &str) -> String;
}

/// IPFS API response for add operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
}

/// IPFS client for pinning records.
#[derive(Clone)]
pub struct IpfsClient {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
}

impl IpfsClient {
    /// Create a new IPFS client from configuration.
    #[must_use]
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: config.ipfs_api_url.trim_end_matches('/').to_string(),
            gateway_url: config.ipfs_gateway_url.clone(),
        }
    }

    /// Pin bytes to IPFS and return its CID.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be pinned.
    pub async fn pin_bytes(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        let part = multipart::Part::bytes(data).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}/api/v0/add?pin=true", self.api_url);
        debug!(url = %url, filename = %filename, "Pinning bytes to IPFS");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to IPFS daemon")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            anyhow::bail!("IPFS add failed: {} - {}", status, body);
        }

        let add_response: AddResponse = response
            .json()
            .await
            .context("Failed to parse IPFS add response")?;

        info!(cid = %add_response.hash, filename = %filename, "Pinned bytes to IPFS");

        Ok(add_response.hash)
    }
}

#[async_trait]
impl ArchivalSink for IpfsClient {
    async fn store(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        self.pin_bytes(data, filename).await
    }

    fn public_url(&self, address: &str) -> String {
        format!("{}{address}", self.gateway_url)
    }
}

impl std::fmt::Debug for IpfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsClient")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}
