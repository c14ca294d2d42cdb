pub mod remote_ip;
pub mod types;
pub mod update_service;

use crate::config::BrokerConfig;
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, header};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// HTTP client for the broker's helper endpoints.
#[derive(Clone, Debug)]
pub struct BrokerClient {
    pub(crate) client: Client,
    pub(crate) config: BrokerConfig,
    /// `usernameisfqdn` answers by service id, shared between clones.
    pub(crate) username_is_fqdn_cache: Arc<Mutex<HashMap<u32, bool>>>,
}

impl BrokerClient {
    pub fn new(config: BrokerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            username_is_fqdn_cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// GET against the broker, carrying the admin session cookie when one is
    /// configured.
    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let request = self.client.get(&url);
        match &self.config.session_id {
            Some(session_id) => request.header(header::COOKIE, format!("sessionid={session_id}")),
            None => request,
        }
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed with status: {} - {}", status, text.trim());
        }
        Ok(response)
    }
}
