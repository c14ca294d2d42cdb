use super::BrokerClient;
use anyhow::{Context, Result};
use reqwest::header;

pub(crate) trait UpdateServiceApi {
    /// Whether the update service uses the record fqdn as its HTTP Basic
    /// Auth username.
    async fn get_username_is_fqdn(&self, service_id: u32) -> Result<bool>;
}

impl UpdateServiceApi for BrokerClient {
    async fn get_username_is_fqdn(&self, service_id: u32) -> Result<bool> {
        if let Some(cached) = self.cached_username_is_fqdn(service_id) {
            tracing::debug!(service_id, cached, "usernameisfqdn served from cache");
            return Ok(cached);
        }

        let request = self
            .get(&format!("/updateservice/{service_id}/get/usernameisfqdn"))
            .header(header::ACCEPT, "application/json");
        let response = self.send(request).await?;

        let username_is_fqdn = response
            .json::<bool>()
            .await
            .context("Expected a JSON boolean")?;

        tracing::info!(service_id, username_is_fqdn, "usernameisfqdn fetched");
        self.cache_username_is_fqdn(service_id, username_is_fqdn);
        Ok(username_is_fqdn)
    }
}

impl BrokerClient {
    fn cached_username_is_fqdn(&self, service_id: u32) -> Option<bool> {
        self.username_is_fqdn_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&service_id).copied())
    }

    fn cache_username_is_fqdn(&self, service_id: u32, value: bool) {
        if let Ok(mut cache) = self.username_is_fqdn_cache.lock() {
            cache.insert(service_id, value);
        }
    }
}
