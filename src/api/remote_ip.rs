use super::BrokerClient;
use crate::form::record::normalize_ip;
use anyhow::{Context, Result};

pub(crate) trait RemoteIpApi {
    /// The address the broker sees this client connecting from.
    async fn get_remote_ip(&self) -> Result<String>;
}

impl RemoteIpApi for BrokerClient {
    async fn get_remote_ip(&self) -> Result<String> {
        let response = self.send(self.get("/myip")).await?;
        let text = response
            .text()
            .await
            .context("Failed to get response text")?;
        Ok(normalize_ip(&text))
    }
}
