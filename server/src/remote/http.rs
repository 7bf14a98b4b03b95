//! HTTP client for the upstream banner API.

use std::time::Duration;

use async_trait::async_trait;
use banner_engine::Item;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::{RemoteBannerStore, StoreError};
use crate::config::Config;

/// Talks to `{base_url}/banners`.
#[derive(Debug, Clone)]
pub struct HttpBannerStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBannerStore {
    /// Create a client with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(
            config.banner_api_url.clone(),
            config.banner_api_token.clone(),
            config.remote_timeout,
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into an error.
    ///
    /// 4xx means the API refused this item; anything else is a transport or
    /// server problem.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            return Err(StoreError::Rejected(format!("{status}: {body}")));
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RemoteBannerStore for HttpBannerStore {
    async fn update_banner(&self, item: Item) -> Result<Item, StoreError> {
        let url = format!("{}/banners/{}", self.base_url, item.id);
        tracing::debug!(id = %item.id, sort_order = item.sort_order, "PUT banner");

        let response = self
            .authorize(self.client.put(&url))
            .json(&item)
            .send()
            .await?;
        let response = Self::check(response).await?;

        // Some deployments acknowledge without echoing the banner
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(item);
        }
        Ok(response.json::<Item>().await?)
    }

    async fn list_banners(&self) -> Result<Vec<Item>, StoreError> {
        let url = format!("{}/banners", self.base_url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let items = Self::check(response).await?.json::<Vec<Item>>().await?;

        tracing::debug!(count = items.len(), "Fetched banners");
        Ok(items)
    }
}
