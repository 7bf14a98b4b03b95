//! The remote banner store.
//!
//! The only persistence the service has is an upstream API offering a single
//! idempotent "update one banner" call (plus a listing used to refetch).
//! There is no batch or transactional variant.

mod http;
#[cfg(test)]
mod memory;

pub use http::HttpBannerStore;
#[cfg(test)]
pub use memory::MemoryBannerStore;

use async_trait::async_trait;
use banner_engine::Item;

/// Errors from the remote store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Upstream banner persistence.
#[async_trait]
pub trait RemoteBannerStore: Send + Sync {
    /// Upsert one banner and return the stored version.
    async fn update_banner(&self, item: Item) -> Result<Item, StoreError>;

    /// Fetch every banner, active and inactive.
    async fn list_banners(&self) -> Result<Vec<Item>, StoreError>;
}
