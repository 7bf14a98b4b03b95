//! In-memory banner store with fault injection, for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use banner_engine::{Item, ItemId};
use dashmap::{DashMap, DashSet};
use tokio::sync::watch;

use super::{RemoteBannerStore, StoreError};

/// Stores banners in a map. Writes can be made to fail per item, or held
/// in flight until released.
#[derive(Debug)]
pub struct MemoryBannerStore {
    items: DashMap<ItemId, Item>,
    failing: DashSet<ItemId>,
    attempts: AtomicUsize,
    open: watch::Sender<bool>,
}

impl MemoryBannerStore {
    /// Create a store holding `items`.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let (open, _) = watch::channel(true);
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            failing: DashSet::new(),
            attempts: AtomicUsize::new(0),
            open,
        }
    }

    /// Make every write to `id` fail.
    pub fn fail_writes_for(&self, id: impl Into<ItemId>) {
        self.failing.insert(id.into());
    }

    /// Stop failing writes.
    pub fn clear_failures(&self) {
        self.failing.clear();
    }

    /// Keep subsequent writes in flight until [`MemoryBannerStore::release`].
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    /// Let held writes complete.
    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Number of `update_banner` calls received, including failed ones.
    pub fn write_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Stored version of a banner.
    pub fn get(&self, id: &str) -> Option<Item> {
        self.items.get(id).map(|i| i.clone())
    }
}

#[async_trait]
impl RemoteBannerStore for MemoryBannerStore {
    async fn update_banner(&self, item: Item) -> Result<Item, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        if self.failing.contains(&item.id) {
            return Err(StoreError::Rejected(format!("{} refused", item.id)));
        }

        self.items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn list_banners(&self) -> Result<Vec<Item>, StoreError> {
        let mut items: Vec<Item> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}
