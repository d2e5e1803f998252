//! In-memory item store
//!
//! Default store used when no database is configured. Supports failure
//! injection so callers can exercise partial-failure paths.

use super::error::StoreError;
use super::item::{validate_price, Item, ItemId, ItemStatus, NewItem, StoreContext};
use super::ItemStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Item store backed by a vector in insertion order
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<Item>>,
    failing_ids: RwLock<HashSet<ItemId>>,
    fail_list: RwLock<bool>,
}

impl InMemoryItemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every mutation of `id` fail with [`StoreError::Injected`]
    pub async fn fail_on(&self, id: ItemId) {
        self.failing_ids.write().await.insert(id);
    }

    /// Make [`ItemStore::list`] fail
    pub async fn fail_list(&self) {
        *self.fail_list.write().await = true;
    }

    async fn check_injected(&self, id: ItemId) -> Result<(), StoreError> {
        if self.failing_ids.read().await.contains(&id) {
            return Err(StoreError::Injected(format!("mutation of {} rejected", id)));
        }
        Ok(())
    }

    async fn mutate<F>(&self, id: ItemId, apply: F) -> Result<Item, StoreError>
    where
        F: FnOnce(&mut Item) -> Result<(), StoreError> + Send,
    {
        self.check_injected(id).await?;
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply(item)?;
        item.updated_at = Utc::now().timestamp();
        Ok(item.clone())
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self, ctx: &StoreContext) -> Result<Vec<Item>, StoreError> {
        ctx.authorize()?;
        if *self.fail_list.read().await {
            return Err(StoreError::Injected("listing unavailable".to_string()));
        }
        Ok(self.items.read().await.clone())
    }

    async fn get(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError> {
        ctx.authorize()?;
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self, ctx: &StoreContext, new: NewItem) -> Result<Item, StoreError> {
        ctx.authorize()?;
        new.validate()?;
        let item = Item::from_new(new);
        debug!(item_id = %item.id, actor = %ctx.actor, "Created item");
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn update_price(
        &self,
        ctx: &StoreContext,
        id: ItemId,
        price: f64,
    ) -> Result<Item, StoreError> {
        ctx.authorize()?;
        validate_price(price)?;
        self.mutate(id, |item| {
            item.price = Some(price);
            Ok(())
        })
        .await
    }

    async fn publish(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError> {
        ctx.authorize()?;
        self.mutate(id, |item| match item.status {
            ItemStatus::Archived => Err(StoreError::InvalidState(format!(
                "archived item {} cannot be published",
                item.id
            ))),
            _ => {
                item.status = ItemStatus::Published;
                Ok(())
            }
        })
        .await
    }
}
