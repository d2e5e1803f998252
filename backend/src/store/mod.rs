//! Item store
//!
//! The listing store the orchestrator reads from (specialists) and mutates
//! (plan executor). Every operation takes an explicit [`StoreContext`]
//! naming the acting user; nothing is looked up from ambient state.

pub mod error;
pub mod item;
pub mod memory;
pub mod sqlite;

pub use error::StoreError;
pub use item::{demo_items, Item, ItemId, ItemStatus, NewItem, StoreContext};
pub use memory::InMemoryItemStore;
pub use sqlite::SqliteItemStore;

use async_trait::async_trait;

/// Storage backend for listings
///
/// Implementations must return items from [`ItemStore::list`] in creation
/// order so that specialists see a stable listing order.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// List all items in creation order
    async fn list(&self, ctx: &StoreContext) -> Result<Vec<Item>, StoreError>;

    /// Fetch a single item
    async fn get(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError>;

    /// Create a new item
    async fn create(&self, ctx: &StoreContext, item: NewItem) -> Result<Item, StoreError>;

    /// Set the price of an item
    async fn update_price(
        &self,
        ctx: &StoreContext,
        id: ItemId,
        price: f64,
    ) -> Result<Item, StoreError>;

    /// Mark an item as published
    ///
    /// Publishing an already published item is a no-op; archived items
    /// cannot be published.
    async fn publish(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError>;
}

/// Create every item from `items` in order
///
/// Used at startup to seed an empty store with demo listings.
pub async fn seed(
    store: &dyn ItemStore,
    ctx: &StoreContext,
    items: Vec<NewItem>,
) -> Result<usize, StoreError> {
    let mut count = 0;
    for item in items {
        store.create(ctx, item).await?;
        count += 1;
    }
    Ok(count)
}
