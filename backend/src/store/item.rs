//! Listing data model
//!
//! Defines items, their lifecycle status, and the caller context that every
//! store operation is checked against.

use super::error::StoreError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an item
pub type ItemId = Uuid;

/// Lifecycle status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet visible to buyers
    Draft,
    /// Live listing
    Published,
    /// Retired listing, cannot be published again
    Archived,
}

impl ItemStatus {
    /// Convert the status to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Published => "published",
            ItemStatus::Archived => "archived",
        }
    }

    /// Parse a stored status string
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "draft" => Ok(ItemStatus::Draft),
            "published" => Ok(ItemStatus::Published),
            "archived" => Ok(ItemStatus::Archived),
            other => Err(StoreError::Validation(format!(
                "Unknown item status: {}",
                other
            ))),
        }
    }
}

/// A listing in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Optional long description
    pub description: Option<String>,
    /// Price in currency units; items without a price are not discounted
    pub price: Option<f64>,
    /// Units in stock
    pub quantity: i64,
    /// Lifecycle status
    pub status: ItemStatus,
    /// Creation time (Unix timestamp)
    pub created_at: i64,
    /// Last modification time (Unix timestamp)
    pub updated_at: i64,
}

impl Item {
    /// Build a stored item from validated input
    pub fn from_new(new: NewItem) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4(),
            title: new.title.trim().to_string(),
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            status: new.status.unwrap_or(ItemStatus::Draft),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the item is still a draft
    pub fn is_draft(&self) -> bool {
        self.status == ItemStatus::Draft
    }
}

/// Input for creating an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display title (required, non-empty)
    pub title: String,
    /// Optional long description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional price
    #[serde(default)]
    pub price: Option<f64>,
    /// Units in stock
    #[serde(default)]
    pub quantity: i64,
    /// Initial status (defaults to draft)
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

impl NewItem {
    /// Create a draft item with a price and quantity
    pub fn draft(title: &str, price: f64, quantity: i64) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            price: Some(price),
            quantity,
            status: Some(ItemStatus::Draft),
        }
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Validation(
                "Item title cannot be empty".to_string(),
            ));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if self.quantity < 0 {
            return Err(StoreError::Validation(format!(
                "Quantity cannot be negative: {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Reject prices that are negative or not finite
pub fn validate_price(price: f64) -> Result<(), StoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::Validation(format!("Invalid price: {}", price)));
    }
    Ok(())
}

/// Identity of the caller performing a store operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreContext {
    /// Acting user
    pub actor: String,
}

impl StoreContext {
    /// Create a context for the given actor
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    /// Policy check applied by every store operation
    pub fn authorize(&self) -> Result<(), StoreError> {
        if self.actor.trim().is_empty() {
            return Err(StoreError::Forbidden(
                "store operations require an actor".to_string(),
            ));
        }
        Ok(())
    }
}

/// Demo listings seeded into an empty store
pub fn demo_items() -> Vec<NewItem> {
    vec![
        NewItem::draft("Vintage Leather Jacket", 150.00, 3),
        NewItem::draft("Mid-Century Walnut Desk", 500.00, 1),
        NewItem::draft("Handmade Oak Dining Table", 1000.00, 1),
        NewItem::draft("Ceramic Table Lamp", 75.00, 8),
        NewItem::draft("Linen Throw Pillow", 25.00, 20),
    ]
}
