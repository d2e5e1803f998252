//! SQLite item store
//!
//! Persists listings with sqlx. Selected at startup when `DATABASE_URL`
//! is set.

use super::error::StoreError;
use super::item::{validate_price, Item, ItemId, ItemStatus, NewItem, StoreContext};
use super::ItemStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const ITEM_COLUMNS: &str =
    "id, title, description, price, quantity, status, created_at, updated_at";

/// Raw row as stored in SQLite
#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    title: String,
    description: Option<String>,
    price: Option<f64>,
    quantity: i64,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StoreError::Validation(format!("Corrupt item id '{}': {}", row.id, e)))?;
        Ok(Item {
            id,
            title: row.title,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            status: ItemStatus::parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Pool settings for a file or in-memory database
///
/// An in-memory database lives only as long as its one connection, so
/// that connection is never reaped.
fn pool_options(in_memory: bool) -> SqlitePoolOptions {
    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

/// Item store backed by a SQLite connection pool
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    /// Open (or create) the database and run migrations
    ///
    /// # Arguments
    /// * `db_path` - File path or `sqlite:` URL; `sqlite::memory:` keeps a
    ///   single connection so all queries see the same database
    pub async fn connect(db_path: &str) -> Result<Self, StoreError> {
        let in_memory = db_path.contains(":memory:");

        if !in_memory && !db_path.starts_with("sqlite:") {
            if let Some(parent) = PathBuf::from(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::Validation(format!("Failed to create db directory: {}", e))
                    })?;
                }
            }
        }

        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);

        let pool = pool_options(in_memory).connect_with(options).await?;

        info!("Connected to SQLite item store at: {}", db_path);

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let migration_sql = include_str!("../../migrations/001_create_items.sql");

        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(pos) => &trimmed[..pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        for statement in cleaned_sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("Item store migrations completed");
        Ok(())
    }

    async fn fetch(&self, id: ItemId) -> Result<Item, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = ?",
            ITEM_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        row.try_into()
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn list(&self, ctx: &StoreContext) -> Result<Vec<Item>, StoreError> {
        ctx.authorize()?;
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items ORDER BY position ASC",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    async fn get(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError> {
        ctx.authorize()?;
        self.fetch(id).await
    }

    async fn create(&self, ctx: &StoreContext, new: NewItem) -> Result<Item, StoreError> {
        ctx.authorize()?;
        new.validate()?;
        let item = Item::from_new(new);
        sqlx::query(
            "INSERT INTO items (id, title, description, price, quantity, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(item_id = %item.id, actor = %ctx.actor, "Created item");
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
        let result = sqlx::query("UPDATE items SET price = ?, updated_at = ? WHERE id = ?")
            .bind(price)
            .bind(Utc::now().timestamp())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.fetch(id).await
    }

    async fn publish(&self, ctx: &StoreContext, id: ItemId) -> Result<Item, StoreError> {
        ctx.authorize()?;
        let item = self.fetch(id).await?;
        match item.status {
            ItemStatus::Published => Ok(item),
            ItemStatus::Archived => Err(StoreError::InvalidState(format!(
                "archived item {} cannot be published",
                id
            ))),
            ItemStatus::Draft => {
                sqlx::query("UPDATE items SET status = ?, updated_at = ? WHERE id = ?")
                    .bind(ItemStatus::Published.as_str())
                    .bind(Utc::now().timestamp())
                    .bind(id.to_string())
                    .execute(&self.pool)
                    .await?;
                self.fetch(id).await
            }
        }
    }
}
