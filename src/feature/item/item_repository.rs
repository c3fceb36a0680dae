//! Types and functions for storing and loading items.
//!
//! [`ItemGateway`] is the only thing the service knows about storage. It has
//! two implementations: [`PgItemRepository`] on top of PostgreSQL and
//! [`InMemoryItemRepository`] for running without a database.
//!
//! Deletes are soft: the row stays, marked with a deletion time, and every
//! other operation treats it as absent.

use crate::infra::database::DbPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

/// A new item, or the new contents of an existing one.
///
/// Any name and any price are allowed; decoding the JSON is the only check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewItem {
    /// The item's name.
    #[schema(example = "Pen")]
    pub name: String,
    /// The item's price.
    #[schema(example = 1.5)]
    pub price: f64,
}

/// An existing item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Item {
    /// The item's id.
    #[schema(example = 1)]
    pub id: i64,
    /// The item's name.
    #[schema(example = "Pen")]
    pub name: String,
    /// The item's price.
    #[schema(example = 1.5)]
    pub price: f64,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
}

/// A failure in the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An [`sqlx`] error.
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    /// Any other storage failure.
    #[error("{0}")]
    Other(String),
}

/// The result of a storage operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// Anything that can store items.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ItemGateway: Send + Sync {
    /// Stores a new item and returns it with its assigned id.
    async fn create(&self, new_item: NewItem) -> StorageResult<Item>;

    /// Fetches an item, if it exists.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>>;

    /// Fetches all items, ordered by id.
    async fn find_all(&self) -> StorageResult<Vec<Item>>;

    /// Overwrites the name and price of an existing item.
    /// Returns `None` if there is no item with that id.
    async fn save(&self, item: Item) -> StorageResult<Option<Item>>;

    /// Deletes an item.
    /// Returns `false` if there was no item with that id.
    async fn delete(&self, id: i64) -> StorageResult<bool>;
}

/// An item repository backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgItemRepository {
    db: DbPool,
}

impl PgItemRepository {
    /// Creates a new repository.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ItemGateway for PgItemRepository {
    #[instrument(skip(self))]
    async fn create(&self, new_item: NewItem) -> StorageResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
                INSERT INTO items (name, price)
                VALUES ($1, $2)
                RETURNING id, name, price, created_at
            "#,
        )
        .bind(&new_item.name)
        .bind(new_item.price)
        .fetch_one(&self.db)
        .await?;
        tracing::debug!("Inserted item {}", item.id);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, price, created_at FROM items
                WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, price, created_at FROM items
                WHERE deleted_at IS NULL
                ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        tracing::debug!("Found {} items", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn save(&self, item: Item) -> StorageResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
                UPDATE items
                SET name = $2, price = $3, updated_at = now()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING id, name, price, created_at
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.price)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
                UPDATE items
                SET deleted_at = now()
                WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Debug)]
struct Row {
    item: Item,
    deleted_at: Option<DateTime<Utc>>,
}

impl Table {
    fn live_mut(&mut self, id: i64) -> Option<&mut Row> {
        self.rows.get_mut(&id).filter(|row| row.deleted_at.is_none())
    }
}

/// An item repository that lives in process memory.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    table: RwLock<Table>,
}

impl InMemoryItemRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ItemGateway for InMemoryItemRepository {
    async fn create(&self, new_item: NewItem) -> StorageResult<Item> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let item = Item {
            id: table.last_id,
            name: new_item.name,
            price: new_item.price,
            created_at: Utc::now(),
        };
        let row = Row {
            item: item.clone(),
            deleted_at: None,
        };
        table.rows.insert(item.id, row);
        Ok(item)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        let table = self.table.read().await;
        let item = table
            .rows
            .get(&id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.item.clone());
        Ok(item)
    }

    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        let table = self.table.read().await;
        let items = table
            .rows
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.item.clone())
            .collect();
        Ok(items)
    }

    async fn save(&self, item: Item) -> StorageResult<Option<Item>> {
        let mut table = self.table.write().await;
        let Some(row) = table.live_mut(item.id) else {
            return Ok(None);
        };
        row.item.name = item.name;
        row.item.price = item.price;
        Ok(Some(row.item.clone()))
    }

    async fn delete(&self, id: i64) -> StorageResult<bool> {
        let mut table = self.table.write().await;
        let Some(row) = table.live_mut(id) else {
            return Ok(false);
        };
        row.deleted_at = Some(Utc::now());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> NewItem {
        NewItem {
            name: "Pen".to_string(),
            price: 1.5,
        }
    }

    fn book() -> NewItem {
        NewItem {
            name: "Book".to_string(),
            price: 12.0,
        }
    }

    async fn exercise_gateway(repo: &dyn ItemGateway) {
        let pen = repo.create(pen()).await.unwrap();
        let book = repo.create(book()).await.unwrap();
        assert_ne!(pen.id, book.id);
        assert_eq!(Some(pen.clone()), repo.find_by_id(pen.id).await.unwrap());
        assert_eq!(vec![pen.clone(), book.clone()], repo.find_all().await.unwrap());

        let renamed = Item {
            name: "Pencil".to_string(),
            price: 0.5,
            ..pen.clone()
        };
        let saved = repo.save(renamed.clone()).await.unwrap().unwrap();
        assert_eq!(renamed, saved);

        assert!(repo.delete(pen.id).await.unwrap());
        assert!(!repo.delete(pen.id).await.unwrap());
        assert_eq!(None, repo.find_by_id(pen.id).await.unwrap());
        assert_eq!(None, repo.save(renamed).await.unwrap());
        assert_eq!(vec![book], repo.find_all().await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_repository_behaves_like_a_table() {
        exercise_gateway(&InMemoryItemRepository::new()).await;
    }

    #[tokio::test]
    async fn in_memory_ids_are_not_reused_after_delete() {
        let repo = InMemoryItemRepository::new();
        let first = repo.create(pen()).await.unwrap();
        repo.delete(first.id).await.unwrap();
        let second = repo.create(pen()).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn in_memory_missing_ids_are_absent() {
        let repo = InMemoryItemRepository::new();
        assert_eq!(None, repo.find_by_id(42).await.unwrap());
        assert!(!repo.delete(42).await.unwrap());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    async fn postgres_repository_behaves_like_a_table(db: DbPool) {
        exercise_gateway(&PgItemRepository::new(db)).await;
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    async fn postgres_soft_delete_keeps_the_row(db: DbPool) {
        let repo = PgItemRepository::new(db.clone());
        let item = repo.create(pen()).await.unwrap();
        repo.delete(item.id).await.unwrap();
        let (deleted,): (bool,) =
            sqlx::query_as("SELECT deleted_at IS NOT NULL FROM items WHERE id = $1")
                .bind(item.id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert!(deleted);
    }
}
