//! A service for interacting with items.
//!
//! Each operation is one storage round trip (update is a load followed by a
//! save). Nothing is retried: storage errors reach the caller unchanged.

use super::item_repository::{Item, ItemGateway, NewItem, StorageError};
use crate::infra::{logging::Log, validation::Valid};
use std::{fmt, sync::Arc};
use tracing::instrument;

/// Something went wrong while handling items.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// There is no item with the given id.
    #[error("item {0} not found")]
    NotFound(i64),
    /// The storage gateway failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// The result of an item operation.
pub type ItemResult<T> = Result<T, ItemError>;

/// Creates, reads, updates and deletes items.
#[derive(Clone)]
pub struct ItemService {
    gateway: Arc<dyn ItemGateway>,
    log: Arc<dyn Log>,
}

impl fmt::Debug for ItemService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemService").finish_non_exhaustive()
    }
}

impl ItemService {
    /// Constructs a service on top of a storage gateway.
    pub fn new(gateway: Arc<dyn ItemGateway>, log: Arc<dyn Log>) -> Self {
        Self { gateway, log }
    }

    /// Logs the outcome of an operation at info or error level.
    fn outcome<T>(
        &self,
        result: ItemResult<T>,
        success: impl FnOnce(&T) -> String,
    ) -> ItemResult<T> {
        match &result {
            Ok(value) => self.log.info(&success(value)),
            Err(e) => self.log.error(&e.to_string()),
        }
        result
    }

    /// Creates a new item.
    #[instrument(skip(self))]
    pub async fn create_item(&self, new_item: Valid<NewItem>) -> ItemResult<Item> {
        self.log.debug(&format!("Creating item {:?}", new_item.inner()));
        let result = self
            .gateway
            .create(new_item.into_inner())
            .await
            .map_err(ItemError::from);
        self.outcome(result, |item| format!("Created item {}", item.id))
    }

    /// Lists all items.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> ItemResult<Vec<Item>> {
        self.log.debug("Listing items");
        let result = self.gateway.find_all().await.map_err(ItemError::from);
        self.outcome(result, |items| format!("Listed {} items", items.len()))
    }

    /// Reads an item.
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i64) -> ItemResult<Item> {
        self.log.debug(&format!("Fetching item {id}"));
        let result = self.find(id).await;
        self.outcome(result, |item| format!("Fetched item {}", item.id))
    }

    /// Overwrites the name and price of an item.
    #[instrument(skip(self))]
    pub async fn update_item(&self, id: i64, patch: Valid<NewItem>) -> ItemResult<Item> {
        self.log.debug(&format!("Updating item {id}"));
        let result = self.update(id, patch.into_inner()).await;
        self.outcome(result, |item| format!("Updated item {}", item.id))
    }

    /// Deletes an item.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64) -> ItemResult<()> {
        self.log.debug(&format!("Deleting item {id}"));
        let result = match self.gateway.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ItemError::NotFound(id)),
            Err(e) => Err(e.into()),
        };
        self.outcome(result, |_| format!("Deleted item {id}"))
    }

    async fn find(&self, id: i64) -> ItemResult<Item> {
        self.gateway
            .find_by_id(id)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    async fn update(&self, id: i64, patch: NewItem) -> ItemResult<Item> {
        let mut item = self.find(id).await?;
        item.name = patch.name;
        item.price = patch.price;
        // The row may have been deleted since it was loaded.
        self.gateway
            .save(item)
            .await?
            .ok_or(ItemError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::item::item_repository::{InMemoryItemRepository, MockItemGateway},
        infra::logging::MemoryLog,
    };
    use chrono::Utc;
    use mockall::predicate::eq;
    use tracing::Level;

    fn new_item(name: &str, price: f64) -> Valid<NewItem> {
        Valid::new(NewItem {
            name: name.to_string(),
            price,
        })
        .unwrap()
    }

    fn in_memory() -> (ItemService, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let service = ItemService::new(Arc::new(InMemoryItemRepository::new()), log.clone());
        (service, log)
    }

    fn mocked(gateway: MockItemGateway) -> (ItemService, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        (ItemService::new(Arc::new(gateway), log.clone()), log)
    }

    fn broken() -> StorageError {
        StorageError::Other("connection refused".to_string())
    }

    #[tokio::test]
    async fn create_then_get_returns_the_same_item() {
        let (service, _) = in_memory();
        let created = service.create_item(new_item("Pen", 1.5)).await.unwrap();
        let fetched = service.get_item(created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!("Pen", fetched.name);
        assert_eq!(1.5, fetched.price);
    }

    #[tokio::test]
    async fn list_returns_every_created_item() {
        let (service, _) = in_memory();
        service.create_item(new_item("Pen", 1.5)).await.unwrap();
        service.create_item(new_item("Book", 12.0)).await.unwrap();
        let mut items: Vec<(String, f64)> = service
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|item| (item.name, item.price))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            vec![("Book".to_string(), 12.0), ("Pen".to_string(), 1.5)],
            items
        );
    }

    #[tokio::test]
    async fn missing_items_are_not_found() {
        let (service, _) = in_memory();
        assert!(matches!(
            service.get_item(9).await,
            Err(ItemError::NotFound(9))
        ));
        assert!(matches!(
            service.update_item(9, new_item("Pen", 1.0)).await,
            Err(ItemError::NotFound(9))
        ));
        assert!(matches!(
            service.delete_item(9).await,
            Err(ItemError::NotFound(9))
        ));
    }

    #[tokio::test]
    async fn update_overwrites_only_name_and_price() {
        let (service, _) = in_memory();
        let created = service.create_item(new_item("Pen", 1.5)).await.unwrap();
        let updated = service
            .update_item(created.id, new_item("Pencil", 0.75))
            .await
            .unwrap();
        assert_eq!(
            Item {
                name: "Pencil".to_string(),
                price: 0.75,
                ..created.clone()
            },
            updated
        );
        assert_eq!(updated, service.get_item(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleted_items_are_gone() {
        let (service, _) = in_memory();
        let created = service.create_item(new_item("Pen", 1.5)).await.unwrap();
        service.delete_item(created.id).await.unwrap();
        assert!(matches!(
            service.get_item(created.id).await,
            Err(ItemError::NotFound(_))
        ));
        assert!(service.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_are_propagated() {
        let mut gateway = MockItemGateway::new();
        gateway
            .expect_create()
            .times(1)
            .returning(|_| Err(broken()));
        gateway
            .expect_find_all()
            .times(1)
            .returning(|| Err(broken()));
        gateway
            .expect_find_by_id()
            .times(2)
            .returning(|_| Err(broken()));
        gateway
            .expect_delete()
            .times(1)
            .returning(|_| Err(broken()));
        let (service, _) = mocked(gateway);

        let storage = |r: ItemResult<()>| matches!(r, Err(ItemError::Storage(_)));
        assert!(storage(service.create_item(new_item("Pen", 1.5)).await.map(drop)));
        assert!(storage(service.list_items().await.map(drop)));
        assert!(storage(service.get_item(1).await.map(drop)));
        assert!(storage(service.update_item(1, new_item("Pen", 1.5)).await.map(drop)));
        assert!(storage(service.delete_item(1).await));
    }

    #[tokio::test]
    async fn update_saves_the_loaded_item_with_new_fields() {
        let existing = Item {
            id: 3,
            name: "Pen".to_string(),
            price: 1.5,
            created_at: Utc::now(),
        };
        let expected = Item {
            name: "Marker".to_string(),
            price: 2.0,
            ..existing.clone()
        };
        let mut gateway = MockItemGateway::new();
        let loaded = existing.clone();
        gateway
            .expect_find_by_id()
            .with(eq(3))
            .times(1)
            .returning(move |_| Ok(Some(loaded.clone())));
        gateway
            .expect_save()
            .with(eq(expected.clone()))
            .times(1)
            .returning(|item| Ok(Some(item)));
        let (service, _) = mocked(gateway);

        let updated = service.update_item(3, new_item("Marker", 2.0)).await.unwrap();
        assert_eq!(expected, updated);
    }

    #[tokio::test]
    async fn update_of_item_deleted_meanwhile_is_not_found() {
        let mut gateway = MockItemGateway::new();
        gateway.expect_find_by_id().returning(|id| {
            Ok(Some(Item {
                id,
                name: "Pen".to_string(),
                price: 1.5,
                created_at: Utc::now(),
            }))
        });
        gateway.expect_save().returning(|_| Ok(None));
        let (service, _) = mocked(gateway);
        assert!(matches!(
            service.update_item(5, new_item("Pen", 1.0)).await,
            Err(ItemError::NotFound(5))
        ));
    }

    #[tokio::test]
    async fn operations_log_before_and_after() {
        let (service, log) = in_memory();
        let created = service.create_item(new_item("Pen", 1.5)).await.unwrap();
        let missing = created.id + 1;
        service.list_items().await.unwrap();
        service.get_item(created.id).await.unwrap();
        let _ = service.get_item(missing).await;
        service
            .update_item(created.id, new_item("Pencil", 0.5))
            .await
            .unwrap();
        let _ = service.update_item(missing, new_item("Pencil", 0.5)).await;
        service.delete_item(created.id).await.unwrap();
        let _ = service.delete_item(created.id).await;

        let expected = [
            (Level::DEBUG, format!("Creating item {:?}", new_item("Pen", 1.5).inner())),
            (Level::INFO, format!("Created item {}", created.id)),
            (Level::DEBUG, "Listing items".to_string()),
            (Level::INFO, "Listed 1 items".to_string()),
            (Level::DEBUG, format!("Fetching item {}", created.id)),
            (Level::INFO, format!("Fetched item {}", created.id)),
            (Level::DEBUG, format!("Fetching item {missing}")),
            (Level::ERROR, format!("item {missing} not found")),
            (Level::DEBUG, format!("Updating item {}", created.id)),
            (Level::INFO, format!("Updated item {}", created.id)),
            (Level::DEBUG, format!("Updating item {missing}")),
            (Level::ERROR, format!("item {missing} not found")),
            (Level::DEBUG, format!("Deleting item {}", created.id)),
            (Level::INFO, format!("Deleted item {}", created.id)),
            (Level::DEBUG, format!("Deleting item {}", created.id)),
            (Level::ERROR, format!("item {} not found", created.id)),
        ];
        assert_eq!(expected.to_vec(), log.entries());
    }

    #[tokio::test]
    async fn storage_failures_are_logged_as_errors() {
        let mut gateway = MockItemGateway::new();
        gateway.expect_find_all().returning(|| Err(broken()));
        let (service, log) = mocked(gateway);
        let _ = service.list_items().await;
        assert_eq!(
            vec![
                (Level::DEBUG, "Listing items".to_string()),
                (Level::ERROR, "storage failure: connection refused".to_string()),
            ],
            log.entries()
        );
    }
}
