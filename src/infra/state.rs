//! Global application state.
//!
//! Used for access to common resources, which for now is just the item service.

use crate::feature::item::item_service::ItemService;
use axum::extract::FromRef;

/// Global application state.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    items: ItemService,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(items: ItemService) -> Self {
        Self { items }
    }

    /// Returns the item service.
    pub fn items(&self) -> &ItemService {
        &self.items
    }
}
