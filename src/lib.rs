//! A small HTTP service for creating, reading, updating and deleting items.
//!
//! Requests flow from [`feature::item::item_api`] through
//! [`feature::item::item_service::ItemService`] to an
//! [`feature::item::item_repository::ItemGateway`], which is either
//! PostgreSQL or an in-memory table.

pub mod app;
pub mod feature;
pub mod infra;
