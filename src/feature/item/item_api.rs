//! The item API implementation.

use crate::{
    feature::item::{
        item_repository::{Item, NewItem},
        item_service::ItemService,
    },
    infra::{
        error::{ApiResult, ClientError},
        extract::Json,
        state::AppState,
        validation::Valid,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::StatusCode;
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::instrument;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_item)
        .typed_get(list_items)
        .typed_get(get_item)
        .typed_put(update_item)
        .typed_delete(delete_item)
}

/// The item collection.
#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items", rejection(ClientError))]
pub struct Items;

/// A single item.
#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id", rejection(ClientError))]
pub struct ItemsId(ItemId);

impl ItemsId {
    fn id(&self) -> i64 {
        i64::from(self.0 .0)
    }
}

/// An item id as written in a path: plain decimal digits that fit in 32 bits.
///
/// Signs are rejected, which `u32`'s own parser would let through as `+1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemId(u32);

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(serde::de::Error::custom(format!("invalid item id: {raw}")));
        }
        raw.parse()
            .map(ItemId)
            .map_err(|e| serde::de::Error::custom(format!("invalid item id {raw}: {e}")))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = NewItem,
    responses(
        (status = 201, description = "Created", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn create_item(
    Items: Items,
    State(items): State<ItemService>,
    new_item: Valid<NewItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = items.create_item(new_item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Lists all items.
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    responses(
        (status = 200, description = "Success", body = [Item]),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn list_items(
    Items: Items,
    State(items): State<ItemService>,
) -> ApiResult<Json<Vec<Item>>> {
    let items = items.list_items().await?;
    Ok(Json(items))
}

/// Gets an item.
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(("id" = u32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn get_item(path: ItemsId, State(items): State<ItemService>) -> ApiResult<Json<Item>> {
    let item = items.get_item(path.id()).await?;
    Ok(Json(item))
}

/// Replaces the name and price of an item.
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    params(("id" = u32, Path, description = "Item id")),
    request_body = NewItem,
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items, patch))]
pub async fn update_item(
    path: ItemsId,
    State(items): State<ItemService>,
    patch: Valid<NewItem>,
) -> ApiResult<Json<Item>> {
    let item = items.update_item(path.id(), patch).await?;
    Ok(Json(item))
}

/// Deletes an item.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(("id" = u32, Path, description = "Item id")),
    responses(
        (status = 204, description = "No Content"),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn delete_item(path: ItemsId, State(items): State<ItemService>) -> ApiResult<StatusCode> {
    items.delete_item(path.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
