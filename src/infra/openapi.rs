//! OpenAPI configuration.

use crate::feature::item::{item_api, item_repository};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    info(title = "Item CRUD API", description = "Create, read, update and delete items."),
    paths(
        item_api::create_item,
        item_api::list_items,
        item_api::get_item,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            item_repository::NewItem,
            item_repository::Item,
            crate::infra::error::ErrorBody
        )
    ),
    tags((name = "items", description = "Item management"))
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;
