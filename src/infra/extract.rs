//! Custom axum extractors.

use super::error::ApiError;
use axum::{extract::FromRequest, response::IntoResponse};
use serde::Serialize;

/// A custom JSON extractor since axum's does not let us customize the response.
///
/// Rejections are turned into an [`ApiError`], so a malformed body gets the
/// same error body as every other client error.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T> AsRef<T> for Json<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}
