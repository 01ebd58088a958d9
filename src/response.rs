//! Status conventions for REST responses.

use crate::models::CollectionPage;
use crate::pagination::calculate_content_range;
use axum::Json;
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// A single entity, `200 OK`.
#[must_use]
pub fn item(data: Value) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// A page of entities, `206 Partial Content` with a `Content-Range` header
/// for `resource`.
#[must_use]
pub fn collection(resource: &str, page: CollectionPage) -> Response {
    let headers = calculate_content_range(page.offset, page.count, page.total, resource);
    (StatusCode::PARTIAL_CONTENT, headers, Json(page)).into_response()
}

/// `201 Created`, with a `Location` header when `location` is given.
#[must_use]
pub fn created(data: Value, location: Option<&str>) -> Response {
    let mut response = (StatusCode::CREATED, Json(data)).into_response();
    if let Some(location) = location {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                response.headers_mut().insert(LOCATION, value);
            }
            Err(_) => tracing::warn!(location, "invalid Location header skipped"),
        }
    }
    response
}

#[must_use]
pub fn accepted() -> Response {
    StatusCode::ACCEPTED.into_response()
}

#[must_use]
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[must_use]
pub fn deleted() -> Response {
    no_content()
}

/// `200 OK`, with the entity when one is given.
#[must_use]
pub fn updated(data: Option<Value>) -> Response {
    match data {
        Some(data) => item(data),
        None => StatusCode::OK.into_response(),
    }
}

#[must_use]
pub fn patched(data: Option<Value>) -> Response {
    updated(data)
}
