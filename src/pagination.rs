use axum::http::header::{CONTENT_RANGE, HeaderMap, HeaderValue};

/// Builds the `Content-Range` header of a collection page.
///
/// # Arguments
///
/// * `offset` - Index of the first entity in the page.
/// * `count` - Number of entities in the page.
/// * `total_count` - Number of entities across all pages.
/// * `resource_name` - Unit of the range, usually the resource path.
///
/// An empty page is reported as `resource */total`. A resource name that is
/// not a valid header token yields no header.
#[must_use]
pub fn calculate_content_range(offset: u64, count: u64, total_count: u64, resource_name: &str) -> HeaderMap {
    let content_range = if count == 0 {
        format!("{resource_name} */{total_count}")
    } else {
        let last = offset.saturating_add(count - 1);
        format!("{resource_name} {offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&content_range) {
        Ok(value) => {
            headers.insert(CONTENT_RANGE, value);
        }
        Err(_) => tracing::warn!(resource = resource_name, "unrepresentable Content-Range skipped"),
    }
    headers
}
