use crate::config::RestConfig;
use crate::errors::ApiError;
use crate::params::RequestParams;
use axum::extract::{FromRef, FromRequestParts, Query};
use axum::http::request::Parts;
use std::sync::Arc;

/// Reads [`RequestParams`] from the query string with the parameter names
/// of the state's [`RestConfig`].
impl<S> FromRequestParts<S> for RequestParams
where
    Arc<RestConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<RestConfig>::from_ref(state);
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self::from_pairs(pairs, config))
    }
}
