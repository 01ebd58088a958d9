//! Read-only REST endpoints over every entity in a [`Catalog`].
//!
//! ```rust,ignore
//! let state = RestState::new(SeaOrmExecutor::new(db), catalog, contexts)
//!     .with_defaults("users", ParsedParams::from_pairs([("sort", "last_name")], &keys));
//! let app = Router::new().merge(rest_routes(state));
//! ```

use crate::config::RestConfig;
use crate::context::ContextRegistry;
use crate::errors::ApiError;
use crate::executor::Executor;
use crate::params::RequestParams;
use crate::query::Select;
use crate::query_parser::ParsedParams;
use crate::response;
use crate::schema::{Catalog, EntityDef};
use crate::service::QueryExecutor;
use axum::Router;
use axum::extract::{FromRef, Path, State};
use axum::response::Response;
use axum::routing::get;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct RestState {
    pub executor: Arc<dyn Executor>,
    pub catalog: Arc<Catalog>,
    pub contexts: Arc<ContextRegistry>,
    pub config: Arc<RestConfig>,
    defaults: Arc<HashMap<String, ParsedParams>>,
}

impl RestState {
    pub fn new(executor: impl Executor + 'static, catalog: Catalog, contexts: ContextRegistry) -> Self {
        Self {
            executor: Arc::new(executor),
            catalog: Arc::new(catalog),
            contexts: Arc::new(contexts),
            config: Arc::new(RestConfig::default()),
            defaults: Arc::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RestConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Parameters used for `entity` wherever a request is silent.
    #[must_use]
    pub fn with_defaults(mut self, entity: impl Into<String>, defaults: ParsedParams) -> Self {
        Arc::make_mut(&mut self.defaults).insert(entity.into(), defaults);
        self
    }

    fn entity(&self, resource: &str) -> Result<&EntityDef, ApiError> {
        self.catalog
            .get(resource)
            .map(Arc::as_ref)
            .ok_or_else(|| ApiError::not_found(resource, None))
    }

    fn scoped(&self, params: RequestParams, resource: &str) -> RequestParams {
        match self.defaults.get(resource) {
            Some(defaults) => params.with_defaults(defaults.clone()),
            None => params,
        }
    }
}

impl FromRef<RestState> for Arc<RestConfig> {
    fn from_ref(state: &RestState) -> Self {
        Arc::clone(&state.config)
    }
}

/// `GET /{resource}` and `GET /{resource}/{id}`.
pub fn rest_routes(state: RestState) -> Router {
    Router::new()
        .route("/{resource}", get(get_collection))
        .route("/{resource}/{id}", get(get_item))
        .with_state(state)
}

async fn get_collection(
    State(state): State<RestState>,
    Path(resource): Path<String>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    let def = state.entity(&resource)?;
    let params = state.scoped(params, &resource);

    let page = QueryExecutor::new(&params, &state.contexts, &state.catalog)
        .collection(Select::from_entity(def), state.executor.as_ref())
        .await?;
    Ok(response::collection(&resource, page))
}

async fn get_item(
    State(state): State<RestState>,
    Path((resource, id)): Path<(String, String)>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    let def = state.entity(&resource)?;
    let params = state.scoped(params, &resource);

    let mut select = Select::from_entity(def);
    select.where_eq(def.primary_key.as_str(), key_value(&id));

    let item = QueryExecutor::new(&params, &state.contexts, &state.catalog)
        .item(select, state.executor.as_ref())
        .await
        .map_err(|err| match err {
            ApiError::NotFound { resource, .. } => ApiError::not_found(resource, Some(id)),
            other => other,
        })?;
    Ok(response::item(item))
}

/// Integer keys compare as numbers, anything else as text.
fn key_value(id: &str) -> Value {
    id.parse::<i64>().map_or_else(|_| Value::from(id), Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value() {
        assert_eq!(key_value("42"), Value::from(42));
        assert_eq!(key_value("-1"), Value::from(-1));
        assert_eq!(key_value("abc-1"), Value::from("abc-1"));
    }
}
