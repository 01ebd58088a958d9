pub mod builder;
pub mod config;
pub mod context;
pub mod errors;
pub mod executor;
mod extract;
pub mod models;
pub mod pagination;
pub mod params;
pub mod path;
pub mod query;
pub mod query_parser;
pub mod redundant;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;

pub use builder::QueryBuilder;
pub use config::{LimitConfig, QueryKeys, RestConfig};
pub use context::{ContextRegistry, FilterContext, SortContext, WithContext};
pub use errors::ApiError;
pub use executor::{Executor, SeaOrmExecutor};
pub use models::{CollectionPage, RestQueryParams};
pub use params::RequestParams;
pub use path::RelationPath;
pub use query::{FilterOperator, Select};
pub use query_parser::{FilterSet, ParsedParams};
pub use routes::{RestState, rest_routes};
pub use schema::{Catalog, EntityDef, RelationKind};
pub use service::QueryExecutor;
