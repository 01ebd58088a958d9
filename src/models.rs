use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Query parameters understood by every resource.
///
/// Elements apply to the requested entity unless prefixed with a relation
/// path: `fields=first_name,messages.content` selects `first_name` at the
/// root and `content` on the included `messages`, and `limit=5,messages.3`
/// limits both levels.
///
/// # Fields
/// A comma separated list of attributes, for example `first_name,last_name`.
/// The primary key is always read but only returned when requested.
///
/// # Filtering
/// A comma separated list of filter operations, each optionally followed by
/// a bracketed argument list:
/// ```text
/// name:[John],created_between:["2016-01-01","2016-01-31"],active
/// ```
/// Quoted arguments may contain commas and brackets; `\"` and `\\` escape
/// inside quotes.
///
/// # Sorting
/// A comma separated list of sort operations such as `last_name_desc,oldest`.
/// Earlier entries take precedence.
///
/// # Relations
/// `with` lists relations to include, dot separated for nested ones:
/// `messages,messages.recipient`.
///
/// # Pagination
/// `limit` is clamped into `[1, maximum]` and `offset` is floored at zero.
/// Values are read up to the first non digit, so `abc` reads as zero; a
/// bare `0` counts as absent and falls back to the server default.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct RestQueryParams {
    /// Attributes to return.
    #[param(example = "first_name,last_name")]
    pub fields: Option<String>,
    /// Filter operations with their arguments.
    #[param(example = "last_name:[Smith],created_between:[\"2016-01-01\",\"2016-01-31\"]")]
    pub filter: Option<String>,
    /// Sort operations, most significant first.
    #[param(example = "last_name_desc,latest")]
    pub sort: Option<String>,
    /// Relations to include.
    #[param(example = "messages,messages.recipient")]
    pub with: Option<String>,
    /// Maximum number of entities.
    #[param(example = "10")]
    pub limit: Option<String>,
    /// Number of entities to skip.
    #[param(example = "0")]
    pub offset: Option<String>,
}

/// One page of a collection.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionPage {
    /// Entities in this page.
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
    /// Entities matching the filters across all pages.
    pub total: u64,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
}
