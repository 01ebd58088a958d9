//! Request-scoped parameter store.
//!
//! Every accessor resolves the request value first, then the server
//! defaults, then a built-in fallback. Nothing here returns an absent value.

use crate::config::RestConfig;
use crate::path::RelationPath;
use crate::query_parser::{EMPTY_FILTERS, FilterSet, ParsedParams};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RequestParams {
    request: ParsedParams,
    defaults: ParsedParams,
    config: Arc<RestConfig>,
}

impl RequestParams {
    #[must_use]
    pub fn new(request: ParsedParams, config: Arc<RestConfig>) -> Self {
        Self {
            request,
            defaults: ParsedParams::default(),
            config,
        }
    }

    /// Parses `(name, value)` query pairs using the configured parameter names.
    pub fn from_pairs<I, K, V>(pairs: I, config: Arc<RestConfig>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = ParsedParams::from_pairs(pairs, &config.keys);
        Self::new(request, config)
    }

    /// Server-supplied values used wherever the request is silent.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ParsedParams) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    #[must_use]
    pub fn fields(&self, path: &RelationPath) -> &[String] {
        self.request
            .fields
            .get(path)
            .or_else(|| self.defaults.fields.get(path))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn filters(&self, path: &RelationPath) -> &FilterSet {
        self.request
            .filter
            .get(path)
            .or_else(|| self.defaults.filter.get(path))
            .unwrap_or(&EMPTY_FILTERS)
    }

    #[must_use]
    pub fn sort(&self, path: &RelationPath) -> &[String] {
        self.request
            .sort
            .get(path)
            .or_else(|| self.defaults.sort.get(path))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Relation paths to include, root level only.
    #[must_use]
    pub fn with(&self) -> &[String] {
        if self.request.with.is_empty() {
            &self.defaults.with
        } else {
            &self.request.with
        }
    }

    /// Limit for `path`, clamped into `[1, rest.limit.maxValue]`.
    #[must_use]
    pub fn limit(&self, path: &RelationPath) -> u64 {
        let value = self
            .request
            .limit
            .get(path)
            .or_else(|| self.defaults.limit.get(path))
            .copied()
            .unwrap_or(self.config.limit.default);

        let max = self.config.limit.max_value.max(1);
        value.clamp(1, max).unsigned_abs()
    }

    /// Offset for `path`, floored at 0 with no upper bound.
    #[must_use]
    pub fn offset(&self, path: &RelationPath) -> u64 {
        self.request
            .offset
            .get(path)
            .or_else(|| self.defaults.offset.get(path))
            .copied()
            .unwrap_or(0)
            .max(0)
            .unsigned_abs()
    }
}
