use super::handlers::{FilterContext, SortContext, WithEntry};
use super::naming::operation_key;
use crate::query::Select;
use std::collections::HashMap;

/// Per entity type, the ordered handler lists for filtering, sorting and
/// relation inclusion.
///
/// Built once with [`ContextRegistry::builder`] and read-only afterwards, so
/// it can be shared between requests behind an `Arc`. Every lookup is first
/// match wins: the earliest registered handler exposing the operation
/// decides and later handlers are never consulted.
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    filter: HashMap<String, Vec<FilterContext>>,
    sort: HashMap<String, Vec<SortContext>>,
    with: HashMap<String, Vec<WithEntry>>,
}

#[derive(Debug, Default)]
pub struct ContextRegistryBuilder {
    registry: ContextRegistry,
}

impl ContextRegistryBuilder {
    /// Sets the filter handlers of `entity`, replacing earlier ones.
    #[must_use]
    pub fn filter(mut self, entity: &str, contexts: impl Into<Vec<FilterContext>>) -> Self {
        self.registry.filter.insert(entity.to_string(), contexts.into());
        self
    }

    /// Sets the sort handlers of `entity`, replacing earlier ones.
    #[must_use]
    pub fn sort(mut self, entity: &str, contexts: impl Into<Vec<SortContext>>) -> Self {
        self.registry.sort.insert(entity.to_string(), contexts.into());
        self
    }

    /// Sets the relation-inclusion list of `entity`, replacing earlier ones.
    /// Entries are relation paths (`"messages"`) or [`WithContext`](super::WithContext)
    /// handlers.
    #[must_use]
    pub fn with<I>(mut self, entity: &str, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WithEntry>,
    {
        let entries = entries.into_iter().map(Into::into).collect();
        self.registry.with.insert(entity.to_string(), entries);
        self
    }

    #[must_use]
    pub fn build(self) -> ContextRegistry {
        self.registry
    }
}

impl ContextRegistry {
    #[must_use]
    pub fn builder() -> ContextRegistryBuilder {
        ContextRegistryBuilder::default()
    }

    /// Applies filter `name` to `query` using the handlers of the query's
    /// entity type.
    ///
    /// Unknown entity types and names are ignored, as are calls with fewer
    /// arguments than the operation takes. Returns whether a handler ran.
    pub fn apply_filter(&self, query: &mut Select, name: &str, args: &[String]) -> bool {
        let key = operation_key(name);
        let Some(contexts) = self.filter.get(query.entity_type()) else {
            tracing::debug!(entity = query.entity_type(), filter = name, "no filter context");
            return false;
        };

        let Some(operation) = contexts.iter().find_map(|context| context.get(&key)) else {
            tracing::debug!(entity = query.entity_type(), filter = name, "unknown filter ignored");
            return false;
        };

        let applied = operation.call(query, args);
        if applied {
            tracing::debug!(entity = query.entity_type(), filter = name, args = ?args, "filter applied");
        } else {
            tracing::debug!(
                entity = query.entity_type(),
                filter = name,
                expected = operation.arity(),
                given = args.len(),
                "filter skipped, missing arguments"
            );
        }
        applied
    }

    /// Applies sort `name` to `query`. Unknown names are ignored.
    pub fn apply_sort(&self, query: &mut Select, name: &str) -> bool {
        let key = operation_key(name);
        let operation = self
            .sort
            .get(query.entity_type())
            .and_then(|contexts| contexts.iter().find_map(|context| context.get(&key)));

        match operation {
            Some(operation) => {
                operation(query);
                tracing::debug!(entity = query.entity_type(), sort = name, "sort applied");
                true
            }
            None => {
                tracing::debug!(entity = query.entity_type(), sort = name, "unknown sort ignored");
                false
            }
        }
    }

    /// Whether relation path `relation` may be included for `entity`.
    ///
    /// Entries are tried in order. A literal entry allows an identical path
    /// and is skipped otherwise; a handler exposing the operation decides,
    /// whatever its answer. Nothing deciding means denied.
    #[must_use]
    pub fn check_with(&self, entity: &str, relation: &str) -> bool {
        let Some(entries) = self.with.get(entity) else {
            return false;
        };

        let key = operation_key(relation);
        for entry in entries {
            match entry {
                WithEntry::Relation(name) => {
                    if name == relation {
                        return true;
                    }
                }
                WithEntry::Context(context) => {
                    if let Some(decide) = context.get(&key) {
                        return decide();
                    }
                }
            }
        }
        false
    }
}
