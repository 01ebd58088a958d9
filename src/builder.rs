//! Query projection: applies filters, sort, field restriction, pagination and
//! relation inclusion to one [`Select`], and remembers which selected fields
//! exist only for joins so they can be trimmed from the result.

use crate::context::ContextRegistry;
use crate::errors::ApiError;
use crate::executor::Executor;
use crate::path::RelationPath;
use crate::query::Select;
use crate::query_parser::FilterSet;
use crate::redundant::{RedundantFields, trim};
use crate::schema::Catalog;
use serde_json::Value;

pub struct QueryBuilder<'q> {
    query: &'q mut Select,
    contexts: &'q ContextRegistry,
    catalog: &'q Catalog,
    redundant: RedundantFields,
}

impl<'q> QueryBuilder<'q> {
    pub fn new(query: &'q mut Select, contexts: &'q ContextRegistry, catalog: &'q Catalog) -> Self {
        Self {
            query,
            contexts,
            catalog,
            redundant: RedundantFields::new(),
        }
    }

    #[must_use]
    pub fn query(&self) -> &Select {
        self.query
    }

    #[must_use]
    pub fn redundant(&self) -> &RedundantFields {
        &self.redundant
    }

    #[must_use]
    pub fn into_redundant(self) -> RedundantFields {
        self.redundant
    }

    pub fn filter(&mut self, filters: &FilterSet) -> &mut Self {
        for (name, args) in filters.iter() {
            self.contexts.apply_filter(self.query, name, args);
        }
        self
    }

    /// Applies sort operations in order; earlier ones take precedence.
    pub fn sort(&mut self, sort: &[String]) -> &mut Self {
        for name in sort {
            self.contexts.apply_sort(self.query, name);
        }
        self
    }

    /// Restricts the selection to `fields`. An empty list keeps every column.
    ///
    /// The primary key, and the foreign key of a relation query, are always
    /// selected. They are trimmed from the result unless requested.
    pub fn fields(&mut self, fields: &[String]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }

        let here = RelationPath::root();
        self.query.select_only();

        let primary_key = self.query.primary_key().to_string();
        self.query.add_select(primary_key.as_str());
        self.redundant.add(&here, &primary_key);

        if let Some(foreign_key) = self.query.foreign_key().map(str::to_string) {
            self.query.add_select(foreign_key.as_str());
            self.redundant.add(&here, &foreign_key);
        }

        for field in fields {
            self.query.add_select(field.as_str());
            self.redundant.remove(field);
        }
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.query.offset(offset);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.query.limit(limit);
        self
    }

    /// Includes relation path `relation` when the registry allows it.
    ///
    /// `callback` receives a builder for the relation query and the relation
    /// path, and typically applies the parameters scoped to that path.
    /// Denied or unknown relations are skipped.
    pub fn with<F>(&mut self, relation: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder<'_>, &str),
    {
        let entity = self.query.entity_type().to_string();
        if !self.contexts.check_with(&entity, relation) {
            tracing::debug!(entity = entity.as_str(), relation, "relation not allowed, skipped");
            return self;
        }

        let path = RelationPath::from(relation);
        let (contexts, catalog) = (self.contexts, self.catalog);
        let mut nested_redundant = None;

        let loaded = self.query.eager_load(catalog, path.segments(), |select| {
            let mut nested = QueryBuilder::new(select, contexts, catalog);
            callback(&mut nested, relation);
            nested_redundant = Some(nested.into_redundant());
        });

        if !loaded {
            tracing::warn!(
                entity = entity.as_str(),
                relation,
                "allowed relation is not in the catalog, skipped"
            );
            return self;
        }

        if let Some(nested) = nested_redundant {
            self.redundant.merge(&path, nested);
        }
        self
    }

    /// Selects the parent side column of every included relation on
    /// restricted queries, so related rows can still be matched.
    fn ensure_join_columns(&mut self) {
        let mut forced = Vec::new();
        force_join_columns(self.query, &RelationPath::root(), &mut forced);
        for (path, column) in forced {
            self.redundant.add(&path, &column);
        }
    }

    /// Fetches the first matching row and trims it.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when nothing matches, or the executor's error.
    pub async fn get_item<E>(mut self, executor: &E) -> Result<Value, ApiError>
    where
        E: Executor + ?Sized,
    {
        self.ensure_join_columns();
        self.query.limit(1);

        let mut rows = executor.fetch(self.query).await?;
        if rows.is_empty() {
            return Err(ApiError::not_found(self.query.entity_type(), None));
        }

        let mut item = rows.swap_remove(0);
        trim(&mut item, &self.redundant);
        Ok(item)
    }

    /// Fetches the matching rows, trimmed, together with the number of rows
    /// matching the filters regardless of offset and limit.
    ///
    /// # Errors
    ///
    /// The executor's error.
    pub async fn get_collection<E>(mut self, executor: &E) -> Result<(Vec<Value>, u64), ApiError>
    where
        E: Executor + ?Sized,
    {
        self.ensure_join_columns();

        let mut rows = executor.fetch(self.query).await?;
        let total = executor.count(self.query).await?;

        for row in &mut rows {
            trim(row, &self.redundant);
        }
        Ok((rows, total))
    }

    /// Applies join columns and returns the tracker without executing.
    pub(crate) fn finish(mut self) -> RedundantFields {
        self.ensure_join_columns();
        self.redundant
    }
}

fn force_join_columns(select: &mut Select, path: &RelationPath, forced: &mut Vec<(RelationPath, String)>) {
    if select.is_restricted() {
        let columns: Vec<String> = select
            .includes()
            .iter()
            .map(|include| include.relation.parent_column.clone())
            .collect();
        for column in columns {
            if select.add_select(column.as_str()) {
                forced.push((path.clone(), column));
            }
        }
    }

    for include in select.includes_mut() {
        let nested = path.join(&include.relation.name);
        force_join_columns(&mut include.select, &nested, forced);
    }
}
