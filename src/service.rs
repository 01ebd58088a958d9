//! Request orchestration: applies one request's parameters to a root query
//! and to every relation it asks to include.

use crate::builder::QueryBuilder;
use crate::context::ContextRegistry;
use crate::errors::ApiError;
use crate::executor::Executor;
use crate::models::CollectionPage;
use crate::params::RequestParams;
use crate::path::RelationPath;
use crate::query::Select;
use crate::redundant::trim;
use crate::schema::Catalog;
use serde_json::Value;

pub struct QueryExecutor<'a> {
    params: &'a RequestParams,
    contexts: &'a ContextRegistry,
    catalog: &'a Catalog,
}

impl<'a> QueryExecutor<'a> {
    #[must_use]
    pub fn new(params: &'a RequestParams, contexts: &'a ContextRegistry, catalog: &'a Catalog) -> Self {
        Self {
            params,
            contexts,
            catalog,
        }
    }

    /// Includes every relation of the `with` parameter, each configured with
    /// the parameters scoped to its path.
    pub fn include_relations(&self, builder: &mut QueryBuilder<'_>) {
        for relation in self.params.with() {
            builder.with(relation, |nested, prefix| {
                let path = RelationPath::from(prefix);
                nested
                    .sort(self.params.sort(&path))
                    .filter(self.params.filters(&path))
                    .fields(self.params.fields(&path))
                    .offset(self.params.offset(&path))
                    .limit(self.params.limit(&path));
            });
        }
    }

    /// One entity, restricted to the requested root fields and relations.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when `select` matches nothing, or the
    /// executor's error.
    pub async fn item<E>(&self, mut select: Select, executor: &E) -> Result<Value, ApiError>
    where
        E: Executor + ?Sized,
    {
        let mut builder = QueryBuilder::new(&mut select, self.contexts, self.catalog);
        builder.fields(self.params.fields(&RelationPath::root()));
        self.include_relations(&mut builder);
        builder.get_item(executor).await
    }

    /// A page of entities with sorting, filtering, field restriction and
    /// pagination applied at the root and on every included relation.
    ///
    /// # Errors
    ///
    /// The executor's error.
    pub async fn collection<E>(&self, mut select: Select, executor: &E) -> Result<CollectionPage, ApiError>
    where
        E: Executor + ?Sized,
    {
        let root = RelationPath::root();
        let (offset, limit) = (self.params.offset(&root), self.params.limit(&root));

        let mut builder = QueryBuilder::new(&mut select, self.contexts, self.catalog);
        builder
            .sort(self.params.sort(&root))
            .filter(self.params.filters(&root))
            .fields(self.params.fields(&root))
            .offset(offset)
            .limit(limit);
        self.include_relations(&mut builder);

        let (data, total) = builder.get_collection(executor).await?;
        Ok(CollectionPage {
            count: data.len() as u64,
            limit,
            offset,
            total,
            data,
        })
    }

    /// Projects a row the caller already fetched, typically one just
    /// created or updated: loads the requested relations, drops attributes
    /// not listed in `fields` and trims fields kept only for joins.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when `entity` is not in the catalog, or the
    /// executor's error.
    pub async fn loaded_item<E>(&self, entity: &str, row: Value, executor: &E) -> Result<Value, ApiError>
    where
        E: Executor + ?Sized,
    {
        let def = self
            .catalog
            .get(entity)
            .ok_or_else(|| ApiError::not_found(entity, None))?;
        let attributes = match row {
            Value::Object(attributes) => attributes,
            other => return Ok(other),
        };

        let fields = self.params.fields(&RelationPath::root());
        let mut item: serde_json::Map<String, Value> = attributes
            .iter()
            .filter(|(name, _)| fields.is_empty() || fields.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let key = attributes.get(&def.primary_key).filter(|key| !key.is_null());
        let Some(key) = key.filter(|_| !self.params.with().is_empty()) else {
            return Ok(Value::Object(item));
        };

        let mut select = Select::from_entity(def);
        select.where_eq(def.primary_key.as_str(), key.clone());

        let mut builder = QueryBuilder::new(&mut select, self.contexts, self.catalog);
        self.include_relations(&mut builder);
        let redundant = builder.finish();

        let loaded = executor.fetch(&select).await?;
        if let Some(Value::Object(mut loaded)) = loaded.into_iter().next() {
            for include in select.includes() {
                let name = &include.relation.name;
                let Some(mut value) = loaded.remove(name) else {
                    continue;
                };
                if let Some(nested) = redundant.relation(name) {
                    trim(&mut value, nested);
                }
                item.insert(name.clone(), value);
            }
        }

        Ok(Value::Object(item))
    }
}
