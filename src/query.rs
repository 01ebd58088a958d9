//! The live query object that filter and sort handlers mutate.
//!
//! A [`Select`] describes one query against one entity type: the selected
//! columns, the predicates (implicitly AND-ed), ordering, pagination and the
//! relations to eager load, each with its own nested [`Select`]. Executing it
//! is the job of an [`Executor`](crate::executor::Executor).

use crate::schema::{Catalog, EntityDef, RelationDef};
use sea_orm::Order;
use serde_json::Value;

/// Comparison applied by one [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equality (=)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE pattern matching
    Like,
    /// NOT LIKE pattern matching
    NotLike,
    /// IN (array of values)
    In,
    /// NOT IN (array of values)
    NotIn,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: FilterOperator,
    /// Compared value; an array for `In`/`NotIn`, ignored by the null checks.
    pub value: Value,
}

/// A relation scheduled for eager loading together with its own query.
#[derive(Debug, Clone)]
pub struct Include {
    pub relation: RelationDef,
    pub select: Select,
}

#[derive(Debug, Clone)]
pub struct Select {
    entity: String,
    table: String,
    primary_key: String,
    foreign_key: Option<String>,
    columns: Option<Vec<String>>,
    conditions: Vec<Predicate>,
    orders: Vec<(String, Order)>,
    offset: Option<u64>,
    limit: Option<u64>,
    includes: Vec<Include>,
}

impl Select {
    /// Selects every column of every row of `def`.
    #[must_use]
    pub fn from_entity(def: &EntityDef) -> Self {
        Self {
            entity: def.name.clone(),
            table: def.table.clone(),
            primary_key: def.primary_key.clone(),
            foreign_key: None,
            columns: None,
            conditions: Vec::new(),
            orders: Vec::new(),
            offset: None,
            limit: None,
            includes: Vec::new(),
        }
    }

    /// Query loading `relation`, whose rows are rows of `target`.
    #[must_use]
    pub fn for_relation(target: &EntityDef, relation: &RelationDef) -> Self {
        let mut select = Self::from_entity(target);
        select.foreign_key = Some(relation.child_column.clone());
        select
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Column this query must return so related rows can be matched back to
    /// their parents. `None` outside relation queries.
    #[must_use]
    pub fn foreign_key(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    /// Clears the column selection. Until a column is added nothing is
    /// selected.
    pub fn select_only(&mut self) -> &mut Self {
        self.columns = Some(Vec::new());
        self
    }

    /// Adds `column` to the selection. Returns `false` when it was already
    /// selected, including when every column is selected.
    pub fn add_select(&mut self, column: impl Into<String>) -> bool {
        let column = column.into();
        match &mut self.columns {
            Some(columns) if columns.contains(&column) => false,
            Some(columns) => {
                columns.push(column);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.columns.is_some()
    }

    /// Selected columns, `None` meaning all of them.
    #[must_use]
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    #[must_use]
    pub fn is_selected(&self, column: &str) -> bool {
        self.columns
            .as_ref()
            .is_none_or(|columns| columns.iter().any(|c| c == column))
    }

    pub fn filter(
        &mut self,
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.conditions.push(Predicate {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter(column, FilterOperator::Eq, value)
    }

    pub fn where_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, FilterOperator::In, Value::Array(values))
    }

    pub fn where_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.filter(column, FilterOperator::IsNull, Value::Null)
    }

    pub fn where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.filter(column, FilterOperator::IsNotNull, Value::Null)
    }

    #[must_use]
    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    /// Appends a sort key. Earlier keys take precedence.
    pub fn order_by(&mut self, column: impl Into<String>, order: Order) -> &mut Self {
        self.orders.push((column.into(), order));
        self
    }

    #[must_use]
    pub fn orders(&self) -> &[(String, Order)] {
        &self.orders
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }

    #[must_use]
    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    pub(crate) fn includes_mut(&mut self) -> &mut [Include] {
        &mut self.includes
    }

    /// Schedules the relation `path` (one relation name per segment) for
    /// eager loading and hands its query to `configure`.
    ///
    /// Intermediate relations that are not loaded yet are added without
    /// constraints. Loading the same path twice configures the existing
    /// query again. Returns `false`, changing nothing, when any segment is
    /// not a relation known to `catalog`.
    pub fn eager_load<F>(&mut self, catalog: &Catalog, path: &[String], configure: F) -> bool
    where
        F: FnOnce(&mut Select),
    {
        if path.is_empty() || !Self::resolves(catalog, &self.entity, path) {
            return false;
        }
        self.load_resolved(catalog, path, configure);
        true
    }

    fn resolves(catalog: &Catalog, entity: &str, path: &[String]) -> bool {
        let mut entity = entity.to_string();
        for name in path {
            match catalog.relation(&entity, name) {
                Some(relation) if catalog.get(&relation.target).is_some() => {
                    entity.clone_from(&relation.target);
                }
                _ => return false,
            }
        }
        true
    }

    fn load_resolved<F>(&mut self, catalog: &Catalog, path: &[String], configure: F)
    where
        F: FnOnce(&mut Select),
    {
        let Some((name, rest)) = path.split_first() else {
            configure(self);
            return;
        };

        let position = self
            .includes
            .iter()
            .position(|include| include.relation.name == *name);
        let index = match position {
            Some(index) => index,
            None => {
                let relation = catalog.relation(&self.entity, name);
                let target = relation.and_then(|relation| catalog.get(&relation.target));
                let (Some(relation), Some(target)) = (relation, target) else {
                    return;
                };
                self.includes.push(Include {
                    relation: relation.clone(),
                    select: Select::for_relation(target, relation),
                });
                self.includes.len() - 1
            }
        };

        self.includes[index].select.load_resolved(catalog, rest, configure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new()
            .entity(EntityDef::new("users", "users").has_many("messages", "messages", "sender_id"))
            .entity(
                EntityDef::new("messages", "messages").belongs_to(
                    "recipient",
                    "users",
                    "recipient_id",
                    "id",
                ),
            )
    }

    fn users() -> Select {
        Select::from_entity(catalog().get("users").unwrap())
    }

    #[test]
    fn test_add_select_is_idempotent() {
        let mut select = users();
        assert!(!select.is_restricted());
        assert!(select.is_selected("anything"));

        select.select_only();
        assert!(select.add_select("id"));
        assert!(!select.add_select("id"));
        assert_eq!(select.columns(), Some(&["id".to_string()][..]));
        assert!(!select.is_selected("name"));
    }

    #[test]
    fn test_predicates_keep_call_order() {
        let mut select = users();
        select.where_eq("first_name", "John").where_eq("last_name", "Smith");
        select.where_in("id", [1, 2]);

        let conditions = select.conditions();
        assert_eq!(conditions.len(), 3);
        assert_eq!(conditions[0].column, "first_name");
        assert_eq!(conditions[1].value, Value::from("Smith"));
        assert_eq!(conditions[2].operator, FilterOperator::In);
        assert_eq!(conditions[2].value, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_eager_load_nested_path_creates_intermediate() {
        let catalog = catalog();
        let mut select = users();
        let path = vec!["messages".to_string(), "recipient".to_string()];

        assert!(select.eager_load(&catalog, &path, |query| {
            query.limit(3);
        }));

        let messages = &select.includes()[0];
        assert_eq!(messages.relation.name, "messages");
        assert_eq!(messages.select.foreign_key(), Some("sender_id"));
        assert_eq!(messages.select.get_limit(), None);

        let recipient = &messages.select.includes()[0];
        assert_eq!(recipient.select.entity_type(), "users");
        assert_eq!(recipient.select.foreign_key(), Some("id"));
        assert_eq!(recipient.select.get_limit(), Some(3));
    }

    #[test]
    fn test_eager_load_reuses_existing_node() {
        let catalog = catalog();
        let mut select = users();
        let nested = vec!["messages".to_string(), "recipient".to_string()];
        let messages = vec!["messages".to_string()];

        select.eager_load(&catalog, &nested, |_| {});
        select.eager_load(&catalog, &messages, |query| {
            query.limit(5);
        });

        assert_eq!(select.includes().len(), 1);
        assert_eq!(select.includes()[0].select.get_limit(), Some(5));
        assert_eq!(select.includes()[0].select.includes().len(), 1);
    }

    #[test]
    fn test_eager_load_unknown_relation_changes_nothing() {
        let catalog = catalog();
        let mut select = users();
        let path = vec!["messages".to_string(), "attachments".to_string()];

        assert!(!select.eager_load(&catalog, &path, |_| {}));
        assert!(!select.eager_load(&catalog, &[], |_| {}));
        assert!(select.includes().is_empty());
    }
}
