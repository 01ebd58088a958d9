//! Running a [`Select`] against a database.
//!
//! [`SeaOrmExecutor`] turns a select into `sea_query` statements and reads
//! rows back as JSON objects. Included relations are loaded level by level
//! with one `WHERE child IN (parent values)` query per relation and attached
//! to their parent rows under the relation name.

use crate::query::{FilterOperator, Predicate, Select};
use crate::schema::RelationKind;
use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Asterisk, Expr, Query, SelectStatement, SimpleExpr};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, JsonValue};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[async_trait]
pub trait Executor: Send + Sync {
    /// Rows matching `select`, with its includes attached.
    async fn fetch(&self, select: &Select) -> Result<Vec<Value>, DbErr>;

    /// Number of rows matching the predicates of `select`, ignoring
    /// selection, ordering, offset and limit.
    async fn count(&self, select: &Select) -> Result<u64, DbErr>;
}

#[derive(Debug, Clone)]
pub struct SeaOrmExecutor {
    db: DatabaseConnection,
}

impl SeaOrmExecutor {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn query_rows(&self, statement: &SelectStatement) -> Result<Vec<Value>, DbErr> {
        let statement = self.db.get_database_backend().build(statement);
        tracing::debug!(sql = %statement, "query");
        JsonValue::find_by_statement(statement).all(&self.db).await
    }

    /// Loads every include of `select` for `rows` and attaches the results.
    async fn attach_includes(&self, select: &Select, rows: &mut [Value]) -> Result<(), DbErr> {
        for include in select.includes() {
            let relation = &include.relation;
            let keys = distinct_keys(rows, &relation.parent_column);

            let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
            if !keys.is_empty() {
                let mut related = include.select.clone();
                related.where_in(relation.child_column.as_str(), keys);
                for row in self.fetch(&related).await? {
                    if let Some(key) = row.get(&relation.child_column).and_then(key_of) {
                        grouped.entry(key).or_default().push(row);
                    }
                }
            }

            for row in rows.iter_mut() {
                let Value::Object(object) = row else { continue };
                let mut children = object
                    .get(&relation.parent_column)
                    .and_then(key_of)
                    .and_then(|key| grouped.get(&key).cloned())
                    .unwrap_or_default();

                let value = match relation.kind {
                    RelationKind::HasMany => Value::Array(children),
                    RelationKind::HasOne | RelationKind::BelongsTo => {
                        if children.is_empty() {
                            Value::Null
                        } else {
                            children.swap_remove(0)
                        }
                    }
                };
                object.insert(relation.name.clone(), value);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for SeaOrmExecutor {
    async fn fetch(&self, select: &Select) -> Result<Vec<Value>, DbErr> {
        let mut rows = self.query_rows(&select_statement(select)).await?;
        self.attach_includes(select, &mut rows).await?;
        Ok(rows)
    }

    async fn count(&self, select: &Select) -> Result<u64, DbErr> {
        let mut statement = Query::select();
        statement
            .expr_as(Expr::cust("COUNT(*)"), Alias::new("count"))
            .from(Alias::new(select.table()));
        for predicate in select.conditions() {
            statement.and_where(predicate_expr(predicate));
        }

        let statement = self.db.get_database_backend().build(&statement);
        tracing::debug!(sql = %statement, "count");
        let count = match self.db.query_one(statement).await? {
            Some(row) => row.try_get::<i64>("", "count")?,
            None => 0,
        };
        Ok(count.max(0).unsigned_abs())
    }
}

/// Statement for the rows of `select` itself, without includes.
#[must_use]
pub fn select_statement(select: &Select) -> SelectStatement {
    let mut statement = Query::select();
    match select.columns() {
        Some(columns) => {
            statement.columns(columns.iter().map(|column| Alias::new(column.as_str())));
        }
        None => {
            statement.column(Asterisk);
        }
    }
    statement.from(Alias::new(select.table()));

    for predicate in select.conditions() {
        statement.and_where(predicate_expr(predicate));
    }
    for (column, order) in select.orders() {
        statement.order_by(Alias::new(column.as_str()), order.clone());
    }
    if let Some(limit) = select.get_limit() {
        statement.limit(limit);
    }
    if let Some(offset) = select.get_offset() {
        statement.offset(offset);
    }
    statement
}

fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    let column = Expr::col(Alias::new(predicate.column.as_str()));
    match predicate.operator {
        FilterOperator::Eq if predicate.value.is_null() => column.is_null(),
        FilterOperator::Neq if predicate.value.is_null() => column.is_not_null(),
        FilterOperator::Eq => column.eq(sql_value(&predicate.value)),
        FilterOperator::Neq => column.ne(sql_value(&predicate.value)),
        FilterOperator::Gt => column.gt(sql_value(&predicate.value)),
        FilterOperator::Gte => column.gte(sql_value(&predicate.value)),
        FilterOperator::Lt => column.lt(sql_value(&predicate.value)),
        FilterOperator::Lte => column.lte(sql_value(&predicate.value)),
        FilterOperator::Like => column.like(like_pattern(&predicate.value)),
        FilterOperator::NotLike => column.not_like(like_pattern(&predicate.value)),
        FilterOperator::In => column.is_in(list_values(&predicate.value)),
        FilterOperator::NotIn => column.is_not_in(list_values(&predicate.value)),
        FilterOperator::IsNull => column.is_null(),
        FilterOperator::IsNotNull => column.is_not_null(),
    }
}

fn sql_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::Bool(flag) => (*flag).into(),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => integer.into(),
            (None, Some(float)) => float.into(),
            (None, None) => number.to_string().into(),
        },
        Value::String(text) => text.clone().into(),
        Value::Null => sea_orm::Value::String(None),
        Value::Array(_) | Value::Object(_) => value.to_string().into(),
    }
}

fn like_pattern(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn list_values(value: &Value) -> Vec<sea_orm::Value> {
    match value {
        Value::Array(items) => items.iter().map(sql_value).collect(),
        single => vec![sql_value(single)],
    }
}

/// Grouping key of a join column value. `null` never joins.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Distinct non-null values of `column` across `rows`, in first-seen order.
fn distinct_keys(rows: &[Value], column: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for value in rows.iter().filter_map(|row| row.get(column)) {
        if key_of(value).is_some_and(|key| seen.insert(key)) {
            keys.push(value.clone());
        }
    }
    keys
}
