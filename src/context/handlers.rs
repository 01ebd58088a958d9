//! Context handlers: named operation tables for one concern.
//!
//! A handler is a value exposing a set of operations, looked up by the
//! normalized operation name (see [`operation_key`]). Registration order of
//! handlers is what gives them precedence, see
//! [`ContextRegistry`](super::ContextRegistry).

use super::naming::operation_key;
use crate::query::Select;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type FilterFn = dyn Fn(&mut Select, &[String]) + Send + Sync;
type SortFn = dyn Fn(&mut Select) + Send + Sync;
type WithFn = dyn Fn() -> bool + Send + Sync;

/// One filter operation and the number of arguments it needs.
#[derive(Clone)]
pub struct FilterOperation {
    arity: usize,
    apply: Arc<FilterFn>,
}

impl FilterOperation {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Runs the operation. Returns `false`, leaving `query` untouched, when
    /// fewer than [`arity`](Self::arity) arguments are given.
    pub fn call(&self, query: &mut Select, args: &[String]) -> bool {
        if args.len() < self.arity {
            return false;
        }
        (self.apply)(query, args);
        true
    }
}

/// Filter operations for one entity type.
///
/// ```rust,ignore
/// let users = FilterContext::new()
///     .nullary("root", |query| {
///         query.where_not_null("is_root");
///     })
///     .binary("full_name", |query, first, last| {
///         query.where_eq("first_name", first).where_eq("last_name", last);
///     });
/// ```
#[derive(Clone, Default)]
pub struct FilterContext {
    operations: HashMap<String, FilterOperation>,
}

impl FilterContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation receiving every argument the client sent.
    /// It is skipped when fewer than `arity` arguments arrive.
    #[must_use]
    pub fn operation<F>(mut self, name: &str, arity: usize, apply: F) -> Self
    where
        F: Fn(&mut Select, &[String]) + Send + Sync + 'static,
    {
        self.operations.insert(
            operation_key(name),
            FilterOperation {
                arity,
                apply: Arc::new(apply),
            },
        );
        self
    }

    /// Operation ignoring any arguments.
    #[must_use]
    pub fn nullary<F>(self, name: &str, apply: F) -> Self
    where
        F: Fn(&mut Select) + Send + Sync + 'static,
    {
        self.operation(name, 0, move |query, _| apply(query))
    }

    #[must_use]
    pub fn unary<F>(self, name: &str, apply: F) -> Self
    where
        F: Fn(&mut Select, &str) + Send + Sync + 'static,
    {
        self.operation(name, 1, move |query, args| apply(query, &args[0]))
    }

    #[must_use]
    pub fn binary<F>(self, name: &str, apply: F) -> Self
    where
        F: Fn(&mut Select, &str, &str) + Send + Sync + 'static,
    {
        self.operation(name, 2, move |query, args| apply(query, &args[0], &args[1]))
    }

    /// Operation for an already normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterOperation> {
        self.operations.get(key)
    }
}

impl fmt::Debug for FilterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.operations.keys().collect();
        keys.sort();
        f.debug_struct("FilterContext")
            .field("operations", &keys)
            .finish()
    }
}

impl From<FilterContext> for Vec<FilterContext> {
    fn from(context: FilterContext) -> Self {
        vec![context]
    }
}

/// Sort operations for one entity type.
#[derive(Clone, Default)]
pub struct SortContext {
    operations: HashMap<String, Arc<SortFn>>,
}

impl SortContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn operation<F>(mut self, name: &str, apply: F) -> Self
    where
        F: Fn(&mut Select) + Send + Sync + 'static,
    {
        self.operations.insert(operation_key(name), Arc::new(apply));
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<SortFn>> {
        self.operations.get(key)
    }
}

impl fmt::Debug for SortContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.operations.keys().collect();
        keys.sort();
        f.debug_struct("SortContext")
            .field("operations", &keys)
            .finish()
    }
}

impl From<SortContext> for Vec<SortContext> {
    fn from(context: SortContext) -> Self {
        vec![context]
    }
}

/// Relation-inclusion decisions for one entity type.
///
/// Each operation answers whether one relation path may be included. An
/// operation answering `false` denies the relation even when a later entry
/// would allow it.
#[derive(Clone, Default)]
pub struct WithContext {
    operations: HashMap<String, Arc<WithFn>>,
}

impl WithContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn relation<F>(mut self, name: &str, decide: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.operations.insert(operation_key(name), Arc::new(decide));
        self
    }

    #[must_use]
    pub fn allow(self, name: &str) -> Self {
        self.relation(name, || true)
    }

    #[must_use]
    pub fn deny(self, name: &str) -> Self {
        self.relation(name, || false)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<WithFn>> {
        self.operations.get(key)
    }
}

impl fmt::Debug for WithContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.operations.keys().collect();
        keys.sort();
        f.debug_struct("WithContext")
            .field("operations", &keys)
            .finish()
    }
}

/// One entry of a relation-inclusion list: a literal relation path or a
/// handler.
#[derive(Debug, Clone)]
pub enum WithEntry {
    Relation(String),
    Context(WithContext),
}

impl From<&str> for WithEntry {
    fn from(relation: &str) -> Self {
        Self::Relation(relation.to_string())
    }
}

impl From<String> for WithEntry {
    fn from(relation: String) -> Self {
        Self::Relation(relation)
    }
}

impl From<WithContext> for WithEntry {
    fn from(context: WithContext) -> Self {
        Self::Context(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityDef;

    fn users() -> Select {
        Select::from_entity(&EntityDef::new("users", "users"))
    }

    #[test]
    fn test_keys_are_normalized_on_registration() {
        let context = FilterContext::new().nullary("content_not_empty", |_| {});
        assert!(context.get("contentNotEmpty").is_some());
        assert!(context.get("content_not_empty").is_none());
    }

    #[test]
    fn test_missing_arguments_skip_the_operation() {
        let context = FilterContext::new().binary("full_name", |query, first, last| {
            query.where_eq("first_name", first).where_eq("last_name", last);
        });
        let operation = context.get("fullName").unwrap();
        let mut query = users();

        assert!(!operation.call(&mut query, &["John".to_string()]));
        assert!(query.conditions().is_empty());

        let args = ["John".to_string(), "Smith".to_string(), "extra".to_string()];
        assert!(operation.call(&mut query, &args));
        assert_eq!(query.conditions().len(), 2);
    }

    #[test]
    fn test_with_context_decisions() {
        let context = WithContext::new().allow("messages.recipient").deny("messages");
        assert!((context.get("messagesRecipient").unwrap())());
        assert!(!(context.get("messages").unwrap())());
    }
}
