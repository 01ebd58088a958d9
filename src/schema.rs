//! Entity and relation catalog.
//!
//! The data layer needs to know, for every entity type the API exposes,
//! which table backs it and how its named relations join. A [`Catalog`] is
//! built once at startup and shared read-only between requests.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Many child rows reference the parent.
    HasMany,
    /// At most one child row references the parent.
    HasOne,
    /// The parent row references one owner row.
    BelongsTo,
}

/// How one named relation of an entity joins its target.
///
/// Related rows are those whose `child_column` equals the parent's
/// `parent_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: String,
    pub target: String,
    pub kind: RelationKind,
    pub parent_column: String,
    pub child_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    relations: Vec<RelationDef>,
}

impl EntityDef {
    /// Entity `name` backed by table `table` with primary key `id`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Rows of `target` whose `foreign_key` holds this entity's primary key.
    #[must_use]
    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.child_relation(RelationKind::HasMany, name, target, foreign_key)
    }

    /// Like [`EntityDef::has_many`] but loads a single row or `null`.
    #[must_use]
    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.child_relation(RelationKind::HasOne, name, target, foreign_key)
    }

    /// The `target` row whose `owner_key` equals this entity's `foreign_key`.
    #[must_use]
    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDef {
            name: name.into(),
            target: target.into(),
            kind: RelationKind::BelongsTo,
            parent_column: foreign_key.into(),
            child_column: owner_key.into(),
        });
        self
    }

    fn child_relation(
        mut self,
        kind: RelationKind,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let parent_column = self.primary_key.clone();
        self.relations.push(RelationDef {
            name: name.into(),
            target: target.into(),
            kind,
            parent_column,
            child_column: foreign_key.into(),
        });
        self
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    #[must_use]
    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: HashMap<String, Arc<EntityDef>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.entities.insert(def.name.clone(), Arc::new(def));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<EntityDef>> {
        self.entities.get(name)
    }

    /// Relation `name` of `entity`, if both are known.
    #[must_use]
    pub fn relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.get(entity).and_then(|def| def.relation(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_columns() {
        let catalog = Catalog::new()
            .entity(EntityDef::new("users", "users").has_many("messages", "messages", "sender_id"))
            .entity(
                EntityDef::new("messages", "messages")
                    .primary_key("message_id")
                    .belongs_to("recipient", "users", "recipient_id", "id"),
            );

        let messages = catalog.relation("users", "messages").unwrap();
        assert_eq!(messages.kind, RelationKind::HasMany);
        assert_eq!(messages.parent_column, "id");
        assert_eq!(messages.child_column, "sender_id");

        let recipient = catalog.relation("messages", "recipient").unwrap();
        assert_eq!(recipient.kind, RelationKind::BelongsTo);
        assert_eq!(recipient.parent_column, "recipient_id");
        assert_eq!(recipient.child_column, "id");

        assert!(catalog.relation("users", "unknown").is_none());
        assert!(catalog.relation("unknown", "messages").is_none());
    }
}
