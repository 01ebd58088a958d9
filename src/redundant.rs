//! Fields fetched only to make joins work and the trimming that removes them.
//!
//! The tracker mirrors the relation structure of the result: every node
//! lists the fields to drop at that level and holds one child node per
//! relation. Trimming walks a JSON result with the same shape.

use crate::path::RelationPath;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedundantFields {
    fields: Vec<String>,
    relations: BTreeMap<String, RedundantFields>,
}

impl RedundantFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.relations.values().all(Self::is_empty)
    }

    /// Fields tracked at this level.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RedundantFields> {
        self.relations.get(name)
    }

    /// Records `field` at `path`, creating intermediate nodes as needed.
    pub fn add(&mut self, path: &RelationPath, field: &str) {
        let node = self.node_mut(path);
        if !node.fields.iter().any(|existing| existing == field) {
            node.fields.push(field.to_string());
        }
    }

    /// Forgets `field` at this level. Used when the client asked for a field
    /// that was also selected for structural reasons.
    pub fn remove(&mut self, field: &str) {
        self.fields.retain(|existing| existing != field);
    }

    /// Grafts `other` under `path`.
    pub fn merge(&mut self, path: &RelationPath, other: RedundantFields) {
        self.node_mut(path).absorb(other);
    }

    fn absorb(&mut self, other: RedundantFields) {
        for field in other.fields {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        for (name, child) in other.relations {
            self.relations.entry(name).or_default().absorb(child);
        }
    }

    fn node_mut(&mut self, path: &RelationPath) -> &mut RedundantFields {
        let mut node = self;
        for segment in path.segments() {
            node = node.relations.entry(segment.clone()).or_default();
        }
        node
    }
}

/// Removes every tracked field from `result`.
///
/// Arrays are trimmed element by element with the same node, objects lose
/// the tracked fields and recurse into tracked relations. Relations missing
/// from the result, or loaded as `null`, are left alone.
pub fn trim(result: &mut Value, redundant: &RedundantFields) {
    match result {
        Value::Array(items) => {
            for item in items {
                trim(item, redundant);
            }
        }
        Value::Object(object) => {
            for field in &redundant.fields {
                object.remove(field);
            }
            for (name, nested) in &redundant.relations {
                if let Some(value) = object.get_mut(name) {
                    trim(value, nested);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_deduplicates_and_nests() {
        let mut redundant = RedundantFields::new();
        redundant.add(&RelationPath::root(), "id");
        redundant.add(&RelationPath::root(), "id");
        redundant.add(&RelationPath::from("messages.recipient"), "id");

        assert_eq!(redundant.fields(), ["id"]);
        let recipient = redundant
            .relation("messages")
            .and_then(|messages| messages.relation("recipient"))
            .unwrap();
        assert_eq!(recipient.fields(), ["id"]);
    }

    #[test]
    fn test_remove_only_touches_this_level() {
        let mut redundant = RedundantFields::new();
        redundant.add(&RelationPath::root(), "id");
        redundant.add(&RelationPath::from("messages"), "id");
        redundant.remove("id");

        assert!(redundant.fields().is_empty());
        assert_eq!(redundant.relation("messages").unwrap().fields(), ["id"]);
    }

    #[test]
    fn test_merge_under_path() {
        let mut nested = RedundantFields::new();
        nested.add(&RelationPath::root(), "sender_id");
        nested.add(&RelationPath::from("recipient"), "id");

        let mut redundant = RedundantFields::new();
        redundant.merge(&RelationPath::from("messages"), nested);

        let messages = redundant.relation("messages").unwrap();
        assert_eq!(messages.fields(), ["sender_id"]);
        assert_eq!(messages.relation("recipient").unwrap().fields(), ["id"]);
    }

    #[test]
    fn test_trim_collection_with_nested_relations() {
        let mut redundant = RedundantFields::new();
        redundant.add(&RelationPath::root(), "id");
        redundant.add(&RelationPath::from("messages"), "sender_id");
        redundant.add(&RelationPath::from("messages.recipient"), "id");

        let mut result = json!([
            {
                "id": 1,
                "name": "John",
                "messages": [
                    {"id": 10, "sender_id": 1, "recipient": {"id": 2, "name": "Jane"}},
                    {"id": 11, "sender_id": 1, "recipient": null}
                ]
            },
            {"id": 2, "name": "Jane"}
        ]);
        trim(&mut result, &redundant);

        assert_eq!(
            result,
            json!([
                {
                    "name": "John",
                    "messages": [
                        {"id": 10, "recipient": {"name": "Jane"}},
                        {"id": 11, "recipient": null}
                    ]
                },
                {"name": "Jane"}
            ])
        );
    }

    #[test]
    fn test_trim_with_empty_tracker_is_noop() {
        let mut result = json!({"id": 1});
        trim(&mut result, &RedundantFields::new());
        assert_eq!(result, json!({"id": 1}));
    }
}
