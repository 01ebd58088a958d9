//! Relation paths scope every query parameter to a (possibly nested) relation.
//!
//! `messages.recipient` addresses the `recipient` relation of every loaded
//! `messages` row. The empty path is the root entity and is written `_`.

use std::fmt;

/// Separates elements inside one query parameter value.
pub const ELEMENTS_SEPARATOR: char = ',';

/// Separates relation names inside a relation path.
pub const PREFIX_SEPARATOR: char = '.';

/// Serialized form of the root path.
pub const WITHOUT_RELATION: &str = "_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationPath(Vec<String>);

impl RelationPath {
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns a new path with `name` appended.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Splits `namespace` on its last prefix separator into a relation path
    /// and a trailing item name.
    ///
    /// `messages.recipient.last_name` gives (`messages.recipient`, `last_name`)
    /// and a namespace without separator belongs to the root.
    #[must_use]
    pub fn split_namespace(namespace: &str) -> (Self, &str) {
        match namespace.rsplit_once(PREFIX_SEPARATOR) {
            Some((prefix, name)) => (Self::from(prefix), name),
            None => (Self::root(), namespace),
        }
    }
}

impl From<&str> for RelationPath {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == WITHOUT_RELATION {
            return Self::root();
        }

        Self(value.split(PREFIX_SEPARATOR).map(str::to_string).collect())
    }
}

impl From<&String> for RelationPath {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<String>> for RelationPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for RelationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(WITHOUT_RELATION);
        }

        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "{PREFIX_SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}
