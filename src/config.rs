//! Resolved `rest.*` options.
//!
//! Loading configuration files is the host application's job. This module
//! only consumes resolved values, either as a deserialized [`RestConfig`] or
//! through a flat `key -> value` lookup using the dotted option names:
//!
//! | Key                  | Default  |
//! |----------------------|----------|
//! | `rest.keys.fields`   | `fields` |
//! | `rest.keys.filter`   | `filter` |
//! | `rest.keys.sort`     | `sort`   |
//! | `rest.keys.with`     | `with`   |
//! | `rest.keys.limit`    | `limit`  |
//! | `rest.keys.offset`   | `offset` |
//! | `rest.limit.default` | `10`     |
//! | `rest.limit.maxValue`| `100`    |

use crate::errors::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Query parameter names the grammar parser listens to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryKeys {
    pub fields: String,
    pub filter: String,
    pub sort: String,
    pub with: String,
    pub limit: String,
    pub offset: String,
}

impl Default for QueryKeys {
    fn default() -> Self {
        Self {
            fields: "fields".to_string(),
            filter: "filter".to_string(),
            sort: "sort".to_string(),
            with: "with".to_string(),
            limit: "limit".to_string(),
            offset: "offset".to_string(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Limit used when neither the request nor the server defaults set one.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub default: i64,
    /// Inclusive upper bound for every limit.
    #[serde(rename = "maxValue")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_value: i64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            default: 10,
            max_value: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub keys: QueryKeys,
    pub limit: LimitConfig,
}

const KEY_OPTIONS: [&str; 6] = ["fields", "filter", "sort", "with", "limit", "offset"];
const LIMIT_OPTIONS: [&str; 2] = ["default", "maxValue"];

impl RestConfig {
    /// Builds the configuration from a flat lookup such as
    /// `|key| settings.get(key).cloned()`.
    ///
    /// Keys the lookup does not know keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when a limit is not an integer or
    /// `rest.limit.maxValue` is below 1.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys = Map::new();
        for option in KEY_OPTIONS {
            if let Some(value) = lookup(&format!("rest.keys.{option}")) {
                keys.insert(option.to_string(), Value::String(value));
            }
        }

        let mut limit = Map::new();
        for option in LIMIT_OPTIONS {
            if let Some(value) = lookup(&format!("rest.limit.{option}")) {
                limit.insert(option.to_string(), Value::String(value.trim().to_string()));
            }
        }

        let mut root = Map::new();
        root.insert("keys".to_string(), Value::Object(keys));
        root.insert("limit".to_string(), Value::Object(limit));

        let config: Self = serde_json::from_value(Value::Object(root)).map_err(|err| {
            ApiError::internal("Invalid REST configuration", Some(err.to_string()))
        })?;
        config.validate()
    }

    /// Reads `REST_KEYS_FIELDS`, ..., `REST_LIMIT_DEFAULT` and
    /// `REST_LIMIT_MAXVALUE` from the environment.
    ///
    /// # Errors
    ///
    /// Same as [`RestConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(env_name(key)).ok())
    }

    fn validate(self) -> Result<Self, ApiError> {
        if self.limit.max_value < 1 {
            return Err(ApiError::internal(
                "Invalid REST configuration",
                Some(format!(
                    "rest.limit.maxValue must be at least 1, got {}",
                    self.limit.max_value
                )),
            ));
        }
        Ok(self)
    }
}

/// `rest.limit.maxValue` becomes `REST_LIMIT_MAXVALUE`.
fn env_name(key: &str) -> String {
    key.replace('.', "_").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RestConfig::default();
        assert_eq!(config.keys.fields, "fields");
        assert_eq!(config.keys.offset, "offset");
        assert_eq!(config.limit.default, 10);
        assert_eq!(config.limit.max_value, 100);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let settings: HashMap<&str, &str> = HashMap::from([
            ("rest.keys.fields", "select"),
            ("rest.limit.default", "25"),
            ("rest.limit.maxValue", " 50 "),
        ]);
        let config =
            RestConfig::from_lookup(|key| settings.get(key).map(|v| (*v).to_string())).unwrap();

        assert_eq!(config.keys.fields, "select");
        assert_eq!(config.keys.filter, "filter");
        assert_eq!(config.limit.default, 25);
        assert_eq!(config.limit.max_value, 50);
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_limit() {
        let result = RestConfig::from_lookup(|key| {
            (key == "rest.limit.default").then(|| "ten".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_max_below_one() {
        let result = RestConfig::from_lookup(|key| {
            (key == "rest.limit.maxValue").then(|| "0".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_numbers_or_strings() {
        let config: RestConfig =
            serde_json::from_str(r#"{"limit": {"default": 5, "maxValue": "20"}}"#).unwrap();
        assert_eq!(config.limit.default, 5);
        assert_eq!(config.limit.max_value, 20);
        assert_eq!(config.keys, QueryKeys::default());
    }

    #[test]
    fn test_env_name() {
        assert_eq!(env_name("rest.limit.maxValue"), "REST_LIMIT_MAXVALUE");
        assert_eq!(env_name("rest.keys.with"), "REST_KEYS_WITH");
    }
}
