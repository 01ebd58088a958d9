//! # Query-string grammar
//!
//! Turns the raw values of the `fields`, `filter`, `sort`, `with`, `limit`
//! and `offset` query parameters into a [`ParsedParams`] tree keyed by
//! [`RelationPath`]:
//!
//! | Param  | Grammar                                   | Example                                         |
//! |--------|-------------------------------------------|-------------------------------------------------|
//! | fields | `(path.)?name(,...)`                      | `id,first_name,messages.recipient.last_name`    |
//! | filter | `(path.)?name(:[arg(,arg)*])?(,...)`      | `last_name_in:["Smith",Bloggs],messages.content_not_empty` |
//! | sort   | `(path.)?name(,...)`                      | `messages.latest,last_name_asc`                 |
//! | with   | `path(,...)`                              | `messages,messages.recipient`                   |
//! | offset | `(path.)?int(,...)`                       | `1,messages.recipient.0`                        |
//! | limit  | `(path.)?int(,...)`                       | `5,messages.3`                                  |
//!
//! Parsing never fails. Malformed input (unterminated quotes, stray
//! brackets) degrades to whatever can be recognised.

use crate::config::QueryKeys;
use crate::path::{ELEMENTS_SEPARATOR, RelationPath};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One top-level filter expression: `name:[args]` or a bare `name`.
static FILTER_EXPRESSION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"[^,:]+:\[(?:"(?:\\.|[^\\"])*"|[^,\]]+|,)+\]|[^,]+"#).ok()
});

/// One filter argument: a quoted span with backslash escapes or a bare run.
static FILTER_ARGUMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""(?:\\.|[^\\"])*"|[^,\]\["]+"#).ok());

/// Filters requested for one relation path, in first-seen order.
///
/// Assigning a name twice replaces its arguments in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet(Vec<(String, Vec<String>)>);

pub(crate) static EMPTY_FILTERS: FilterSet = FilterSet(Vec::new());

impl FilterSet {
    pub fn insert(&mut self, name: impl Into<String>, args: Vec<String>) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_args)) => *existing_args = args,
            None => self.0.push((name, args)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, args)| args.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, args)| (name.as_str(), args.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<String>)> for FilterSet {
    fn from_iter<T: IntoIterator<Item = (N, Vec<String>)>>(iter: T) -> Self {
        let mut set = Self::default();
        for (name, args) in iter {
            set.insert(name, args);
        }
        set
    }
}

/// Structured form of one set of query parameters.
///
/// Built once per request (or once per resource for server defaults) and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedParams {
    pub fields: HashMap<RelationPath, Vec<String>>,
    pub filter: HashMap<RelationPath, FilterSet>,
    pub sort: HashMap<RelationPath, Vec<String>>,
    pub with: Vec<String>,
    pub limit: HashMap<RelationPath, i64>,
    pub offset: HashMap<RelationPath, i64>,
}

impl ParsedParams {
    /// Parses every recognised parameter out of `(name, value)` pairs.
    ///
    /// Parameter names are resolved through `keys`; unknown names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I, keys: &QueryKeys) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if key == keys.fields {
                params.fields = parse_names(value);
            } else if key == keys.filter {
                params.filter = parse_filter(value);
            } else if key == keys.sort {
                params.sort = parse_names(value);
            } else if key == keys.with {
                params.with = parse_with(value);
            } else if key == keys.limit {
                params.limit = parse_integers(value);
            } else if key == keys.offset {
                params.offset = parse_integers(value);
            }
        }
        params
    }
}

/// Tokens that are empty, blank or exactly `0` carry no value.
fn is_falsy(token: &str) -> bool {
    token.trim().is_empty() || token == "0"
}

fn elements(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(ELEMENTS_SEPARATOR)
        .filter(|token| !is_falsy(token))
}

/// Parses a `fields` or `sort` value: names grouped by relation path,
/// keeping the order in which they appear.
#[must_use]
pub fn parse_names(value: &str) -> HashMap<RelationPath, Vec<String>> {
    let mut names: HashMap<RelationPath, Vec<String>> = HashMap::new();
    for namespace in elements(value) {
        let (path, name) = RelationPath::split_namespace(namespace);
        names.entry(path).or_default().push(name.to_string());
    }
    names
}

/// Parses a `with` value. Each token is a full relation path.
#[must_use]
pub fn parse_with(value: &str) -> Vec<String> {
    elements(value).map(str::to_string).collect()
}

/// Parses a `limit` or `offset` value. A later value for the same path wins.
#[must_use]
pub fn parse_integers(value: &str) -> HashMap<RelationPath, i64> {
    let mut integers = HashMap::new();
    for namespace in elements(value) {
        let (path, raw) = RelationPath::split_namespace(namespace);
        integers.insert(path, leading_integer(raw));
    }
    integers
}

/// Parses a `filter` value into filter sets grouped by relation path.
#[must_use]
pub fn parse_filter(value: &str) -> HashMap<RelationPath, FilterSet> {
    let mut filters: HashMap<RelationPath, FilterSet> = HashMap::new();
    let Some(expression) = FILTER_EXPRESSION.as_ref() else {
        return filters;
    };

    for found in expression.find_iter(value) {
        let (namespace, arguments) = match found.as_str().split_once(':') {
            Some((namespace, arguments)) => (namespace, Some(arguments)),
            None => (found.as_str(), None),
        };

        let (path, name) = RelationPath::split_namespace(namespace);
        let args = arguments.map(parse_arguments).unwrap_or_default();
        filters.entry(path).or_default().insert(name, args);
    }
    filters
}

fn parse_arguments(blob: &str) -> Vec<String> {
    let Some(argument) = FILTER_ARGUMENT.as_ref() else {
        return Vec::new();
    };

    argument
        .find_iter(blob)
        .map(|found| unquote(found.as_str()).to_string())
        .collect()
}

/// Strips exactly the two boundary quotes. Inner escapes stay as written.
fn unquote(argument: &str) -> &str {
    if argument.len() >= 2 && argument.starts_with('"') && argument.ends_with('"') {
        &argument[1..argument.len() - 1]
    } else {
        argument
    }
}

/// Integer value of the leading numeric prefix of `raw`, or 0.
///
/// Leading whitespace and one sign are accepted, trailing garbage is
/// ignored (`"12abc"` is 12, `"abc"` is 0) and overflow saturates.
#[must_use]
pub fn leading_integer(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
