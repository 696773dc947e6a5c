//! Typed field extraction from raw items.
//!
//! Query pages hand back untyped [`Item`] maps. These helpers pull a single
//! attribute out with a type check, so key extractors and callers can turn an
//! item into a domain value with `?`.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::attribute_value::AttributeValue;
use crate::types::Item;

/// Errors produced while reading a field out of an item.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// The attribute is absent.
    #[error("missing attribute {0}")]
    Missing(String),

    /// The attribute holds a different type than requested.
    #[error("unexpected {actual} data type for {key}, expected {expected}")]
    UnexpectedType {
        /// Attribute name.
        key: String,
        /// Requested type descriptor.
        expected: &'static str,
        /// Actual type descriptor.
        actual: &'static str,
    },

    /// The string value is not one of the allowed literals.
    #[error("value {value} of {key} is not one of {allowed:?}")]
    InvalidLiteral {
        /// Attribute name.
        key: String,
        /// Value found in the item.
        value: String,
        /// Allowed literals.
        allowed: Vec<String>,
    },

    /// The number string does not parse into the requested numeric type.
    #[error("invalid number {value} for {key}")]
    InvalidNumber {
        /// Attribute name.
        key: String,
        /// Value found in the item.
        value: String,
    },

    /// The string is neither an RFC 3339 timestamp nor a `YYYY-MM-DD` date.
    #[error("{value} is not a valid ISO date string")]
    InvalidTimestamp {
        /// Value found in the item.
        value: String,
        /// Parse failure.
        #[source]
        source: chrono::ParseError,
    },
}

/// Convenience result type for item extraction.
pub type ItemResult<T> = Result<T, ItemError>;

fn lookup<'a>(item: &'a Item, key: &str) -> Option<&'a AttributeValue> {
    match item.get(key) {
        None | Some(AttributeValue::Null(true)) => None,
        Some(v) => Some(v),
    }
}

fn require<'a>(item: &'a Item, key: &str) -> ItemResult<&'a AttributeValue> {
    lookup(item, key).ok_or_else(|| ItemError::Missing(key.to_owned()))
}

fn unexpected(key: &str, expected: &'static str, actual: &AttributeValue) -> ItemError {
    ItemError::UnexpectedType {
        key: key.to_owned(),
        expected,
        actual: actual.type_descriptor(),
    }
}

fn as_string<'a>(key: &str, value: &'a AttributeValue) -> ItemResult<&'a str> {
    value.as_s().ok_or_else(|| unexpected(key, "S", value))
}

fn as_number<T: FromStr>(key: &str, value: &AttributeValue) -> ItemResult<T> {
    let n = value.as_n().ok_or_else(|| unexpected(key, "N", value))?;
    n.parse().map_err(|_| ItemError::InvalidNumber {
        key: key.to_owned(),
        value: n.to_owned(),
    })
}

/// Read a required string attribute.
pub fn extract_string<'a>(item: &'a Item, key: &str) -> ItemResult<&'a str> {
    as_string(key, require(item, key)?)
}

/// Read an optional string attribute. Absent and `NULL` both yield `None`.
pub fn extract_optional_string<'a>(item: &'a Item, key: &str) -> ItemResult<Option<&'a str>> {
    lookup(item, key).map(|v| as_string(key, v)).transpose()
}

fn as_literal<'a>(key: &str, value: &'a str, allowed: &[&str]) -> ItemResult<&'a str> {
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(ItemError::InvalidLiteral {
            key: key.to_owned(),
            value: value.to_owned(),
            allowed: allowed.iter().map(|s| (*s).to_owned()).collect(),
        })
    }
}

/// Read a required string attribute restricted to a fixed set of literals.
pub fn extract_string_literal<'a>(
    item: &'a Item,
    key: &str,
    allowed: &[&str],
) -> ItemResult<&'a str> {
    as_literal(key, extract_string(item, key)?, allowed)
}

/// Read an optional string attribute restricted to a fixed set of literals.
/// Absent and `NULL` both yield `None`.
pub fn extract_optional_string_literal<'a>(
    item: &'a Item,
    key: &str,
    allowed: &[&str],
) -> ItemResult<Option<&'a str>> {
    extract_optional_string(item, key)?
        .map(|value| as_literal(key, value, allowed))
        .transpose()
}

/// Read a required number attribute, parsed into `T`.
pub fn extract_number<T: FromStr>(item: &Item, key: &str) -> ItemResult<T> {
    as_number(key, require(item, key)?)
}

/// Read an optional number attribute, parsed into `T`.
pub fn extract_optional_number<T: FromStr>(item: &Item, key: &str) -> ItemResult<Option<T>> {
    lookup(item, key).map(|v| as_number(key, v)).transpose()
}

/// Read a required boolean attribute.
pub fn extract_bool(item: &Item, key: &str) -> ItemResult<bool> {
    let value = require(item, key)?;
    value.as_bool().ok_or_else(|| unexpected(key, "BOOL", value))
}

/// Read a required ISO 8601 timestamp stored as a string.
///
/// Accepts RFC 3339 date-times and bare `YYYY-MM-DD` dates; a bare date is
/// midnight UTC.
pub fn extract_timestamp(item: &Item, key: &str) -> ItemResult<DateTime<FixedOffset>> {
    let value = extract_string(item, key)?;
    DateTime::parse_from_rfc3339(value).or_else(|source| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
            .map_err(|_| ItemError::InvalidTimestamp {
                value: value.to_owned(),
                source,
            })
    })
}

/// Read a required list attribute, converting every element with `build`.
pub fn extract_list<T>(
    item: &Item,
    key: &str,
    build: impl FnMut(&AttributeValue) -> ItemResult<T>,
) -> ItemResult<Vec<T>> {
    let value = require(item, key)?;
    let list = value.as_l().ok_or_else(|| unexpected(key, "L", value))?;
    list.iter().map(build).collect()
}

/// Read an optional list attribute, converting every element with `build`.
pub fn extract_optional_list<T>(
    item: &Item,
    key: &str,
    build: impl FnMut(&AttributeValue) -> ItemResult<T>,
) -> ItemResult<Option<Vec<T>>> {
    if lookup(item, key).is_none() {
        return Ok(None);
    }
    extract_list(item, key, build).map(Some)
}

/// Read a required map attribute and convert it with `build`.
pub fn extract_map<T>(
    item: &Item,
    key: &str,
    build: impl FnOnce(&HashMap<String, AttributeValue>) -> ItemResult<T>,
) -> ItemResult<T> {
    let value = require(item, key)?;
    let map = value.as_m().ok_or_else(|| unexpected(key, "M", value))?;
    build(map)
}

/// Read an optional map attribute and convert it with `build`.
pub fn extract_optional_map<T>(
    item: &Item,
    key: &str,
    build: impl FnOnce(&HashMap<String, AttributeValue>) -> ItemResult<T>,
) -> ItemResult<Option<T>> {
    if lookup(item, key).is_none() {
        return Ok(None);
    }
    extract_map(item, key, build).map(Some)
}
