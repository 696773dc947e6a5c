//! Shared DynamoDB types used by the query, update and batch-write shapes.
//!
//! Struct fields serialize in `PascalCase`, enum variants in the upper-case
//! spellings the wire protocol uses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;

/// Role of an attribute in a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// `HASH`: the partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// `RANGE`: the sort key.
    #[serde(rename = "RANGE")]
    Range,
}

/// One element of a table or index key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// Key attribute name.
    pub attribute_name: String,
    /// Whether the attribute is the partition or the sort key.
    pub key_type: KeyType,
}

impl KeySchemaElement {
    /// Partition key element.
    #[must_use]
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    /// Sort key element.
    #[must_use]
    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// `ReturnValues` setting of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnValue {
    /// Return nothing.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// All attributes of the item as they appeared before the operation.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Only the updated attributes as they appeared before the operation.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
    /// All attributes of the item as they appear after the operation.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Only the updated attributes as they appear after the operation.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
}

/// A single put or delete within a `BatchWriteItem` request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    /// Put a full item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_request: Option<PutRequest>,
    /// Delete by primary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_request: Option<DeleteRequest>,
}

impl WriteRequest {
    /// A write request deleting the item with the given primary key.
    #[must_use]
    pub fn delete(key: Key) -> Self {
        Self {
            put_request: None,
            delete_request: Some(DeleteRequest { key }),
        }
    }
}

/// Put half of a [`WriteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// Attributes of the item.
    pub item: Item,
}

/// Delete half of a [`WriteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    /// Primary key of the target item.
    pub key: Key,
}

// ---------------------------------------------------------------------------
// Type aliases for common DynamoDB item shapes
// ---------------------------------------------------------------------------

/// Attribute name -> value for a whole item.
pub type Item = HashMap<String, AttributeValue>;

/// Attribute name -> value for the primary key attributes only.
pub type Key = HashMap<String, AttributeValue>;

/// `#a<N>` placeholder -> attribute name.
pub type ExpressionAttributeNames = HashMap<String, String>;

/// `:v<N>` placeholder -> attribute value.
pub type ExpressionAttributeValues = HashMap<String, AttributeValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_key_schema_element() {
        let elem = KeySchemaElement::hash("pk");
        let json = serde_json::to_string(&elem).expect("serialize KeySchemaElement");
        assert_eq!(json, r#"{"AttributeName":"pk","KeyType":"HASH"}"#);
    }

    #[test]
    fn test_should_serialize_write_request_with_delete() {
        let mut key = HashMap::new();
        key.insert("id".to_owned(), AttributeValue::S("456".to_owned()));
        let req = WriteRequest::delete(key);
        let json = serde_json::to_string(&req).expect("serialize WriteRequest");
        assert_eq!(json, r#"{"DeleteRequest":{"Key":{"id":{"S":"456"}}}}"#);
    }

    #[test]
    fn test_should_serialize_return_value() {
        let json = serde_json::to_string(&ReturnValue::AllNew).expect("serialize ReturnValue");
        assert_eq!(json, r#""ALL_NEW""#);
    }
}
