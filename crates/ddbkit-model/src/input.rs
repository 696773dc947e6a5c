//! Input shapes for the store operations ddbkit drives.
//!
//! `None` options and empty maps are skipped on serialization, so a request
//! carries only what the caller set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    ExpressionAttributeNames, ExpressionAttributeValues, Key, ReturnValue, WriteRequest,
};

/// `Query` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryInput {
    /// Target table.
    pub table_name: String,

    /// Secondary index to read instead of the base table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// Partition key equality plus optional sort key predicate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,

    /// Filter applied after the key condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// Attributes to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Name placeholders used by the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: ExpressionAttributeNames,

    /// Value placeholders used by the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: ExpressionAttributeValues,

    /// Ascending sort key order when `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// Page size cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    /// Resume cursor from the previous page's `LastEvaluatedKey`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub exclusive_start_key: Key,

    /// Strongly consistent read when `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// `UpdateItem` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemInput {
    /// Target table.
    pub table_name: String,

    /// Primary key of the item.
    pub key: Key,

    /// `SET` / `REMOVE` clauses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<String>,

    /// Guard evaluated against the stored item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// Name placeholders used by the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: ExpressionAttributeNames,

    /// Value placeholders used by the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: ExpressionAttributeValues,

    /// What the store echoes back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValue>,
}

/// `BatchWriteItem` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemInput {
    /// Table name -> writes against that table.
    pub request_items: HashMap<String, Vec<WriteRequest>>,
}

impl BatchWriteItemInput {
    /// A batch deleting `keys` from a single table.
    #[must_use]
    pub fn delete_keys(table_name: impl Into<String>, keys: impl IntoIterator<Item = Key>) -> Self {
        let requests = keys.into_iter().map(WriteRequest::delete).collect();
        Self {
            request_items: HashMap::from([(table_name.into(), requests)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_value::AttributeValue;

    #[test]
    fn test_should_omit_empty_query_fields() {
        let input = QueryInput {
            table_name: "orders".to_owned(),
            key_condition_expression: Some("#a0 = :v0".to_owned()),
            ..Default::default()
        };
        let json = serde_json::to_string(&input).expect("serialize QueryInput");
        assert_eq!(
            json,
            r##"{"TableName":"orders","KeyConditionExpression":"#a0 = :v0"}"##
        );
    }

    #[test]
    fn test_should_build_batch_delete_request() {
        let key = Key::from([("pk".to_owned(), AttributeValue::from("u1"))]);
        let input = BatchWriteItemInput::delete_keys("orders", vec![key.clone()]);
        let requests = &input.request_items["orders"];
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].delete_request.as_ref().map(|d| &d.key),
            Some(&key)
        );
        assert!(requests[0].put_request.is_none());
    }
}
