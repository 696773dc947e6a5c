//! Output shapes for the store operations ddbkit drives.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Item, Key, WriteRequest};

/// One `Query` page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutput {
    /// Items on this page, after filtering and projection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    /// Items returned.
    #[serde(default)]
    pub count: i32,

    /// Items read before the filter ran.
    #[serde(default)]
    pub scanned_count: i32,

    /// Cursor for the next page; empty on the last page.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_evaluated_key: Key,
}

impl QueryOutput {
    /// The continuation cursor, or `None` on the last page.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&Key> {
        (!self.last_evaluated_key.is_empty()).then_some(&self.last_evaluated_key)
    }
}

/// `BatchWriteItem` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemOutput {
    /// Writes the store did not apply, keyed by table.
    #[serde(default)]
    pub unprocessed_items: HashMap<String, Vec<WriteRequest>>,
}

impl BatchWriteItemOutput {
    /// Keys of the delete requests the store left unprocessed for `table_name`.
    #[must_use]
    pub fn unprocessed_delete_keys(&self, table_name: &str) -> Vec<Key> {
        self.unprocessed_items
            .get(table_name)
            .map(|requests| {
                requests
                    .iter()
                    .filter_map(|r| r.delete_request.as_ref().map(|d| d.key.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
