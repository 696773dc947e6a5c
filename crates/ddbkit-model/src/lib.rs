//! DynamoDB wire-format types for ddbkit.
//!
//! Hand-written serde types for the subset of the DynamoDB JSON protocol that
//! the expression builders and the batch-delete engine exchange with a store:
//! attribute values, `Query`, `UpdateItem` and `BatchWriteItem` shapes, and the
//! store error type.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod item;
pub mod output;
pub mod types;

pub use attribute_value::{AttributeValue, ScalarValue};
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use input::{BatchWriteItemInput, QueryInput, UpdateItemInput};
pub use output::{BatchWriteItemOutput, QueryOutput};
pub use types::{
    DeleteRequest, ExpressionAttributeNames, ExpressionAttributeValues, Item, Key, KeySchemaElement,
    KeyType, PutRequest, ReturnValue, WriteRequest,
};
