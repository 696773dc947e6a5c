//! Store client abstraction.
//!
//! The engine only needs two operations from a DynamoDB-compatible store. Any
//! SDK wrapper, HTTP client or in-memory fake can drive it by implementing
//! [`DynamoDBClient`].

use std::sync::Arc;

use async_trait::async_trait;
use ddbkit_model::{BatchWriteItemInput, BatchWriteItemOutput, DynamoDBError, QueryInput, QueryOutput};

/// The store operations the batch-delete engine issues.
#[async_trait]
pub trait DynamoDBClient: Send + Sync {
    /// Read one page of a key condition query.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError>;

    /// Submit up to 25 put or delete requests.
    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, DynamoDBError>;
}

#[async_trait]
impl<T: DynamoDBClient + ?Sized> DynamoDBClient for Arc<T> {
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError> {
        (**self).query(input).await
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, DynamoDBError> {
        (**self).batch_write_item(input).await
    }
}
