//! Paginated batch-delete engine for ddbkit.
//!
//! Drives a [`DynamoDBClient`] through a query built with `ddbkit-expr`,
//! deleting every matched item in `BatchWriteItem` chunks of 25 and reporting
//! how many deletes the store confirmed and which keys it left unprocessed.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod batch_delete;
pub mod client;
pub mod config;
pub mod error;

pub use batch_delete::{
    BatchDeleteOutput, BatchDeleter, MAX_BATCH_WRITE_ITEMS, batch_delete, key_extractor,
};
pub use client::DynamoDBClient;
pub use config::BatchDeleteConfig;
pub use error::BatchDeleteError;
