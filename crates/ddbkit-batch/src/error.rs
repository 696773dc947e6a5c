//! Batch-delete error type.
//!
//! Every variant carries the progress made before the run stopped, so callers
//! can report or resume a partially completed delete.

use ddbkit_model::DynamoDBError;

use crate::batch_delete::BatchDeleteOutput;

/// Errors raised by a batch-delete run.
#[derive(Debug, thiserror::Error)]
pub enum BatchDeleteError {
    /// A query page failed.
    #[error("query failed after deleting {} items: {source}", .progress.deleted_count)]
    Query {
        /// The store error.
        #[source]
        source: DynamoDBError,
        /// Work completed before the failure.
        progress: BatchDeleteOutput,
    },

    /// A batch write failed.
    #[error("batch write failed after deleting {} items: {source}", .progress.deleted_count)]
    BatchWrite {
        /// The store error.
        #[source]
        source: DynamoDBError,
        /// Work completed before the failure.
        progress: BatchDeleteOutput,
    },

    /// The run was cancelled between store calls.
    #[error("batch delete cancelled after deleting {} items", .progress.deleted_count)]
    Cancelled {
        /// Work completed before cancellation.
        progress: BatchDeleteOutput,
    },
}

impl BatchDeleteError {
    /// Work completed before the run stopped.
    #[must_use]
    pub fn progress(&self) -> &BatchDeleteOutput {
        match self {
            Self::Query { progress, .. }
            | Self::BatchWrite { progress, .. }
            | Self::Cancelled { progress } => progress,
        }
    }

    /// Consume the error, returning the completed work.
    #[must_use]
    pub fn into_progress(self) -> BatchDeleteOutput {
        match self {
            Self::Query { progress, .. }
            | Self::BatchWrite { progress, .. }
            | Self::Cancelled { progress } => progress,
        }
    }

    /// The store error, if the run failed on a store call.
    #[must_use]
    pub fn store_error(&self) -> Option<&DynamoDBError> {
        match self {
            Self::Query { source, .. } | Self::BatchWrite { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }
}
