//! Expression builder error type.
//!
//! Every variant is a usage error detected synchronously at the call that
//! breaks an invariant. None of them are retryable.

use std::fmt;

/// Which placeholder session rejected an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Attribute name session (`#a<N>`).
    Name,
    /// Attribute value session (`:v<N>`).
    Value,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Value => f.write_str("value"),
        }
    }
}

/// Which single-assignment slot of a builder was set twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionSlot {
    /// Partition key equality.
    PartitionKey,
    /// Sort key predicate.
    SortKey,
    /// Post-query filter.
    Filter,
    /// Update guard condition.
    Guard,
}

impl fmt::Display for ConditionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartitionKey => f.write_str("partition key"),
            Self::SortKey => f.write_str("sort key"),
            Self::Filter => f.write_str("filter"),
            Self::Guard => f.write_str("guard"),
        }
    }
}

/// Errors raised by the expression builders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// A placeholder was requested after the session's dictionary was read.
    #[error("attribute {kind} placeholders have been finalized")]
    SessionFinalized {
        /// The session that is already finalized.
        kind: SessionKind,
    },

    /// A condition slot was assigned twice.
    #[error("{0} condition is already defined")]
    ConditionConflict(ConditionSlot),

    /// The query was built without a partition key condition.
    #[error("failed to build query expression because of missing partition key condition")]
    MissingPartitionKey,

    /// A sort key predicate was used on a builder without a sort key column.
    #[error("can't use sort key condition without providing a sort key column")]
    MissingSortColumn,

    /// An update targeted the same attribute path twice.
    #[error("path {0} is already in the update list")]
    DuplicatePath(String),

    /// The update builder has no SET or REMOVE entries.
    #[error("update request can't be empty")]
    EmptyUpdate,

    /// The projection builder has no registered paths.
    #[error("projection request can't be empty")]
    EmptyProjection,

    /// A condition was attached to a builder whose sessions it was not
    /// allocated on.
    #[error("condition was built on a different placeholder session")]
    ForeignSession,

    /// `and` or `or` was called without operands.
    #[error("condition composition needs at least one operand")]
    EmptyCondition,

    /// The predicate is outside the supported grammar.
    #[error("unsupported condition operator {0}")]
    UnsupportedOperator(String),
}

/// Convenience result type for expression builders.
pub type ExpressionResult<T> = Result<T, ExpressionError>;
