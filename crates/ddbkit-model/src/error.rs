//! Store error type.
//!
//! These are the errors a store client hands back from `Query` or
//! `BatchWriteItem`. ddbkit never interprets or retries them; they travel
//! to the caller unchanged.

use std::fmt;

/// Error codes a DynamoDB client observes on the operations ddbkit issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DynamoDBErrorCode {
    /// The table or index does not exist.
    ResourceNotFoundException,
    /// A condition expression evaluated to false.
    ConditionalCheckFailedException,
    /// The table's provisioned capacity is exhausted.
    ProvisionedThroughputExceededException,
    /// The account-level request rate is exhausted.
    RequestLimitExceeded,
    /// The request is malformed.
    #[default]
    ValidationException,
    /// The store failed internally.
    InternalServerError,
}

impl DynamoDBErrorCode {
    /// Whether the store rejected the request because of capacity limits.
    #[must_use]
    pub fn is_throttling(self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceededException | Self::RequestLimitExceeded
        )
    }
}

impl fmt::Display for DynamoDBErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ValidationException => "ValidationException",
            Self::InternalServerError => "InternalServerError",
        };
        f.write_str(code)
    }
}

/// An error returned by the store.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DynamoDBError {
    /// What kind of failure the store reported.
    pub code: DynamoDBErrorCode,
    /// Store-provided detail.
    pub message: String,
    /// Transport or SDK error behind the failure.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DynamoDBError {
    /// Error with `code` and `message`.
    #[must_use]
    pub fn new(code: DynamoDBErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `ResourceNotFoundException`.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::new(DynamoDBErrorCode::ResourceNotFoundException, message)
    }

    /// `ProvisionedThroughputExceededException`.
    #[must_use]
    pub fn throughput_exceeded(message: impl Into<String>) -> Self {
        Self::new(DynamoDBErrorCode::ProvisionedThroughputExceededException, message)
    }

    /// `RequestLimitExceeded`.
    #[must_use]
    pub fn request_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(DynamoDBErrorCode::RequestLimitExceeded, message)
    }

    /// `ValidationException`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DynamoDBErrorCode::ValidationException, message)
    }

    /// `InternalServerError`.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(DynamoDBErrorCode::InternalServerError, message)
    }
}
