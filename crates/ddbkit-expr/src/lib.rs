//! Placeholder-safe DynamoDB expression builders.
//!
//! Every attribute name and literal value that goes into an expression is
//! replaced by a generated placeholder (`#a<N>` for names, `:v<N>` for values)
//! drawn from a pair of [`NameSession`] / [`ValueSession`] handles. Builders
//! that take part in one request share those sessions, so the key condition,
//! filter, projection, update and guard condition of a request all reference a
//! single consistent pair of dictionaries.
//!
//! ```
//! use ddbkit_expr::QueryBuilder;
//!
//! let mut query = QueryBuilder::with_sort_key("userId", "timestamp");
//! query.key("u1")?.between(10, 20)?;
//! let expression = query.build()?;
//! assert_eq!(
//!     expression.key_condition_expression,
//!     "#a0 = :v0 AND (#a1 BETWEEN :v1 AND :v2)"
//! );
//! # Ok::<(), ddbkit_expr::ExpressionError>(())
//! ```
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod condition;
pub mod error;
pub mod path;
pub mod projection;
pub mod query;
pub mod session;
pub mod update;

pub use condition::{CompareOp, Condition, ConditionBuilder, ConditionExpression, Operator};
pub use error::{ConditionSlot, ExpressionError, ExpressionResult, SessionKind};
pub use path::AttributePath;
pub use projection::{ProjectionBuilder, ProjectionExpression};
pub use query::{QueryBuilder, QueryExpression};
pub use session::{NameSession, ValueSession};
pub use update::{ListPosition, UpdateAction, UpdateBuilder, UpdateExpression};
