//! Projection expression builder.

use std::collections::HashSet;

use ddbkit_model::ExpressionAttributeNames;
use serde::{Deserialize, Serialize};

use crate::error::{ExpressionError, ExpressionResult};
use crate::path::AttributePath;
use crate::session::NameSession;

/// A projection together with the finalized name dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectionExpression {
    /// Comma-separated path list.
    pub projection_expression: String,
    /// `#a<N>` -> attribute name.
    pub expression_attribute_names: ExpressionAttributeNames,
}

/// Builder for projection expressions.
///
/// Registering a path whose dot-joined identity is already present is a no-op.
/// The builder is not `Clone`, since a copy would keep allocating on the same
/// name session:
///
/// ```compile_fail
/// let projection = ddbkit_expr::ProjectionBuilder::new();
/// let _copy = projection.clone();
/// ```
#[derive(Debug, Default)]
pub struct ProjectionBuilder {
    names: NameSession,
    visited: HashSet<String>,
    paths: Vec<String>,
}

impl ProjectionBuilder {
    /// Builder with its own fresh name session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder drawing placeholders from an existing name session.
    #[must_use]
    pub fn with_session(names: NameSession) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    /// Add `path` to the projection.
    pub fn get(&mut self, path: impl Into<AttributePath>) -> ExpressionResult<&mut Self> {
        let path = path.into();
        let identity = path.identity();
        if self.visited.contains(&identity) {
            return Ok(self);
        }
        let placeholder = path.placeholder(&self.names)?;
        self.visited.insert(identity);
        self.paths.push(placeholder);
        Ok(self)
    }

    /// Whether at least one path is registered.
    #[must_use]
    pub fn has_projection(&self) -> bool {
        !self.paths.is_empty()
    }

    pub(crate) fn text(&self) -> Option<String> {
        self.has_projection().then(|| self.paths.join(", "))
    }

    /// Snapshot the projection. Finalizes the name session.
    pub fn build(&self) -> ExpressionResult<ProjectionExpression> {
        let projection_expression = self.text().ok_or(ExpressionError::EmptyProjection)?;
        Ok(ProjectionExpression {
            projection_expression,
            expression_attribute_names: self.names.names(),
        })
    }
}
