//! Attribute paths.
//!
//! A path is an ordered list of segments. Each segment gets its own name
//! placeholder and the placeholders are joined with `.`, so `["order", "id"]`
//! renders as `#a0.#a1`. A single string is always one segment: `"order.id"`
//! is an attribute whose name contains a dot, not a nested path.

use std::fmt;

use crate::error::ExpressionResult;
use crate::session::NameSession;

/// A document path into an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    segments: Vec<String>,
}

impl AttributePath {
    /// Create a path from its segments.
    #[must_use]
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical dot-joined identity used for de-duplication.
    #[must_use]
    pub fn identity(&self) -> String {
        self.segments.join(".")
    }

    /// Allocate a name placeholder per segment and join them with `.`.
    pub(crate) fn placeholder(&self, names: &NameSession) -> ExpressionResult<String> {
        let ids = self
            .segments
            .iter()
            .map(|segment| names.name_id(segment))
            .collect::<ExpressionResult<Vec<_>>>()?;
        Ok(ids.join("."))
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

impl From<&str> for AttributePath {
    fn from(segment: &str) -> Self {
        Self::new([segment])
    }
}

impl From<String> for AttributePath {
    fn from(segment: String) -> Self {
        Self::new([segment])
    }
}

impl From<&String> for AttributePath {
    fn from(segment: &String) -> Self {
        Self::new([segment.as_str()])
    }
}

impl<const N: usize> From<[&str; N]> for AttributePath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&[&str]> for AttributePath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl From<Vec<&str>> for AttributePath {
    fn from(segments: Vec<&str>) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for AttributePath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&AttributePath> for AttributePath {
    fn from(path: &AttributePath) -> Self {
        path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_keep_dotted_string_as_single_segment() {
        let path = AttributePath::from("order.du9834");
        assert_eq!(path.segments().len(), 1);
        assert_eq!(path.identity(), "order.du9834");
    }

    #[test]
    fn test_should_join_nested_segments() {
        let path = AttributePath::from(["order", "du9834"]);
        assert_eq!(path.identity(), "order.du9834");

        let names = NameSession::new();
        assert_eq!(path.placeholder(&names).unwrap(), "#a0.#a1");
        assert_eq!(path.placeholder(&names).unwrap(), "#a0.#a1");
    }
}
