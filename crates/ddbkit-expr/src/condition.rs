//! Condition expression builder.
//!
//! Produces condition, filter and guard expressions. The builder holds no
//! state of its own beyond the two session handles: leaf predicates allocate
//! placeholders on those sessions as a side effect, and `and`/`or`/`not` only
//! compose text.
//!
//! Supported grammar: `attribute_exists`, `attribute_not_exists`, the
//! comparisons `= < <= > >=`, `begins_with` and `BETWEEN`. Set membership
//! (`IN`), `contains`, `size` and `attribute_type` are not supported.

use std::fmt;
use std::str::FromStr;

use ddbkit_model::{AttributeValue, ExpressionAttributeNames, ExpressionAttributeValues};
use serde::{Deserialize, Serialize};

use crate::error::{ExpressionError, ExpressionResult};
use crate::path::AttributePath;
use crate::session::{NameSession, ValueSession};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// A two-operand operator accepted by [`ConditionBuilder::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// One of the comparison operators.
    Compare(CompareOp),
    /// `begins_with(path, prefix)`.
    BeginsWith,
}

impl FromStr for Operator {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Compare(CompareOp::Eq)),
            "<" => Ok(Self::Compare(CompareOp::Lt)),
            "<=" => Ok(Self::Compare(CompareOp::Le)),
            ">" => Ok(Self::Compare(CompareOp::Gt)),
            ">=" => Ok(Self::Compare(CompareOp::Ge)),
            "begins_with" => Ok(Self::BeginsWith),
            other => Err(ExpressionError::UnsupportedOperator(other.to_owned())),
        }
    }
}

/// Leaf predicate over a single attribute path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Exists,
    NotExists,
    Compare {
        op: CompareOp,
        value: AttributeValue,
    },
    BeginsWith(AttributeValue),
    Between {
        low: AttributeValue,
        high: AttributeValue,
    },
}

impl Predicate {
    /// Render against `path`, allocating the path names before the values.
    pub(crate) fn render(
        self,
        path: &AttributePath,
        names: &NameSession,
        values: &ValueSession,
    ) -> ExpressionResult<String> {
        let path = path.placeholder(names)?;
        let expression = match self {
            Self::Exists => format!("attribute_exists({path})"),
            Self::NotExists => format!("attribute_not_exists({path})"),
            Self::Compare { op, value } => {
                let value = values.value_id(value)?;
                format!("{path} {op} {value}")
            }
            Self::BeginsWith(prefix) => {
                let prefix = values.value_id(prefix)?;
                format!("begins_with({path}, {prefix})")
            }
            Self::Between { low, high } => {
                let low = values.value_id(low)?;
                let high = values.value_id(high)?;
                format!("{path} BETWEEN {low} AND {high}")
            }
        };
        Ok(expression)
    }
}

/// An immutable condition fragment.
///
/// A fragment remembers the sessions its placeholders were allocated on, so
/// builders can refuse fragments whose `#a<N>`/`:v<N>` tokens would resolve
/// against someone else's dictionaries. Two fragments are equal when their
/// text matches and they were built on the same sessions.
#[derive(Debug, Clone)]
pub struct Condition {
    expression: String,
    names: NameSession,
    values: ValueSession,
}

impl Condition {
    /// The expression text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Consume the fragment, returning the expression text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.expression
    }

    /// Whether the fragment's placeholders came from `names` and `values`.
    #[must_use]
    pub fn is_built_on(&self, names: &NameSession, values: &ValueSession) -> bool {
        self.names.shares_table(names) && self.values.shares_table(values)
    }

    pub(crate) fn ensure_built_on(
        &self,
        names: &NameSession,
        values: &ValueSession,
    ) -> ExpressionResult<()> {
        if self.is_built_on(names, values) {
            Ok(())
        } else {
            Err(ExpressionError::ForeignSession)
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression && self.is_built_on(&other.names, &other.values)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.expression
    }
}

/// A condition together with the finalized placeholder dictionaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionExpression {
    /// Condition text.
    pub condition_expression: String,
    /// `#a<N>` -> attribute name.
    pub expression_attribute_names: ExpressionAttributeNames,
    /// `:v<N>` -> attribute value.
    pub expression_attribute_values: ExpressionAttributeValues,
}

/// Builder for condition and filter expressions.
#[derive(Debug, Clone, Default)]
pub struct ConditionBuilder {
    names: NameSession,
    values: ValueSession,
}

impl ConditionBuilder {
    /// Builder with its own fresh sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder drawing placeholders from existing sessions.
    #[must_use]
    pub fn with_sessions(names: NameSession, values: ValueSession) -> Self {
        Self { names, values }
    }

    /// The shared name session.
    #[must_use]
    pub fn name_session(&self) -> &NameSession {
        &self.names
    }

    /// The shared value session.
    #[must_use]
    pub fn value_session(&self) -> &ValueSession {
        &self.values
    }

    /// Name dictionary snapshot. Finalizes the name session.
    pub fn names(&self) -> ExpressionAttributeNames {
        self.names.names()
    }

    /// Value dictionary snapshot. Finalizes the value session.
    pub fn values(&self) -> ExpressionAttributeValues {
        self.values.values()
    }

    /// Snapshot `condition` with both dictionaries. Finalizes both sessions.
    ///
    /// Fails with [`ExpressionError::ForeignSession`] if `condition` was built
    /// on other sessions; nothing is finalized in that case.
    pub fn build(&self, condition: &Condition) -> ExpressionResult<ConditionExpression> {
        condition.ensure_built_on(&self.names, &self.values)?;
        Ok(ConditionExpression {
            condition_expression: condition.expression.clone(),
            expression_attribute_names: self.names.names(),
            expression_attribute_values: self.values.values(),
        })
    }

    fn stamp(&self, expression: String) -> Condition {
        Condition {
            expression,
            names: self.names.clone(),
            values: self.values.clone(),
        }
    }

    fn leaf(&self, path: AttributePath, predicate: Predicate) -> ExpressionResult<Condition> {
        let expression = predicate.render(&path, &self.names, &self.values)?;
        Ok(self.stamp(expression))
    }

    /// `attribute_exists(path)`.
    pub fn exists(&self, path: impl Into<AttributePath>) -> ExpressionResult<Condition> {
        self.leaf(path.into(), Predicate::Exists)
    }

    /// `attribute_not_exists(path)`.
    pub fn not_exists(&self, path: impl Into<AttributePath>) -> ExpressionResult<Condition> {
        self.leaf(path.into(), Predicate::NotExists)
    }

    fn comparison(
        &self,
        path: AttributePath,
        op: CompareOp,
        value: AttributeValue,
    ) -> ExpressionResult<Condition> {
        self.leaf(path, Predicate::Compare { op, value })
    }

    /// `path = value`.
    pub fn equal(
        &self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.comparison(path.into(), CompareOp::Eq, value.into())
    }

    /// `path < value`.
    pub fn less_than(
        &self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.comparison(path.into(), CompareOp::Lt, value.into())
    }

    /// `path <= value`.
    pub fn less_than_or_equal(
        &self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.comparison(path.into(), CompareOp::Le, value.into())
    }

    /// `path > value`.
    pub fn greater_than(
        &self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.comparison(path.into(), CompareOp::Gt, value.into())
    }

    /// `path >= value`.
    pub fn greater_than_or_equal(
        &self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.comparison(path.into(), CompareOp::Ge, value.into())
    }

    /// `begins_with(path, prefix)`.
    pub fn begins_with(
        &self,
        path: impl Into<AttributePath>,
        prefix: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.leaf(path.into(), Predicate::BeginsWith(prefix.into()))
    }

    /// `path BETWEEN low AND high`, both bounds inclusive.
    ///
    /// Bound ordering is not checked.
    pub fn between(
        &self,
        path: impl Into<AttributePath>,
        low: impl Into<AttributeValue>,
        high: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        self.leaf(
            path.into(),
            Predicate::Between {
                low: low.into(),
                high: high.into(),
            },
        )
    }

    /// Two-operand predicate selected by its textual operator.
    ///
    /// Accepts `=`, `<`, `<=`, `>`, `>=` and `begins_with`. Anything else is
    /// rejected with [`ExpressionError::UnsupportedOperator`] before any
    /// placeholder is allocated.
    pub fn compare(
        &self,
        path: impl Into<AttributePath>,
        operator: &str,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<Condition> {
        let predicate = match operator.parse::<Operator>()? {
            Operator::Compare(op) => Predicate::Compare {
                op,
                value: value.into(),
            },
            Operator::BeginsWith => Predicate::BeginsWith(value.into()),
        };
        self.leaf(path.into(), predicate)
    }

    /// Parenthesize each operand and join with ` AND `.
    ///
    /// Fails with [`ExpressionError::EmptyCondition`] when `conditions` is
    /// empty and [`ExpressionError::ForeignSession`] when an operand was built
    /// on other sessions.
    pub fn and(
        &self,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> ExpressionResult<Condition> {
        self.join(conditions, " AND ")
    }

    /// Parenthesize each operand and join with ` OR `.
    ///
    /// Fails like [`ConditionBuilder::and`].
    pub fn or(
        &self,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> ExpressionResult<Condition> {
        self.join(conditions, " OR ")
    }

    /// `NOT (condition)`.
    ///
    /// The result keeps the operand's sessions.
    #[must_use]
    pub fn not(&self, condition: &Condition) -> Condition {
        Condition {
            expression: format!("NOT ({})", condition.expression),
            names: condition.names.clone(),
            values: condition.values.clone(),
        }
    }

    fn join(
        &self,
        conditions: impl IntoIterator<Item = Condition>,
        separator: &str,
    ) -> ExpressionResult<Condition> {
        let mut operands = Vec::new();
        for condition in conditions {
            condition.ensure_built_on(&self.names, &self.values)?;
            operands.push(format!("({})", condition.expression));
        }
        if operands.is_empty() {
            return Err(ExpressionError::EmptyCondition);
        }
        Ok(self.stamp(operands.join(separator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionKind;

    #[test]
    fn test_should_build_nested_path_condition() {
        let conditional = ConditionBuilder::new();
        let condition = conditional
            .greater_than(["order", "du9834"], 1000)
            .unwrap();

        let expression = conditional.build(&condition).unwrap();
        assert_eq!(expression.condition_expression, "#a0.#a1 > :v0");
        assert_eq!(expression.expression_attribute_names["#a0"], "order");
        assert_eq!(expression.expression_attribute_names["#a1"], "du9834");
        assert_eq!(
            expression.expression_attribute_values[":v0"],
            AttributeValue::from(1000)
        );
    }

    #[test]
    fn test_should_compose_and_or() {
        let c = ConditionBuilder::new();
        let condition = c.or([
            c.equal("accountId", "1234").unwrap(),
            c.and([
                c.greater_than("order.du9834", 1000).unwrap(),
                c.greater_than(["order", "du9834"], 1000).unwrap(),
            ])
            .unwrap(),
        ])
        .unwrap();

        assert_eq!(
            condition.as_str(),
            "(#a0 = :v0) OR ((#a1 > :v1) AND (#a2.#a3 > :v2))"
        );
        let names = c.names();
        assert_eq!(names.len(), 4);
        assert_eq!(names["#a1"], "order.du9834");
        assert_eq!(names["#a2"], "order");
        assert_eq!(names["#a3"], "du9834");
        assert_eq!(c.values().len(), 3);
    }

    #[test]
    fn test_should_render_every_leaf_form() {
        let c = ConditionBuilder::new();
        assert_eq!(c.exists("a").unwrap().as_str(), "attribute_exists(#a0)");
        assert_eq!(
            c.not_exists("b").unwrap().as_str(),
            "attribute_not_exists(#a1)"
        );
        assert_eq!(c.less_than("a", 1).unwrap().as_str(), "#a0 < :v0");
        assert_eq!(c.less_than_or_equal("a", 1).unwrap().as_str(), "#a0 <= :v1");
        assert_eq!(c.greater_than_or_equal("a", 1).unwrap().as_str(), "#a0 >= :v2");
        assert_eq!(
            c.begins_with("b", "pre").unwrap().as_str(),
            "begins_with(#a1, :v3)"
        );
        assert_eq!(
            c.between("a", 20, 10).unwrap().as_str(),
            "#a0 BETWEEN :v4 AND :v5"
        );
    }

    #[test]
    fn test_should_negate_condition() {
        let c = ConditionBuilder::new();
        let exists = c.exists("deletedAt").unwrap();
        assert_eq!(c.not(&exists).as_str(), "NOT (attribute_exists(#a0))");
    }

    #[test]
    fn test_should_parse_textual_operators() {
        let c = ConditionBuilder::new();
        assert_eq!(c.compare("a", "<=", 3).unwrap().as_str(), "#a0 <= :v0");
        assert_eq!(
            c.compare("a", "begins_with", "x").unwrap().as_str(),
            "begins_with(#a0, :v1)"
        );
    }

    #[test]
    fn test_should_reject_unsupported_operators() {
        let c = ConditionBuilder::new();
        for op in ["<>", "IN", "contains", "size", "attribute_type", "~"] {
            assert_eq!(
                c.compare("a", op, 1),
                Err(ExpressionError::UnsupportedOperator(op.to_owned()))
            );
        }
        assert!(c.name_session().is_empty());
        assert!(c.value_session().is_empty());
    }

    #[test]
    fn test_should_fail_after_build() {
        let c = ConditionBuilder::new();
        let condition = c.exists("a").unwrap();
        let _ = c.build(&condition).unwrap();
        assert_eq!(
            c.exists("b"),
            Err(ExpressionError::SessionFinalized {
                kind: SessionKind::Name
            })
        );
    }

    #[test]
    fn test_should_serialize_condition_expression() {
        let c = ConditionBuilder::new();
        let condition = c.equal("status", "open").unwrap();
        let json = serde_json::to_value(c.build(&condition).unwrap()).unwrap();
        assert_eq!(json["ConditionExpression"], "#a0 = :v0");
        assert_eq!(json["ExpressionAttributeNames"]["#a0"], "status");
        assert_eq!(json["ExpressionAttributeValues"][":v0"]["S"], "open");
    }

    #[test]
    fn test_should_reject_empty_composition() {
        let c = ConditionBuilder::new();
        assert_eq!(c.and(Vec::<Condition>::new()), Err(ExpressionError::EmptyCondition));
        assert_eq!(c.or(Vec::<Condition>::new()), Err(ExpressionError::EmptyCondition));
    }

    #[test]
    fn test_should_reject_foreign_operands() {
        let c = ConditionBuilder::new();
        let other = ConditionBuilder::new();
        let local = c.exists("a").unwrap();
        let foreign = other.exists("b").unwrap();

        assert_eq!(
            c.and([local.clone(), foreign.clone()]),
            Err(ExpressionError::ForeignSession)
        );
        assert_eq!(c.or([foreign.clone()]), Err(ExpressionError::ForeignSession));
        assert_eq!(c.build(&foreign), Err(ExpressionError::ForeignSession));
        assert!(!c.name_session().is_finalized());

        let negated = c.not(&foreign);
        assert!(negated.is_built_on(other.name_session(), other.value_session()));
        assert!(!negated.is_built_on(c.name_session(), c.value_session()));
        assert!(c.and([local]).is_ok());
    }

    #[test]
    fn test_should_compare_conditions_by_text_and_session() {
        let c = ConditionBuilder::new();
        let other = ConditionBuilder::new();
        let first = c.exists("a").unwrap();
        let again = c.exists("a").unwrap();
        let foreign = other.exists("a").unwrap();

        assert_eq!(first, again);
        assert_eq!(first.as_str(), foreign.as_str());
        assert_ne!(first, foreign);
    }
}
