//! Query expression builder.
//!
//! One builder targets one table or index key schema: the partition key column
//! and the optional sort key column are fixed at construction. The partition
//! key condition is always equality; the sort key accepts one comparison,
//! `begins_with` or `BETWEEN`. Filter and projection builders share the
//! query's sessions, so a single `build()` produces one consistent pair of
//! dictionaries for the whole request.

use ddbkit_model::{
    AttributeValue, ExpressionAttributeNames, ExpressionAttributeValues, KeySchemaElement,
    KeyType, QueryInput, ScalarValue,
};
use serde::{Deserialize, Serialize};

use crate::condition::{CompareOp, Condition, ConditionBuilder, Predicate};
use crate::error::{ConditionSlot, ExpressionError, ExpressionResult};
use crate::path::AttributePath;
use crate::projection::ProjectionBuilder;
use crate::session::{NameSession, ValueSession};

/// A built query: key condition, optional filter and projection, and the
/// finalized dictionaries they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryExpression {
    /// `<pk>` or `<pk> AND <sk>`.
    pub key_condition_expression: String,
    /// Post-read filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Returned attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// `#a<N>` -> attribute name.
    pub expression_attribute_names: ExpressionAttributeNames,
    /// `:v<N>` -> attribute value.
    pub expression_attribute_values: ExpressionAttributeValues,
}

impl QueryExpression {
    /// A forward-ordered `Query` request against `table_name` (and `index_name`).
    #[must_use]
    pub fn to_query_input(&self, table_name: &str, index_name: Option<&str>) -> QueryInput {
        QueryInput {
            table_name: table_name.to_owned(),
            index_name: index_name.map(ToOwned::to_owned),
            key_condition_expression: Some(self.key_condition_expression.clone()),
            filter_expression: self.filter_expression.clone(),
            projection_expression: self.projection_expression.clone(),
            expression_attribute_names: self.expression_attribute_names.clone(),
            expression_attribute_values: self.expression_attribute_values.clone(),
            scan_index_forward: Some(true),
            ..Default::default()
        }
    }
}

fn operand(value: impl Into<ScalarValue>) -> AttributeValue {
    let scalar: ScalarValue = value.into();
    scalar.into()
}

/// Builder for key condition queries.
///
/// Not `Clone`: a copy would share the sessions and number placeholders from
/// the same counters as the builder it was copied from.
///
/// ```compile_fail
/// let query = ddbkit_expr::QueryBuilder::new("userId");
/// let _copy = query.clone();
/// ```
#[derive(Debug)]
pub struct QueryBuilder {
    partition_key: AttributePath,
    sort_key: Option<AttributePath>,
    names: NameSession,
    values: ValueSession,
    partition: Option<String>,
    sort: Option<String>,
    filter: Option<String>,
    filter_builder: ConditionBuilder,
    projection: ProjectionBuilder,
}

impl QueryBuilder {
    /// Query on a partition key only.
    #[must_use]
    pub fn new(partition_key: impl Into<AttributePath>) -> Self {
        Self::with_columns(partition_key.into(), None)
    }

    /// Query on a partition key and sort key.
    #[must_use]
    pub fn with_sort_key(
        partition_key: impl Into<AttributePath>,
        sort_key: impl Into<AttributePath>,
    ) -> Self {
        Self::with_columns(partition_key.into(), Some(sort_key.into()))
    }

    /// Query on the columns of a table or index key schema.
    ///
    /// Fails with [`ExpressionError::MissingPartitionKey`] when the schema has
    /// no `HASH` element.
    pub fn from_key_schema(schema: &[KeySchemaElement]) -> ExpressionResult<Self> {
        let column = |key_type: KeyType| {
            schema
                .iter()
                .find(|e| e.key_type == key_type)
                .map(|e| AttributePath::from(&e.attribute_name))
        };
        let partition_key = column(KeyType::Hash).ok_or(ExpressionError::MissingPartitionKey)?;
        Ok(Self::with_columns(partition_key, column(KeyType::Range)))
    }

    fn with_columns(partition_key: AttributePath, sort_key: Option<AttributePath>) -> Self {
        let names = NameSession::new();
        let values = ValueSession::new();
        Self {
            partition_key,
            sort_key,
            filter_builder: ConditionBuilder::with_sessions(names.clone(), values.clone()),
            projection: ProjectionBuilder::with_session(names.clone()),
            names,
            values,
            partition: None,
            sort: None,
            filter: None,
        }
    }

    /// Partition key equality.
    pub fn key(&mut self, value: impl Into<ScalarValue>) -> ExpressionResult<&mut Self> {
        if self.partition.is_some() {
            return Err(ExpressionError::ConditionConflict(ConditionSlot::PartitionKey));
        }
        let predicate = Predicate::Compare {
            op: CompareOp::Eq,
            value: operand(value),
        };
        self.partition = Some(predicate.render(&self.partition_key, &self.names, &self.values)?);
        Ok(self)
    }

    fn sort_key_condition(&mut self, predicate: Predicate) -> ExpressionResult<&mut Self> {
        let Some(sort_key) = &self.sort_key else {
            return Err(ExpressionError::MissingSortColumn);
        };
        if self.sort.is_some() {
            return Err(ExpressionError::ConditionConflict(ConditionSlot::SortKey));
        }
        let parenthesize = matches!(predicate, Predicate::Between { .. });
        let rendered = predicate.render(sort_key, &self.names, &self.values)?;
        self.sort = Some(if parenthesize {
            format!("({rendered})")
        } else {
            rendered
        });
        Ok(self)
    }

    fn sort_key_compare(
        &mut self,
        op: CompareOp,
        value: impl Into<ScalarValue>,
    ) -> ExpressionResult<&mut Self> {
        self.sort_key_condition(Predicate::Compare {
            op,
            value: operand(value),
        })
    }

    /// Sort key `=`.
    pub fn equal(&mut self, value: impl Into<ScalarValue>) -> ExpressionResult<&mut Self> {
        self.sort_key_compare(CompareOp::Eq, value)
    }

    /// Sort key `<`.
    pub fn less_than(&mut self, value: impl Into<ScalarValue>) -> ExpressionResult<&mut Self> {
        self.sort_key_compare(CompareOp::Lt, value)
    }

    /// Sort key `<=`.
    pub fn less_than_or_equal(
        &mut self,
        value: impl Into<ScalarValue>,
    ) -> ExpressionResult<&mut Self> {
        self.sort_key_compare(CompareOp::Le, value)
    }

    /// Sort key `>`.
    pub fn greater_than(&mut self, value: impl Into<ScalarValue>) -> ExpressionResult<&mut Self> {
        self.sort_key_compare(CompareOp::Gt, value)
    }

    /// Sort key `>=`.
    pub fn greater_than_or_equal(
        &mut self,
        value: impl Into<ScalarValue>,
    ) -> ExpressionResult<&mut Self> {
        self.sort_key_compare(CompareOp::Ge, value)
    }

    /// Sort key prefix match.
    pub fn begins_with(&mut self, prefix: impl Into<ScalarValue>) -> ExpressionResult<&mut Self> {
        self.sort_key_condition(Predicate::BeginsWith(operand(prefix)))
    }

    /// Inclusive sort key range.
    pub fn between(
        &mut self,
        low: impl Into<ScalarValue>,
        high: impl Into<ScalarValue>,
    ) -> ExpressionResult<&mut Self> {
        self.sort_key_condition(Predicate::Between {
            low: operand(low),
            high: operand(high),
        })
    }

    /// Include `path` in the projection.
    pub fn project(&mut self, path: impl Into<AttributePath>) -> ExpressionResult<&mut Self> {
        self.projection.get(path)?;
        Ok(self)
    }

    /// Condition builder for the filter, sharing this query's sessions.
    #[must_use]
    pub fn filter(&self) -> &ConditionBuilder {
        &self.filter_builder
    }

    /// Attach a filter built with [`filter`](Self::filter).
    ///
    /// Fails with [`ExpressionError::ForeignSession`] if `condition` was not
    /// built on this query's sessions.
    pub fn filter_by(&mut self, condition: Condition) -> ExpressionResult<&mut Self> {
        if self.filter.is_some() {
            return Err(ExpressionError::ConditionConflict(ConditionSlot::Filter));
        }
        condition.ensure_built_on(&self.names, &self.values)?;
        self.filter = Some(condition.into_string());
        Ok(self)
    }

    /// Render the query. Finalizes both sessions.
    pub fn build(self) -> ExpressionResult<QueryExpression> {
        let partition = self.partition.ok_or(ExpressionError::MissingPartitionKey)?;
        let key_condition_expression = match self.sort {
            Some(sort) => format!("{partition} AND {sort}"),
            None => partition,
        };

        Ok(QueryExpression {
            key_condition_expression,
            filter_expression: self.filter,
            projection_expression: self.projection.text(),
            expression_attribute_names: self.names.names(),
            expression_attribute_values: self.values.values(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_query() -> QueryBuilder {
        QueryBuilder::with_sort_key("userId", "timestamp")
    }

    #[test]
    fn test_should_build_partition_and_sort_equality() {
        let mut query = user_query();
        query.key("u1").unwrap().equal(5).unwrap();

        let expression = query.build().unwrap();
        assert_eq!(expression.key_condition_expression, "#a0 = :v0 AND #a1 = :v1");
        assert_eq!(expression.expression_attribute_names["#a0"], "userId");
        assert_eq!(expression.expression_attribute_names["#a1"], "timestamp");
        assert_eq!(
            expression.expression_attribute_values[":v0"],
            AttributeValue::from("u1")
        );
        assert_eq!(
            expression.expression_attribute_values[":v1"],
            AttributeValue::from(5)
        );
        assert!(expression.filter_expression.is_none());
        assert!(expression.projection_expression.is_none());
    }

    fn sort_condition(
        apply: impl FnOnce(&mut QueryBuilder) -> ExpressionResult<&mut QueryBuilder>,
    ) -> String {
        let mut query = user_query();
        query.key("u1").unwrap();
        apply(&mut query).unwrap();
        query.build().unwrap().key_condition_expression
    }

    #[test]
    fn test_should_render_every_sort_operator() {
        assert_eq!(sort_condition(|q| q.equal(5)), "#a0 = :v0 AND #a1 = :v1");
        assert_eq!(sort_condition(|q| q.less_than(5)), "#a0 = :v0 AND #a1 < :v1");
        assert_eq!(
            sort_condition(|q| q.less_than_or_equal(5)),
            "#a0 = :v0 AND #a1 <= :v1"
        );
        assert_eq!(
            sort_condition(|q| q.greater_than(5)),
            "#a0 = :v0 AND #a1 > :v1"
        );
        assert_eq!(
            sort_condition(|q| q.greater_than_or_equal(5)),
            "#a0 = :v0 AND #a1 >= :v1"
        );
        assert_eq!(
            sort_condition(|q| q.begins_with("2024-")),
            "#a0 = :v0 AND begins_with(#a1, :v1)"
        );
    }

    #[test]
    fn test_should_parenthesize_between() {
        let mut query = user_query();
        query.key("u1").unwrap().between(10, 20).unwrap();

        let expression = query.build().unwrap();
        assert_eq!(
            expression.key_condition_expression,
            "#a0 = :v0 AND (#a1 BETWEEN :v1 AND :v2)"
        );
        assert_eq!(
            expression.expression_attribute_values[":v2"],
            AttributeValue::from(20)
        );
    }

    #[test]
    fn test_should_build_partition_only() {
        let mut query = QueryBuilder::new("userId");
        query.key("u1").unwrap();
        assert_eq!(query.build().unwrap().key_condition_expression, "#a0 = :v0");
    }

    #[test]
    fn test_should_include_projection() {
        let mut query = user_query();
        query
            .key("u1")
            .unwrap()
            .project(["order", "du9834"])
            .unwrap();

        let expression = query.build().unwrap();
        assert_eq!(expression.projection_expression.as_deref(), Some("#a1.#a2"));
        assert_eq!(expression.expression_attribute_names.len(), 3);
    }

    #[test]
    fn test_should_attach_filter() {
        let mut query = user_query();
        query.key("u1").unwrap().greater_than(100).unwrap();
        let f = query.filter();
        let filter = f.and([
            f.equal("status", "open").unwrap(),
            f.not_exists("deletedAt").unwrap(),
        ])
        .unwrap();
        query.filter_by(filter).unwrap();

        let expression = query.build().unwrap();
        assert_eq!(
            expression.key_condition_expression,
            "#a0 = :v0 AND #a1 > :v1"
        );
        assert_eq!(
            expression.filter_expression.as_deref(),
            Some("(#a2 = :v2) AND (attribute_not_exists(#a3))")
        );
        assert_eq!(expression.expression_attribute_names["#a3"], "deletedAt");
        assert_eq!(expression.expression_attribute_values.len(), 3);
    }

    #[test]
    fn test_should_reject_second_filter() {
        let mut query = user_query();
        let first = query.filter().exists("a").unwrap();
        let second = query.filter().exists("b").unwrap();
        query.filter_by(first).unwrap();
        assert!(matches!(
            query.filter_by(second),
            Err(ExpressionError::ConditionConflict(ConditionSlot::Filter))
        ));
    }

    #[test]
    fn test_should_reject_filter_from_foreign_session() {
        let mut query = user_query();
        query.key("u1").unwrap();
        let standalone = ConditionBuilder::new();
        let foreign = standalone.equal("status", "open").unwrap();
        assert_eq!(
            query.filter_by(foreign).map(|_| ()),
            Err(ExpressionError::ForeignSession)
        );

        let other = user_query();
        let foreign = other.filter().exists("deletedAt").unwrap();
        assert_eq!(
            query.filter_by(foreign).map(|_| ()),
            Err(ExpressionError::ForeignSession)
        );

        let own = query.filter().exists("deletedAt").unwrap();
        query.filter_by(own).unwrap();
        let expression = query.build().unwrap();
        assert_eq!(
            expression.filter_expression.as_deref(),
            Some("attribute_exists(#a1)")
        );
        assert_eq!(expression.expression_attribute_names["#a1"], "deletedAt");
    }

    #[test]
    fn test_should_reject_missing_partition_key() {
        let mut query = user_query();
        query.equal(5).unwrap();
        assert_eq!(query.build(), Err(ExpressionError::MissingPartitionKey));
    }

    #[test]
    fn test_should_reject_conflicting_conditions() {
        let mut query = user_query();
        query.key("u1").unwrap();
        assert!(matches!(
            query.key("u2"),
            Err(ExpressionError::ConditionConflict(ConditionSlot::PartitionKey))
        ));

        query.equal(1).unwrap();
        assert!(matches!(
            query.between(1, 2),
            Err(ExpressionError::ConditionConflict(ConditionSlot::SortKey))
        ));
    }

    #[test]
    fn test_should_reject_sort_condition_without_sort_column() {
        let mut query = QueryBuilder::new("userId");
        assert!(matches!(
            query.begins_with("x"),
            Err(ExpressionError::MissingSortColumn)
        ));
    }

    #[test]
    fn test_should_read_columns_from_key_schema() {
        let schema = [
            KeySchemaElement::range("timestamp"),
            KeySchemaElement::hash("userId"),
        ];
        let mut query = QueryBuilder::from_key_schema(&schema).unwrap();
        query.key("u1").unwrap().less_than(9).unwrap();

        let expression = query.build().unwrap();
        assert_eq!(expression.expression_attribute_names["#a0"], "userId");
        assert_eq!(expression.expression_attribute_names["#a1"], "timestamp");

        assert!(matches!(
            QueryBuilder::from_key_schema(&[KeySchemaElement::range("timestamp")]),
            Err(ExpressionError::MissingPartitionKey)
        ));
    }

    #[test]
    fn test_should_convert_to_query_input() {
        let mut query = user_query();
        query.key("u1").unwrap().project("total").unwrap();
        let expression = query.build().unwrap();

        let input = expression.to_query_input("orders", Some("byUser"));
        assert_eq!(input.table_name, "orders");
        assert_eq!(input.index_name.as_deref(), Some("byUser"));
        assert_eq!(input.scan_index_forward, Some(true));
        assert_eq!(input.key_condition_expression.as_deref(), Some("#a0 = :v0"));
        assert_eq!(input.projection_expression.as_deref(), Some("#a1"));
        assert!(input.exclusive_start_key.is_empty());
    }

    #[test]
    fn test_should_serialize_with_wire_field_names() {
        let mut query = QueryBuilder::new("userId");
        query.key("u1").unwrap();
        let json = serde_json::to_value(query.build().unwrap()).unwrap();
        assert_eq!(json["KeyConditionExpression"], "#a0 = :v0");
        assert_eq!(json["ExpressionAttributeValues"][":v0"]["S"], "u1");
        assert!(json.get("FilterExpression").is_none());
    }
}
