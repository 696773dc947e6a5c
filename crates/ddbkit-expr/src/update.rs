//! Update expression builder.
//!
//! Collects `SET` and `REMOVE` clauses over distinct attribute paths and
//! renders them as `SET a, b REMOVE c, d`. A companion condition builder shares
//! the same sessions so the guard condition of a conditional update numbers
//! its placeholders consistently with the update itself.

use std::collections::HashSet;

use ddbkit_model::{
    AttributeValue, ExpressionAttributeNames, ExpressionAttributeValues, Key, UpdateItemInput,
};
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionBuilder};
use crate::error::{ConditionSlot, ExpressionError, ExpressionResult};
use crate::path::AttributePath;
use crate::session::{NameSession, ValueSession};

/// Where appended elements go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPosition {
    /// Prepend to the existing list.
    Start,
    /// Append to the existing list.
    #[default]
    End,
}

/// A single update operation on one attribute path.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// `path = value`.
    Set(AttributeValue),
    /// Remove the attribute.
    Remove,
    /// `path = list_append(...)`.
    ListAppend {
        /// Element or list to append. Non-list values are wrapped.
        value: AttributeValue,
        /// Which end of the list receives the value.
        position: ListPosition,
        /// Treat a missing attribute as an empty list.
        allow_list_init: bool,
    },
}

/// An update together with the finalized placeholder dictionaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateExpression {
    /// `SET ... REMOVE ...` text.
    pub update_expression: String,
    /// Guard attached with [`UpdateBuilder::condition_by`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// `#a<N>` -> attribute name.
    pub expression_attribute_names: ExpressionAttributeNames,
    /// `:v<N>` -> attribute value.
    pub expression_attribute_values: ExpressionAttributeValues,
}

impl UpdateExpression {
    /// Turn the expression into an `UpdateItem` request.
    #[must_use]
    pub fn into_update_item_input(
        self,
        table_name: impl Into<String>,
        key: Key,
    ) -> UpdateItemInput {
        UpdateItemInput {
            table_name: table_name.into(),
            key,
            update_expression: Some(self.update_expression),
            condition_expression: self.condition_expression,
            expression_attribute_names: self.expression_attribute_names,
            expression_attribute_values: self.expression_attribute_values,
            return_values: None,
        }
    }
}

/// Builder for update expressions.
///
/// Not `Clone`: a copy would share the sessions and number placeholders from
/// the same counters as the builder it was copied from.
///
/// ```compile_fail
/// let update = ddbkit_expr::UpdateBuilder::new();
/// let _copy = update.clone();
/// ```
#[derive(Debug)]
pub struct UpdateBuilder {
    names: NameSession,
    values: ValueSession,
    visited: HashSet<String>,
    set: Vec<String>,
    remove: Vec<String>,
    condition: ConditionBuilder,
    guard: Option<String>,
}

impl Default for UpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateBuilder {
    /// Builder with its own fresh sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sessions(NameSession::new(), ValueSession::new())
    }

    /// Builder drawing placeholders from existing sessions.
    #[must_use]
    pub fn with_sessions(names: NameSession, values: ValueSession) -> Self {
        Self {
            condition: ConditionBuilder::with_sessions(names.clone(), values.clone()),
            names,
            values,
            visited: HashSet::new(),
            set: Vec::new(),
            remove: Vec::new(),
            guard: None,
        }
    }

    /// Condition builder sharing this builder's sessions.
    ///
    /// Conditions must be composed before [`build`](Self::build).
    #[must_use]
    pub fn condition(&self) -> &ConditionBuilder {
        &self.condition
    }

    /// Attach a guard built with [`condition`](Self::condition).
    ///
    /// Fails with [`ExpressionError::ForeignSession`] if `condition` was not
    /// built on this builder's sessions, and with
    /// [`ExpressionError::ConditionConflict`] on a second call.
    pub fn condition_by(&mut self, condition: Condition) -> ExpressionResult<&mut Self> {
        if self.guard.is_some() {
            return Err(ExpressionError::ConditionConflict(ConditionSlot::Guard));
        }
        condition.ensure_built_on(&self.names, &self.values)?;
        self.guard = Some(condition.into_string());
        Ok(self)
    }

    /// Register `action` on `path`.
    pub fn apply(
        &mut self,
        path: impl Into<AttributePath>,
        action: UpdateAction,
    ) -> ExpressionResult<&mut Self> {
        let path = path.into();
        let identity = path.identity();
        if self.visited.contains(&identity) {
            return Err(ExpressionError::DuplicatePath(identity));
        }

        let operand = path.placeholder(&self.names)?;
        match action {
            UpdateAction::Set(value) => {
                let value = self.values.value_id(value)?;
                self.set.push(format!("{operand} = {value}"));
            }
            UpdateAction::Remove => self.remove.push(operand),
            UpdateAction::ListAppend {
                value,
                position,
                allow_list_init,
            } => {
                let value = self.values.value_id(value.into_list())?;
                let source = if allow_list_init {
                    let empty = self.values.value_id(AttributeValue::L(Vec::new()))?;
                    format!("if_not_exists({operand}, {empty})")
                } else {
                    operand.clone()
                };
                let appended = match position {
                    ListPosition::Start => format!("list_append({value}, {source})"),
                    ListPosition::End => format!("list_append({source}, {value})"),
                };
                self.set.push(format!("{operand} = {appended}"));
            }
        }
        self.visited.insert(identity);
        Ok(self)
    }

    /// `SET path = value`.
    pub fn set(
        &mut self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<&mut Self> {
        self.apply(path, UpdateAction::Set(value.into()))
    }

    /// `REMOVE path`.
    pub fn delete(&mut self, path: impl Into<AttributePath>) -> ExpressionResult<&mut Self> {
        self.apply(path, UpdateAction::Remove)
    }

    /// Append to the end of a list, creating it when missing.
    pub fn append(
        &mut self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> ExpressionResult<&mut Self> {
        self.append_with(path, value, ListPosition::End, true)
    }

    /// Append with explicit position and list initialisation.
    pub fn append_with(
        &mut self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
        position: ListPosition,
        allow_list_init: bool,
    ) -> ExpressionResult<&mut Self> {
        self.apply(
            path,
            UpdateAction::ListAppend {
                value: value.into(),
                position,
                allow_list_init,
            },
        )
    }

    /// Whether at least one clause is registered.
    #[must_use]
    pub fn has_update(&self) -> bool {
        !self.set.is_empty() || !self.remove.is_empty()
    }

    /// Render the expression. Finalizes both sessions.
    pub fn build(self) -> ExpressionResult<UpdateExpression> {
        if !self.has_update() {
            return Err(ExpressionError::EmptyUpdate);
        }

        let mut sections = Vec::with_capacity(2);
        if !self.set.is_empty() {
            sections.push(format!("SET {}", self.set.join(", ")));
        }
        if !self.remove.is_empty() {
            sections.push(format!("REMOVE {}", self.remove.join(", ")));
        }

        Ok(UpdateExpression {
            update_expression: sections.join(" "),
            condition_expression: self.guard,
            expression_attribute_names: self.names.names(),
            expression_attribute_values: self.values.values(),
        })
    }
}
