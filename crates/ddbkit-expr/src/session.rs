//! Placeholder sessions.
//!
//! A session owns the placeholder table for one logical request. Every builder
//! that takes part in that request (key condition, filter, projection, update,
//! guard condition) draws from the same pair of sessions, so numbering stays
//! consistent across all of them.
//!
//! Sessions are handles: cloning one hands out another reference to the same
//! table. They are meant for a single logical thread and carry no locking.
//!
//! Reading a session's dictionary finalizes it. Any allocation afterwards
//! fails with [`ExpressionError::SessionFinalized`], because a predicate
//! composed after the snapshot would reference placeholders the snapshot does
//! not contain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ddbkit_model::{AttributeValue, ExpressionAttributeNames, ExpressionAttributeValues};

use crate::error::{ExpressionError, ExpressionResult, SessionKind};

#[derive(Debug, Default)]
struct NameTable {
    // segment -> placeholder
    ids: HashMap<String, String>,
    finalized: bool,
}

/// Allocator for `#a<N>` attribute name placeholders.
///
/// The same segment always maps to the same placeholder within one session.
#[derive(Debug, Clone, Default)]
pub struct NameSession {
    inner: Rc<RefCell<NameTable>>,
}

impl NameSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for `segment`, minting `#a<N>` on first use.
    pub fn name_id(&self, segment: &str) -> ExpressionResult<String> {
        let mut table = self.inner.borrow_mut();
        if table.finalized {
            return Err(ExpressionError::SessionFinalized {
                kind: SessionKind::Name,
            });
        }
        if let Some(id) = table.ids.get(segment) {
            return Ok(id.clone());
        }
        let id = format!("#a{}", table.ids.len());
        table.ids.insert(segment.to_owned(), id.clone());
        Ok(id)
    }

    /// Snapshot of `placeholder -> segment`. Finalizes the session.
    pub fn names(&self) -> ExpressionAttributeNames {
        let mut table = self.inner.borrow_mut();
        table.finalized = true;
        table
            .ids
            .iter()
            .map(|(segment, id)| (id.clone(), segment.clone()))
            .collect()
    }

    /// Whether the dictionary has been read out.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.inner.borrow().finalized
    }

    /// Number of distinct segments allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().ids.len()
    }

    /// Whether no segment has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same table.
    #[must_use]
    pub fn shares_table(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[derive(Debug, Default)]
struct ValueTable {
    values: Vec<(String, AttributeValue)>,
    finalized: bool,
}

/// Allocator for `:v<N>` attribute value placeholders.
///
/// Values are never memoized: every call mints a new placeholder, even for a
/// literal identical to one already allocated.
#[derive(Debug, Clone, Default)]
pub struct ValueSession {
    inner: Rc<RefCell<ValueTable>>,
}

impl ValueSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh `:v<N>` placeholder bound to `value`.
    pub fn value_id(&self, value: impl Into<AttributeValue>) -> ExpressionResult<String> {
        let mut table = self.inner.borrow_mut();
        if table.finalized {
            return Err(ExpressionError::SessionFinalized {
                kind: SessionKind::Value,
            });
        }
        let id = format!(":v{}", table.values.len());
        table.values.push((id.clone(), value.into()));
        Ok(id)
    }

    /// Snapshot of `placeholder -> value`. Finalizes the session.
    pub fn values(&self) -> ExpressionAttributeValues {
        let mut table = self.inner.borrow_mut();
        table.finalized = true;
        table.values.iter().cloned().collect()
    }

    /// Whether the dictionary has been read out.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.inner.borrow().finalized
    }

    /// Number of values allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().values.len()
    }

    /// Whether no value has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same table.
    #[must_use]
    pub fn shares_table(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
