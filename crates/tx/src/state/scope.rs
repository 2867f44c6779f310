//! Nested, all-or-nothing scopes over [`LedgerStateManager`].
//!
//! A scope remembers the value every entry had when the scope first touched
//! it, the delta length, and the id pool. Committing hands the remembered
//! values to the parent scope (which keeps its own older values); dropping an
//! uncommitted scope writes them back.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use super::{EntryKey, EntrySnapshot, LedgerStateManager};
use crate::apply::DeltaLengths;

/// Rollback information for one open scope.
#[derive(Debug, Clone)]
pub(crate) struct ScopeFrame {
    snapshots: BTreeMap<EntryKey, EntrySnapshot>,
    delta_lengths: DeltaLengths,
    id_pool: u64,
}

impl ScopeFrame {
    pub(crate) fn new(delta_lengths: DeltaLengths, id_pool: u64) -> Self {
        Self {
            snapshots: BTreeMap::new(),
            delta_lengths,
            id_pool,
        }
    }

    pub(crate) fn contains(&self, key: &EntryKey) -> bool {
        self.snapshots.contains_key(key)
    }

    pub(crate) fn insert(&mut self, key: EntryKey, snapshot: EntrySnapshot) {
        self.snapshots.insert(key, snapshot);
    }

    /// Merge a committed child frame; values this frame already holds win.
    pub(crate) fn absorb(&mut self, child: ScopeFrame) {
        for (key, snapshot) in child.snapshots {
            self.snapshots.entry(key).or_insert(snapshot);
        }
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<EntryKey, EntrySnapshot>, DeltaLengths, u64) {
        (self.snapshots, self.delta_lengths, self.id_pool)
    }
}

/// Guard for a nested scope, created by [`LedgerStateManager::begin_scope`].
///
/// Derefs to the state manager, so operations run against the guard exactly
/// as they would against the manager. Scopes nest: calling `begin_scope` on a
/// guard opens an inner scope whose changes fold into this one on commit.
///
/// ```
/// use newtrade_tx::LedgerStateManager;
///
/// let mut state = LedgerStateManager::new(1, 0);
/// {
///     let mut scope = state.begin_scope();
///     scope.next_id().unwrap();
///     // dropped without commit
/// }
/// assert_eq!(state.id_pool(), 0);
/// ```
#[must_use = "a scope that is dropped immediately rolls back"]
pub struct StateScope<'a> {
    state: &'a mut LedgerStateManager,
    depth: usize,
    open: bool,
}

impl<'a> StateScope<'a> {
    pub(crate) fn new(state: &'a mut LedgerStateManager, depth: usize) -> Self {
        Self {
            state,
            depth,
            open: true,
        }
    }

    /// Keep every change made in this scope.
    pub fn commit(mut self) {
        self.open = false;
        self.state.commit_scope(self.depth);
    }

    /// Discard every change made in this scope.
    ///
    /// Equivalent to dropping the guard.
    pub fn rollback(mut self) {
        self.open = false;
        self.state.rollback_scope(self.depth);
    }

    /// Nesting depth of this scope (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Deref for StateScope<'_> {
    type Target = LedgerStateManager;

    fn deref(&self) -> &LedgerStateManager {
        self.state
    }
}

impl DerefMut for StateScope<'_> {
    fn deref_mut(&mut self) -> &mut LedgerStateManager {
        self.state
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        if self.open {
            self.state.rollback_scope(self.depth);
        }
    }
}
