//! Change tracking for operation application.
//!
//! Every entry an operation creates or modifies is recorded in a
//! [`LedgerDelta`] owned by the [`LedgerStateManager`](crate::LedgerStateManager).
//! The surrounding ledger engine reads the delta after a successful
//! application and commits it as one unit.
//!
//! # Change Ordering
//!
//! The order of recorded changes is significant. For a trade it is:
//!
//! ```text
//! +---------------------------+
//! | buyer buying leg          |  <- updated
//! | buyer selling leg         |  <- updated
//! | seller buying leg         |  <- updated
//! | seller selling leg        |  <- updated
//! +---------------------------+
//! | offer                     |  <- created
//! | source account            |  <- updated (touch)
//! +---------------------------+
//! ```
//!
//! [`LedgerDelta::change_order`] preserves this interleaving, and
//! [`LedgerDelta::changes`] replays it.

use stellar_xdr::curr::LedgerEntry;

/// Reference to a change in a [`LedgerDelta`], preserving execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeRef {
    /// Index into the delta's created entries vector.
    Created(usize),
    /// Index into the delta's updated entries vector.
    Updated(usize),
}

/// A recorded change, borrowed from a [`LedgerDelta`].
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    /// An entry that did not exist before.
    Created(&'a LedgerEntry),
    /// An entry that changed, with its value before and after.
    Updated {
        pre: &'a LedgerEntry,
        post: &'a LedgerEntry,
    },
}

impl<'a> Change<'a> {
    /// The entry as it stands after the change.
    pub fn entry(&self) -> &'a LedgerEntry {
        match *self {
            Change::Created(entry) => entry,
            Change::Updated { post, .. } => post,
        }
    }
}

/// Captured vector lengths for scope rollback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaLengths {
    pub created: usize,
    pub updated: usize,
    pub change_order: usize,
}

/// Accumulator for ledger state changes during operation execution.
///
/// - **Created**: new entries (offers)
/// - **Updated**: modified entries, stored with both pre-state and post-state
#[derive(Clone, Debug, Default)]
pub struct LedgerDelta {
    /// Ledger sequence this delta applies to.
    ledger_seq: u32,
    /// Entries created.
    created: Vec<LedgerEntry>,
    /// Entries updated (post-state after modification).
    updated: Vec<LedgerEntry>,
    /// Pre-state for each updated entry. Parallel to `updated`.
    update_states: Vec<LedgerEntry>,
    /// Order in which changes were recorded.
    change_order: Vec<ChangeRef>,
}

impl LedgerDelta {
    /// Create a new delta for the given ledger sequence.
    pub fn new(ledger_seq: u32) -> Self {
        Self {
            ledger_seq,
            ..Self::default()
        }
    }

    /// Get the ledger sequence.
    pub fn ledger_seq(&self) -> u32 {
        self.ledger_seq
    }

    /// Record a created entry.
    pub fn record_create(&mut self, entry: LedgerEntry) {
        let idx = self.created.len();
        self.created.push(entry);
        self.change_order.push(ChangeRef::Created(idx));
    }

    /// Record an updated entry with its pre-state.
    ///
    /// `pre_state` is the entry value BEFORE the modification.
    /// `post_state` is the entry value AFTER the modification.
    pub fn record_update(&mut self, pre_state: LedgerEntry, post_state: LedgerEntry) {
        let idx = self.updated.len();
        self.update_states.push(pre_state);
        self.updated.push(post_state);
        self.change_order.push(ChangeRef::Updated(idx));
    }

    /// Get all created entries.
    pub fn created_entries(&self) -> &[LedgerEntry] {
        &self.created
    }

    /// Get all updated entries (post-state after modification).
    pub fn updated_entries(&self) -> &[LedgerEntry] {
        &self.updated
    }

    /// Get all update pre-states. Parallel to `updated_entries()`.
    pub fn update_states(&self) -> &[LedgerEntry] {
        &self.update_states
    }

    /// Get the change order.
    pub fn change_order(&self) -> &[ChangeRef] {
        &self.change_order
    }

    /// Replay the recorded changes in execution order.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> + '_ {
        self.change_order.iter().map(move |change| match *change {
            ChangeRef::Created(idx) => Change::Created(&self.created[idx]),
            ChangeRef::Updated(idx) => Change::Updated {
                pre: &self.update_states[idx],
                post: &self.updated[idx],
            },
        })
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    /// Check if this delta has any changes.
    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }

    /// Capture the current vector lengths for scope rollback.
    pub fn snapshot_lengths(&self) -> DeltaLengths {
        DeltaLengths {
            created: self.created.len(),
            updated: self.updated.len(),
            change_order: self.change_order.len(),
        }
    }

    /// Truncate all vectors back to the given lengths.
    pub fn truncate_to(&mut self, lengths: &DeltaLengths) {
        self.created.truncate(lengths.created);
        self.updated.truncate(lengths.updated);
        self.update_states.truncate(lengths.updated);
        self.change_order.truncate(lengths.change_order);
    }
}
