// ============================================================================
// Write Transactions
// ============================================================================
//
// A WriteTransaction borrows the store mutably for its whole lifetime and
// records each change it applies. `commit` keeps the changes; `rollback`,
// or dropping the transaction uncommitted, undoes them in reverse order.
//
// ============================================================================

pub mod change;

pub use change::Change;

use crate::core::{Node, NodeId, Result};
use crate::storage::{GraphStore, UniqueConstraint};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Whether a transaction may mutate the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

pub struct WriteTransaction<'a> {
    id: TransactionId,
    store: &'a mut GraphStore,
    changes: Vec<Change>,
    finished: bool,
}

impl<'a> WriteTransaction<'a> {
    pub fn begin(store: &'a mut GraphStore) -> Self {
        Self {
            id: TransactionId::new(),
            store,
            changes: Vec::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn store(&self) -> &GraphStore {
        &*self.store
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Allocate an id and insert a node with the given properties
    pub fn create_node(&mut self, mut node: Node) -> Result<Node> {
        node.id = self.store.allocate_id();
        self.store.insert_node(node.clone())?;
        self.changes.push(Change::CreateNode { id: node.id });
        Ok(node)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.store.remove_node(id)?;
        self.changes.push(Change::DeleteNode { node: node.clone() });
        Some(node)
    }

    /// Returns `false` when the constraint already existed
    pub fn create_constraint(&mut self, constraint: UniqueConstraint) -> Result<bool> {
        let added = self.store.add_constraint(constraint.clone())?;
        if added {
            self.changes.push(Change::CreateConstraint { constraint });
        }
        Ok(added)
    }

    pub fn commit(mut self) {
        debug!(txn = %self.id, changes = self.changes.len(), "transaction committed");
        self.changes.clear();
        self.finished = true;
    }

    pub fn rollback(mut self) {
        self.undo_all();
    }

    fn undo_all(&mut self) {
        if self.finished {
            return;
        }
        let undone = self.changes.len();
        while let Some(change) = self.changes.pop() {
            debug!(txn = %self.id, change = %change.description(), "undo");
            change.undo(self.store);
        }
        self.finished = true;
        debug!(txn = %self.id, undone, "transaction rolled back");
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        self.undo_all();
    }
}
