// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Every mutation a write transaction applies to the graph is recorded as a
// Change. Rolling back undoes the log in reverse order.
//
// ============================================================================

use crate::core::{Node, NodeId};
use crate::storage::{GraphStore, UniqueConstraint};

/// A single reversible change applied to the store
#[derive(Debug, Clone)]
pub enum Change {
    /// A node was inserted
    CreateNode { id: NodeId },

    /// A node was removed; keeps the full node for restoration
    DeleteNode { node: Node },

    /// A unique constraint was registered
    CreateConstraint { constraint: UniqueConstraint },
}

impl Change {
    /// Reverse this change against the store
    pub fn undo(self, store: &mut GraphStore) {
        match self {
            Change::CreateNode { id } => {
                store.remove_node(id);
            }
            Change::DeleteNode { node } => {
                // Constraints held when the node was removed; re-inserting it
                // cannot clash once later changes are undone.
                let _ = store.insert_node(node);
            }
            Change::CreateConstraint { constraint } => {
                store.remove_constraint(&constraint);
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            Change::CreateNode { id } => format!("CREATE node {}", id),
            Change::DeleteNode { node } => format!("DELETE node {}", node.id),
            Change::CreateConstraint { constraint } => format!(
                "CREATE CONSTRAINT :{}({})",
                constraint.label, constraint.property
            ),
        }
    }
}
