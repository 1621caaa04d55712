use crate::core::{DbError, Node, NodeId, Result, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Uniqueness constraint over `(label, property)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniqueConstraint {
    pub label: String,
    pub property: String,
}

impl UniqueConstraint {
    pub fn new(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
        }
    }

    fn applies_to(&self, node: &Node) -> Option<Value> {
        if !node.has_label(&self.label) {
            return None;
        }
        node.properties
            .get(&self.property)
            .filter(|value| !value.is_null())
            .cloned()
    }
}

/// In-memory labelled property graph
///
/// Nodes are kept in id order. Ids are allocated monotonically and never
/// reused, even when the node that held one is removed or rolled back.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, Node>,
    next_id: NodeId,
    constraints: BTreeSet<UniqueConstraint>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |node| node.has_label(label))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn constraints(&self) -> impl Iterator<Item = &UniqueConstraint> {
        self.constraints.iter()
    }

    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert a node after checking every applicable unique constraint
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(DbError::ExecutionError(format!(
                "node {} already exists",
                node.id
            )));
        }

        for constraint in &self.constraints {
            if let Some(value) = constraint.applies_to(&node) {
                self.ensure_unique(constraint, &value, node.id)?;
            }
        }

        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    /// Register a unique constraint
    ///
    /// Returns `false` when an identical constraint already exists. Fails when
    /// the existing data already violates it.
    pub fn add_constraint(&mut self, constraint: UniqueConstraint) -> Result<bool> {
        if self.constraints.contains(&constraint) {
            return Ok(false);
        }

        // same equality as `ensure_unique`, so 2 and 2.0 clash here too
        let mut seen: Vec<Value> = Vec::new();
        for node in self.nodes_with_label(&constraint.label) {
            if let Some(value) = constraint.applies_to(node) {
                if seen.contains(&value) {
                    return Err(DbError::ConstraintViolation(format!(
                        "existing :{} nodes share {} = '{}'",
                        constraint.label, constraint.property, value
                    )));
                }
                seen.push(value);
            }
        }

        self.constraints.insert(constraint);
        Ok(true)
    }

    pub fn remove_constraint(&mut self, constraint: &UniqueConstraint) -> bool {
        self.constraints.remove(constraint)
    }

    fn ensure_unique(&self, constraint: &UniqueConstraint, value: &Value, id: NodeId) -> Result<()> {
        let clash = self
            .nodes_with_label(&constraint.label)
            .find(|other| other.id != id && other.properties.get(&constraint.property) == Some(value));

        match clash {
            Some(other) => Err(DbError::ConstraintViolation(format!(
                "node {} already exists with label `{}` and property `{}` = '{}'",
                other.id, constraint.label, constraint.property, value
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit(store: &mut GraphStore, name: &str) -> Node {
        let id = store.allocate_id();
        Node::new(id, "Fruit").with_property("name", name)
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut store = GraphStore::new();
        let apple = fruit(&mut store, "apple");
        store.insert_node(apple.clone()).unwrap();
        store.remove_node(apple.id);

        let pear = fruit(&mut store, "pear");
        assert_eq!(apple.id, 0);
        assert_eq!(pear.id, 1);
    }

    #[test]
    fn test_unique_constraint_rejects_duplicate() {
        let mut store = GraphStore::new();
        assert!(store.add_constraint(UniqueConstraint::new("Fruit", "name")).unwrap());
        assert!(!store.add_constraint(UniqueConstraint::new("Fruit", "name")).unwrap());

        let kiwi = fruit(&mut store, "kiwi");
        store.insert_node(kiwi).unwrap();
        let again = fruit(&mut store, "kiwi");
        let err = store.insert_node(again).unwrap_err();

        assert!(matches!(err, DbError::ConstraintViolation(_)));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_constraint_ignores_other_labels() {
        let mut store = GraphStore::new();
        store.add_constraint(UniqueConstraint::new("Fruit", "name")).unwrap();

        let kiwi = fruit(&mut store, "kiwi");
        store.insert_node(kiwi).unwrap();
        let id = store.allocate_id();
        store
            .insert_node(Node::new(id, "Bird").with_property("name", "kiwi"))
            .unwrap();

        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_constraint_over_violating_data_fails() {
        let mut store = GraphStore::new();
        for name in ["fig", "fig"] {
            let node = fruit(&mut store, name);
            store.insert_node(node).unwrap();
        }

        let err = store
            .add_constraint(UniqueConstraint::new("Fruit", "name"))
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
        assert_eq!(store.constraints().count(), 0);
    }

    #[test]
    fn test_constraint_treats_equal_numbers_as_duplicates() {
        let mut store = GraphStore::new();
        for weight in [Value::Integer(2), Value::Float(2.0)] {
            let id = store.allocate_id();
            store
                .insert_node(Node::new(id, "Fruit").with_property("weight", weight))
                .unwrap();
        }

        let err = store
            .add_constraint(UniqueConstraint::new("Fruit", "weight"))
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
        assert_eq!(store.constraints().count(), 0);

        let mut store = GraphStore::new();
        store.add_constraint(UniqueConstraint::new("Fruit", "weight")).unwrap();
        let id = store.allocate_id();
        store
            .insert_node(Node::new(id, "Fruit").with_property("weight", 2i64))
            .unwrap();
        let id = store.allocate_id();
        let err = store
            .insert_node(Node::new(id, "Fruit").with_property("weight", 2.0))
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }
}
