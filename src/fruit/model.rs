use crate::core::{DbError, Node, NodeId, Result, Value};
use crate::result::Record;
use serde::{Deserialize, Serialize};

pub const FRUIT_LABEL: &str = "Fruit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub id: NodeId,
    pub name: String,
}

impl Fruit {
    pub fn from_node(node: &Node) -> Result<Self> {
        if !node.has_label(FRUIT_LABEL) {
            return Err(DbError::Mapping(format!(
                "node {} is not a :{}",
                node.id, FRUIT_LABEL
            )));
        }

        let name = match node.properties.get("name") {
            Some(Value::Text(name)) => name.clone(),
            Some(other) => {
                return Err(DbError::Mapping(format!(
                    "fruit {} has a {} name",
                    node.id,
                    other.type_name()
                )));
            }
            None => {
                return Err(DbError::Mapping(format!("fruit {} has no name", node.id)));
            }
        };

        Ok(Self { id: node.id, name })
    }

    /// Map the node returned under `key`
    pub fn from_record(record: Record, key: &str) -> Result<Self> {
        match record.take(key).map_err(DbError::mapping)? {
            Value::Node(node) => Self::from_node(&node),
            other => Err(DbError::Mapping(format!(
                "expected a node under `{}`, got {}",
                key,
                other.type_name()
            ))),
        }
    }

    /// Path the fruit is served under
    pub fn location(&self) -> String {
        format!("/fruits/{}", self.id)
    }
}

/// Request body for creating a fruit
#[derive(Debug, Clone, Deserialize)]
pub struct NewFruit {
    pub name: String,
}

impl NewFruit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::Validation("name must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_from_node() {
        let node = Node::new(4, FRUIT_LABEL).with_property("name", "kiwi");
        let fruit = Fruit::from_node(&node).unwrap();
        assert_eq!(fruit, Fruit { id: 4, name: "kiwi".into() });
        assert_eq!(fruit.location(), "/fruits/4");
    }

    #[test]
    fn test_from_node_rejects_bad_shapes() {
        let shapes = [
            Node::new(1, FRUIT_LABEL),
            Node::new(1, FRUIT_LABEL).with_property("name", 3i64),
            Node::new(1, "Vegetable").with_property("name", "leek"),
        ];
        for node in &shapes {
            assert!(matches!(Fruit::from_node(node), Err(DbError::Mapping(_))));
        }
    }

    #[test]
    fn test_from_record() {
        let keys: Arc<[String]> = Arc::from(vec!["f".to_string()]);
        let node = Node::new(9, FRUIT_LABEL).with_property("name", "plum");
        let record = Record::new(Arc::clone(&keys), vec![Value::Node(node)]);
        assert_eq!(Fruit::from_record(record, "f").unwrap().name, "plum");

        let record = Record::new(Arc::clone(&keys), vec![Value::from("plum")]);
        assert!(matches!(Fruit::from_record(record.clone(), "f"), Err(DbError::Mapping(_))));
        assert!(matches!(Fruit::from_record(record, "g"), Err(DbError::Mapping(_))));
    }

    #[test]
    fn test_blank_name_is_invalid() {
        assert!(NewFruit::new("  ").validate().is_err());
        assert!(NewFruit::new("fig").validate().is_ok());
    }
}
