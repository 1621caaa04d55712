use std::cmp::Ordering;
use std::fmt;
use crate::core::{DbError, Node, Result};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Node(Node),
}

impl Value {
    /// Total order used by `ORDER BY`.
    ///
    /// NULL sorts after every other value; integers and floats are compared
    /// numerically. Anything else across types is a type mismatch.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Greater),
            (_, Value::Null) => Ok(Ordering::Less),

            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(compare_floats(*a, *b)),
            (Value::Integer(a), Value::Float(b)) => Ok(compare_floats(*a as f64, *b)),
            (Value::Float(a), Value::Integer(b)) => Ok(compare_floats(*a, *b as f64)),

            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (Value::Node(a), Value::Node(b)) => Ok(a.id.cmp(&b.id)),

            _ => Err(DbError::TypeMismatch(format!(
                "Cannot compare incompatible types: {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Node(_) => "NODE",
        }
    }

    pub fn as_string(&self) -> Result<String> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            other => Err(self.mismatch("TEXT", other)),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Self::Integer(i) => Ok(*i),
            other => Err(self.mismatch("INTEGER", other)),
        }
    }

    pub fn as_node(&self) -> Result<&Node> {
        match self {
            Self::Node(node) => Ok(node),
            other => Err(self.mismatch("NODE", other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn mismatch(&self, expected: &str, actual: &Value) -> DbError {
        DbError::TypeMismatch(format!("expected {}, got {}", expected, actual.type_name()))
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    // NaN sorts after every number, equal to itself
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            (Self::Node(a), Self::Node(b)) => a.id == b.id,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Node(node) => write!(f, "{}", node),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Text("apple".into()), Value::Text("kiwi".into()));
    }

    #[test]
    fn test_compare_sorts_null_last() {
        let mut values = vec![
            Value::Null,
            Value::Text("cherry".into()),
            Value::Text("apple".into()),
        ];
        values.sort_by(|a, b| a.compare(b).unwrap());
        assert_eq!(
            values,
            vec![
                Value::Text("apple".into()),
                Value::Text("cherry".into()),
                Value::Null
            ]
        );
    }

    #[test]
    fn test_compare_rejects_mixed_types() {
        let err = Value::Text("a".into()).compare(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch(_)));
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Value::from("kiwi").as_string().unwrap(), "kiwi");
        assert_eq!(Value::Integer(7).as_i64().unwrap(), 7);
        assert!(matches!(Value::Null.as_string(), Err(DbError::TypeMismatch(_))));
        assert!(Value::Integer(1).as_node().is_err());
    }
}
