use crate::core::{DbError, Result, Value};
use std::sync::Arc;

/// One result row: values keyed by the statement's RETURN aliases
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(keys: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| DbError::KeyNotFound(key.to_string()))
    }

    /// Move the value for `key` out of the record
    pub fn take(mut self, key: &str) -> Result<Value> {
        let idx = self
            .keys
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| DbError::KeyNotFound(key.to_string()))?;
        Ok(self.values.swap_remove(idx))
    }
}

/// Counters describing what a write changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub nodes_created: usize,
    pub nodes_deleted: usize,
    pub constraints_added: usize,
}

#[derive(Debug)]
pub struct QueryResult {
    pub keys: Arc<[String]>,
    pub records: Vec<Record>,
    pub counters: Counters,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            keys: Arc::from(Vec::<String>::new()),
            records: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn new(keys: Arc<[String]>, records: Vec<Record>, counters: Counters) -> Self {
        Self {
            keys,
            records,
            counters,
        }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let keys: Arc<[String]> = Arc::from(vec!["name".to_string(), "id(f)".to_string()]);
        Record::new(keys, vec![Value::from("apple"), Value::Integer(3)])
    }

    #[test]
    fn test_get_by_key() {
        let record = record();
        assert_eq!(record.get("name").unwrap().as_string().unwrap(), "apple");
        assert_eq!(record.get("id(f)").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn test_missing_key() {
        let err = record().get("weight").unwrap_err();
        assert!(matches!(err, DbError::KeyNotFound(key) if key == "weight"));
        assert!(record().take("weight").is_err());
        assert_eq!(record().take("id(f)").unwrap(), Value::Integer(3));
    }
}
