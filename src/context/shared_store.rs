// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Ready-made shared context: string keys mapped to JSON values.
///
/// The engine is generic over the shared context type and never locks it.
/// `SharedStore` is for applications that want the open key/value shape without
/// designing their own struct. Each call takes the lock for the duration of that
/// call only, so no guard is ever held across an `.await`.
///
/// Read-modify-write sequences spanning several calls are not atomic; use
/// [`SharedStore::update`] or index-addressed keys when parallel iterations write
/// to the same logical slot.
#[derive(Debug, Default)]
pub struct SharedStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Atomically read-modify-write one entry. `Value::Null` is passed in when absent.
    pub fn update<F>(&self, key: &str, f: F) -> Value
    where
        F: FnOnce(Value) -> Value,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let current = entries.remove(key).unwrap_or(Value::Null);
        let next = f(current);
        entries.insert(key.to_string(), next.clone());
        next
    }

    /// Append to the array stored at `key`, creating it when missing.
    pub fn push(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        self.update(key, move |current| match current {
            Value::Array(mut items) => {
                items.push(value);
                Value::Array(items)
            }
            Value::Null => Value::Array(vec![value]),
            other => Value::Array(vec![other, value]),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the whole store, for assertions and reporting.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let store = SharedStore::new();
        assert!(store.insert("answer", 42).is_none());
        assert_eq!(store.get("answer"), Some(json!(42)));
        assert!(store.contains_key("answer"));
        assert_eq!(store.remove("answer"), Some(json!(42)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_counter() {
        let store = SharedStore::new();
        for _ in 0..3 {
            store.update("count", |v| json!(v.as_i64().unwrap_or(0) + 1));
        }
        assert_eq!(store.get("count"), Some(json!(3)));
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let store = SharedStore::new();
        store.insert("a", 1);
        let snapshot = store.snapshot();
        store.insert("b", 2);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("a"), Some(&json!(1)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_push_creates_array() {
        let store = SharedStore::new();
        store.push("log", "a");
        store.push("log", "b");
        assert_eq!(store.get("log"), Some(json!(["a", "b"])));
    }
}
