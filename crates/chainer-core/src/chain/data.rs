//! Key/value bag carried through every step of a run.
//!
//! `StepData` is backed by `DashMap`. Reads clone the value so no map guard
//! outlives the call; holding one across `.await` would deadlock the next
//! writer on the same shard.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Concurrent string -> JSON map shared by the actions of one run.
///
/// Cloning yields another handle to the same map. The engine never reads or
/// validates the contents; steps own the schema.
#[derive(Debug, Clone, Default)]
pub struct StepData {
    inner: Arc<DashMap<String, Value>>,
}

impl StepData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cloned value at `key`, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Insert or overwrite `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Snapshot of the current keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Apply `f` to the value at `key` in place, inserting `Value::Null`
    /// first when the key is absent. The shard lock is held only for the
    /// duration of `f`, which must not block.
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(&mut Value),
    {
        let mut entry = self.inner.entry(key.to_string()).or_insert(Value::Null);
        f(entry.value_mut());
    }
}

impl FromIterator<(String, Value)> for StepData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            inner: Arc::new(iter.into_iter().collect()),
        }
    }
}
