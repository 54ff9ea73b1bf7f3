// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Immutable key/value bag scoped to one node invocation or one batch iteration.
///
/// Params carry per-run configuration (a model name, an item id, a file path),
/// never accumulated results; those belong in the shared context. Merging always
/// produces a new bag, so a batch iteration can never leak its values into a sibling.
///
/// A `CancellationToken` travels with the bag. The engine consults it between
/// retry attempts; node implementations that want to abort long-running work
/// can copy it out during `prepare`.
///
/// # Example
/// ```
/// use nodeflow::context::Params;
///
/// let defaults = Params::new().with("model", "echo").with("temperature", 0.2);
/// let item = Params::new().with("model", "large");
///
/// let merged = defaults.merged_with(&item);
/// assert_eq!(merged.get_str("model"), Some("large"));
/// assert_eq!(merged.get_f64("temperature"), Some(0.2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, Value>,
    cancellation: CancellationToken,
    has_custom_cancellation: bool,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; later calls with the same key win.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Attach a cancellation token that the retry loop and node bodies can observe.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self.has_custom_cancellation = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Overlay `overrides` on top of `self`; keys in `overrides` win.
    ///
    /// The cancellation token of `overrides` wins only when it was explicitly set;
    /// otherwise `self`'s token is inherited so cancelling a flow reaches every
    /// iteration it spawns.
    pub fn merged_with(&self, overrides: &Params) -> Params {
        let mut values = self.values.clone();
        for (key, value) in &overrides.values {
            values.insert(key.clone(), value.clone());
        }
        let cancellation = if overrides.has_custom_cancellation {
            overrides.cancellation.clone()
        } else {
            self.cancellation.clone()
        };
        Params {
            values,
            cancellation,
            has_custom_cancellation: self.has_custom_cancellation || overrides.has_custom_cancellation,
        }
    }
}

impl From<HashMap<String, Value>> for Params {
    fn from(values: HashMap<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }
}

impl From<Params> for HashMap<String, Value> {
    fn from(params: Params) -> Self {
        params.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Params::new(), |params, (key, value)| params.with(key, value))
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}
