// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::SharedContext;
use crate::traits::Executable;

/// Newtype wrapper for the node registry: node id -> runnable step
pub struct NodeMap<S: SharedContext>(HashMap<String, Arc<dyn Executable<S>>>);

impl<S> NodeMap<S>
where
    S: SharedContext,
{
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Insert a step, returning the one it replaced
    pub fn insert(
        &mut self,
        id: String,
        step: Arc<dyn Executable<S>>,
    ) -> Option<Arc<dyn Executable<S>>> {
        self.0.insert(id, step)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Executable<S>>> {
        self.0.get(id)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> Default for NodeMap<S>
where
    S: SharedContext,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SharedContext> std::fmt::Debug for NodeMap<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids = self.0.keys().collect::<Vec<_>>();
        ids.sort();
        f.debug_struct("NodeMap")
            .field("node_count", &self.0.len())
            .field("node_ids", &ids)
            .finish()
    }
}
