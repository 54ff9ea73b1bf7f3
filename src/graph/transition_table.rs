// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::context::Action;

/// Newtype wrapper for the graph's edges: node id -> (action -> successor id).
///
/// Each (node, action) pair has at most one successor. Registering the same
/// pair again replaces the successor and hands back the old one. Cycles and
/// shared successors are ordinary entries; nothing here assumes a DAG.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable(HashMap<String, HashMap<Action, String>>);

impl TransitionTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Route `action` on `from` to `to`. Returns the previous successor, if any.
    pub fn register(&mut self, from: String, action: Action, to: String) -> Option<String> {
        self.0.entry(from).or_default().insert(action, to)
    }

    pub fn successor(&self, from: &str, action: &str) -> Option<&str> {
        self.0
            .get(from)
            .and_then(|routes| routes.get(action))
            .map(String::as_str)
    }

    /// Action names routed from `from`, sorted for stable output.
    pub fn actions_for(&self, from: &str) -> Vec<&str> {
        let mut actions = self
            .0
            .get(from)
            .map(|routes| routes.keys().map(Action::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        actions.sort_unstable();
        actions
    }

    pub fn has_routes(&self, from: &str) -> bool {
        self.0.get(from).is_some_and(|routes| !routes.is_empty())
    }

    /// Every edge as (from, action, to).
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.0.iter().flat_map(|(from, routes)| {
            routes
                .iter()
                .map(move |(action, to)| (from.as_str(), action.as_str(), to.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_registration_wins() {
        let mut table = TransitionTable::new();
        assert_eq!(table.register("a".into(), "next".into(), "b".into()), None);
        assert_eq!(
            table.register("a".into(), "next".into(), "c".into()),
            Some("b".to_string())
        );
        assert_eq!(table.successor("a", "next"), Some("c"));
    }

    #[test]
    fn test_self_loop_and_unknown_action() {
        let mut table = TransitionTable::new();
        table.register("p".into(), "continue".into(), "p".into());

        assert_eq!(table.successor("p", "continue"), Some("p"));
        assert_eq!(table.successor("p", "default"), None);
        assert_eq!(table.successor("q", "continue"), None);
        assert!(table.has_routes("p"));
        assert!(!table.has_routes("q"));
    }

    #[test]
    fn test_actions_sorted() {
        let mut table = TransitionTable::new();
        table.register("d".into(), "search".into(), "s".into());
        table.register("d".into(), "answer".into(), "a".into());

        assert_eq!(table.actions_for("d"), vec!["answer", "search"]);
        assert_eq!(table.edges().count(), 2);
    }
}
