// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph construction: which steps exist and which action leads where.
//!
//! Nodes are registered under string ids; transitions are registered on ids, so
//! a node can route to itself, to a node added later, or to a node that several
//! others also route to. A [`Graph`] is handed to a [`Flow`](crate::engine::Flow)
//! by value and becomes immutable, so registering edges can never affect a run
//! that is already in flight.
//!
//! # Example
//!
//! ```
//! use nodeflow::graph::Graph;
//! # use async_trait::async_trait;
//! # use nodeflow::context::{Params, SharedStore};
//! # use nodeflow::errors::NodeError;
//! # use nodeflow::traits::Node;
//! # struct Step;
//! # #[async_trait]
//! # impl Node<SharedStore> for Step {
//! #     type Prep = ();
//! #     type Output = ();
//! #     async fn prepare(&self, _: &SharedStore, _: &Params) -> Result<(), NodeError> { Ok(()) }
//! #     async fn execute(&self, _: &()) -> Result<(), NodeError> { Ok(()) }
//! # }
//!
//! let mut graph = Graph::<SharedStore>::new();
//! graph
//!     .add_node("decide", Step)
//!     .add_node("search", Step)
//!     .add_node("answer", Step)
//!     .on("decide", "search", "search")
//!     .on("decide", "answer", "answer")
//!     .then("search", "decide");
//!
//! assert_eq!(graph.transitions().successor("search", "default"), Some("decide"));
//! ```

mod node_map;
mod transition_table;
mod validation;

pub use node_map::NodeMap;
pub use transition_table::TransitionTable;
pub use validation::validate_graph;

use std::sync::Arc;

use crate::context::{Action, SharedContext};
use crate::engine::runners::{BatchMode, BatchNodeRunner, NodeRunner};
use crate::engine::RetryPolicy;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{NodeReplaced, SuccessorOverwritten};
use crate::observability::messages::StructuredLog;
use crate::traits::{BatchNode, Executable, Node};

/// Registry of steps plus the action-keyed edges between them.
pub struct Graph<S: SharedContext> {
    nodes: NodeMap<S>,
    transitions: TransitionTable,
    default_retry: RetryPolicy,
}

impl<S: SharedContext> Graph<S> {
    pub fn new() -> Self {
        Self {
            nodes: NodeMap::new(),
            transitions: TransitionTable::new(),
            default_retry: RetryPolicy::default(),
        }
    }

    /// Retry policy for nodes whose `retry_policy()` returns `None`.
    pub fn with_default_retry(mut self, policy: RetryPolicy) -> Self {
        self.default_retry = policy;
        self
    }

    pub fn add_node<N>(&mut self, id: impl Into<String>, node: N) -> &mut Self
    where
        N: Node<S> + 'static,
    {
        self.insert(id.into(), Arc::new(NodeRunner::new(node)))
    }

    /// Register a batch node whose items run one after another.
    pub fn add_batch_node<N>(&mut self, id: impl Into<String>, node: N) -> &mut Self
    where
        N: BatchNode<S> + 'static,
    {
        self.insert(
            id.into(),
            Arc::new(BatchNodeRunner::new(node, BatchMode::Sequential)),
        )
    }

    /// Register a batch node whose items all run concurrently.
    pub fn add_parallel_batch_node<N>(&mut self, id: impl Into<String>, node: N) -> &mut Self
    where
        N: BatchNode<S> + 'static,
    {
        self.insert(
            id.into(),
            Arc::new(BatchNodeRunner::new(
                node,
                BatchMode::Parallel {
                    max_concurrency: None,
                },
            )),
        )
    }

    /// Register a parallel batch node with at most `max_concurrency` items in flight.
    pub fn add_parallel_batch_node_with_limit<N>(
        &mut self,
        id: impl Into<String>,
        node: N,
        max_concurrency: usize,
    ) -> &mut Self
    where
        N: BatchNode<S> + 'static,
    {
        self.insert(
            id.into(),
            Arc::new(BatchNodeRunner::new(
                node,
                BatchMode::Parallel {
                    max_concurrency: Some(max_concurrency.max(1)),
                },
            )),
        )
    }

    /// Register a flow, batch flow or any other [`Executable`] as a single step.
    ///
    /// The nested step receives the outer shared context unchanged and the
    /// params of the visit; the action it returns drives the outer graph.
    pub fn add_subflow<E>(&mut self, id: impl Into<String>, step: E) -> &mut Self
    where
        E: Executable<S> + 'static,
    {
        self.insert(id.into(), Arc::new(step))
    }

    /// Route `action` produced by `from` to `to`. Re-registering replaces the successor.
    pub fn on(
        &mut self,
        from: impl Into<String>,
        action: impl Into<Action>,
        to: impl Into<String>,
    ) -> &mut Self {
        let from = from.into();
        let action = action.into();
        let to = to.into();

        let previous = self
            .transitions
            .register(from.clone(), action.clone(), to.clone());
        if let Some(previous) = previous.filter(|previous| *previous != to) {
            SuccessorOverwritten {
                node_id: &from,
                action: action.as_str(),
                previous: &previous,
                replacement: &to,
            }
            .log();
        }
        self
    }

    /// Route the default action of `from` to `to`.
    pub fn then(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.on(from, Action::default(), to)
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn Executable<S>>> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn default_retry(&self) -> &RetryPolicy {
        &self.default_retry
    }

    /// Check that `start` and every transition endpoint are registered.
    pub fn validate(&self, start: &str) -> Result<(), Vec<ValidationError>> {
        validate_graph(&self.nodes, &self.transitions, start)
    }

    fn insert(&mut self, id: String, step: Arc<dyn Executable<S>>) -> &mut Self {
        if self.nodes.insert(id.clone(), step).is_some() {
            NodeReplaced { node_id: &id }.log();
        }
        self
    }
}

impl<S: SharedContext> Default for Graph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SharedContext> std::fmt::Debug for Graph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("transitions", &self.transitions)
            .field("default_retry", &self.default_retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Params;
    use crate::errors::NodeError;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Node<()> for Noop {
        type Prep = ();
        type Output = ();

        async fn prepare(&self, _shared: &(), _params: &Params) -> Result<(), NodeError> {
            Ok(())
        }

        async fn execute(&self, _prep: &()) -> Result<(), NodeError> {
            Ok(())
        }
    }

    #[test]
    fn test_valid_graph_with_cycle() {
        let mut graph = Graph::<()>::new();
        graph
            .add_node("a", Noop)
            .add_node("b", Noop)
            .on("a", "next", "b")
            .on("b", "back", "a");

        assert!(graph.validate("a").is_ok());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_unknown_start_and_successor_reported_together() {
        let mut graph = Graph::<()>::new();
        graph.add_node("a", Noop).on("a", "next", "ghost");

        let errors = graph.validate("missing").unwrap_err();

        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownStartNode {
                    node_id: "missing".into()
                },
                ValidationError::UnresolvedSuccessor {
                    node_id: "a".into(),
                    action: "next".into(),
                    successor: "ghost".into(),
                },
            ]
        );
    }

    #[test]
    fn test_transition_on_unregistered_source() {
        let mut graph = Graph::<()>::new();
        graph.add_node("a", Noop).then("orphan", "a");

        let errors = graph.validate("a").unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::UnknownTransitionSource {
                node_id: "orphan".into(),
                action: "default".into(),
            }]
        );
    }

    #[test]
    fn test_reregistering_action_is_last_write_wins() {
        let mut graph = Graph::<()>::new();
        graph
            .add_node("a", Noop)
            .add_node("b", Noop)
            .add_node("c", Noop)
            .on("a", "go", "b")
            .on("a", "go", "c");

        assert_eq!(graph.transitions().successor("a", "go"), Some("c"));
    }

    #[test]
    fn test_forward_references_resolve_once_added() {
        let mut graph = Graph::<()>::new();
        graph.add_node("a", Noop).then("a", "later");
        assert!(graph.validate("a").is_err());

        graph.add_node("later", Noop);
        assert!(graph.validate("a").is_ok());
    }
}
