// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Action-keyed traversal of a [`Graph`].
//!
//! A run starts at the flow's start node and repeats:
//!
//! 1. Invoke the current node with the run's params
//! 2. Look up the successor registered for the action it returned
//! 3. Continue there, or stop when no successor exists
//!
//! The walk is a loop, not recursion, so cycles of any length run in constant
//! stack. A failure aborts the walk immediately; nothing already written to the
//! shared context is rolled back.
//!
//! Optional [`FlowHooks`] wrap the walk in a prepare and a finalize phase, so a
//! flow nested in another graph behaves like any other node.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::context::{Action, Params, SharedContext};
use crate::engine::runners::node_failure;
use crate::errors::{FlowError, Phase, ValidationError};
use crate::graph::Graph;
use crate::observability::messages::engine::{
    FlowCancelled, FlowCompleted, FlowFailed, FlowStarted, TransitionTaken, UnroutedAction,
};
use crate::observability::messages::validation::GraphRejected;
use crate::observability::messages::StructuredLog;
use crate::traits::{Executable, FlowHooks, Invocation};

/// Summary of one completed traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// The flow's action: the last node's action, or what the flow's finalize
    /// hook mapped it to. An enclosing graph routes on this.
    pub action: Action,
    /// Id of the node the traversal ended on.
    pub last_node: String,
    /// Number of node invocations, counting repeat visits.
    pub steps: usize,
}

/// A validated graph plus the node a traversal starts at.
pub struct Flow<S: SharedContext> {
    name: String,
    graph: Arc<Graph<S>>,
    start: String,
    defaults: Params,
    hooks: Option<Arc<dyn FlowHooks<S>>>,
}

impl<S: SharedContext> Flow<S> {
    /// Validate `graph` and fix `start` as the entry node.
    ///
    /// Every problem is reported at once in [`FlowError::InvalidGraph`].
    pub fn new(graph: Graph<S>, start: impl Into<String>) -> Result<Self, FlowError> {
        let start = start.into();
        let name = start.clone();

        if let Err(errors) = graph.validate(&start) {
            let error = FlowError::InvalidGraph(errors);
            GraphRejected {
                flow: &name,
                error: &error,
            }
            .log();
            return Err(error);
        }

        Ok(Self {
            name,
            graph: Arc::new(graph),
            start,
            defaults: Params::new(),
            hooks: None,
        })
    }

    /// Name used in logs; defaults to the start node id.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Params every run starts from; run params and enclosing params override them.
    pub fn with_params(mut self, defaults: Params) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run `hooks` before and after every traversal of this flow.
    pub fn with_hooks<H>(mut self, hooks: H) -> Self
    where
        H: FlowHooks<S> + 'static,
    {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn graph(&self) -> &Graph<S> {
        &self.graph
    }

    pub fn params(&self) -> &Params {
        &self.defaults
    }

    pub async fn run(&self, shared: &S) -> Result<Traversal, FlowError> {
        self.run_with(shared, &Params::new()).await
    }

    /// Run with `params` merged over the flow's defaults.
    pub async fn run_with(&self, shared: &S, params: &Params) -> Result<Traversal, FlowError> {
        let params = self.defaults.merged_with(params);
        self.run_merged(shared, &params).await
    }

    /// Prepare hook, traversal, finalize hook. `params` already carry the defaults.
    pub(crate) async fn run_merged(&self, shared: &S, params: &Params) -> Result<Traversal, FlowError> {
        let Some(hooks) = &self.hooks else {
            return self.traverse(shared, params).await;
        };

        hooks
            .prepare(shared, params)
            .await
            .map_err(|source| node_failure(&self.name, Phase::Prepare, 1, source))?;
        let mut traversal = self.traverse(shared, params).await?;
        traversal.action = hooks
            .finalize(shared, params, &traversal)
            .await
            .map_err(|source| node_failure(&self.name, Phase::Finalize, 1, source))?;
        Ok(traversal)
    }

    async fn traverse(&self, shared: &S, params: &Params) -> Result<Traversal, FlowError> {
        let start_msg = FlowStarted {
            flow: &self.name,
            start_node: &self.start,
            node_count: self.graph.node_count(),
        };
        let span = start_msg.span("flow_run");

        async move {
            start_msg.log();
            let start_time = Instant::now();
            let transitions = self.graph.transitions();
            let mut current = self.start.as_str();
            let mut steps = 0;

            loop {
                let Some(step) = self.graph.node(current) else {
                    // Only reachable if validation was bypassed.
                    return Err(FlowError::InvalidGraph(vec![
                        ValidationError::UnknownStartNode {
                            node_id: current.to_string(),
                        },
                    ]));
                };

                steps += 1;
                let invocation = Invocation {
                    node_id: current,
                    params,
                    default_retry: self.graph.default_retry(),
                };
                let action = match step.invoke(shared, invocation).await {
                    Ok(action) => action,
                    Err(error) if error.is_cancelled() => {
                        FlowCancelled {
                            flow: &self.name,
                            steps,
                        }
                        .log();
                        return Err(error);
                    }
                    Err(error) => {
                        FlowFailed {
                            flow: &self.name,
                            steps,
                            error: &error,
                        }
                        .log();
                        return Err(error);
                    }
                };

                match transitions.successor(current, action.as_str()) {
                    Some(next) => {
                        TransitionTaken {
                            from: current,
                            action: action.as_str(),
                            to: next,
                        }
                        .log();
                        current = next;
                    }
                    None => {
                        if !action.is_default() && transitions.has_routes(current) {
                            UnroutedAction {
                                node_id: current,
                                action: action.as_str(),
                                routed: transitions.actions_for(current),
                            }
                            .log();
                        }
                        FlowCompleted {
                            flow: &self.name,
                            last_node: current,
                            action: action.as_str(),
                            steps,
                            duration: start_time.elapsed(),
                        }
                        .log();
                        return Ok(Traversal {
                            action,
                            last_node: current.to_string(),
                            steps,
                        });
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<S: SharedContext> Clone for Flow<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            graph: Arc::clone(&self.graph),
            start: self.start.clone(),
            defaults: self.defaults.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<S: SharedContext> std::fmt::Debug for Flow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("graph", &self.graph)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

/// A nested flow runs its hooks and traverses its own graph, then hands its
/// action to the enclosing graph. It keeps its own default retry policy.
#[async_trait]
impl<S: SharedContext> Executable<S> for Flow<S> {
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        let params = self.defaults.merged_with(invocation.params);
        let traversal = self.run_merged(shared, &params).await?;
        Ok(traversal.action)
    }
}
