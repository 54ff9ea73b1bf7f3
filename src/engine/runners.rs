// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Adapters that run typed nodes through their full lifecycle.
//!
//! [`Node`] and [`BatchNode`] have associated types, so a graph cannot hold them
//! directly. The runners here own a typed node, drive prepare -> execute (with
//! retry and fallback) -> finalize, and expose the result through the
//! object-safe [`Executable`] trait that graphs store.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::time::Instant;
use tracing::Instrument;

use crate::context::{Action, Params, SharedContext};
use crate::engine::concurrency::ConcurrencyLimit;
use crate::engine::retry::{execute_with_retry, RetryPolicy};
use crate::errors::{FlowError, NodeError, Phase};
use crate::observability::messages::engine::{BatchCompleted, BatchStarted, IterationFailed};
use crate::observability::messages::node::{
    FallbackInvoked, NodeCancelled, NodeFailed, NodeInvocationCompleted, NodeInvocationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{BatchNode, Executable, Invocation, Node};

/// Run a node on its own, outside any graph.
///
/// Useful for exercising a node in isolation; successors are irrelevant here
/// because only a flow follows transitions.
pub async fn run_node<S, N>(node: &N, shared: &S, params: &Params) -> Result<Action, FlowError>
where
    S: SharedContext,
    N: Node<S>,
{
    let policy = node.retry_policy().unwrap_or_default();
    run_lifecycle(node, "node", shared, params, &policy).await
}

pub(crate) struct NodeRunner<N> {
    node: N,
}

impl<N> NodeRunner<N> {
    pub(crate) fn new(node: N) -> Self {
        Self { node }
    }
}

#[async_trait]
impl<S, N> Executable<S> for NodeRunner<N>
where
    S: SharedContext,
    N: Node<S>,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        let policy = self
            .node
            .retry_policy()
            .unwrap_or_else(|| invocation.default_retry.clone());
        run_lifecycle(&self.node, invocation.node_id, shared, invocation.params, &policy).await
    }
}

async fn run_lifecycle<S, N>(
    node: &N,
    node_id: &str,
    shared: &S,
    params: &Params,
    policy: &RetryPolicy,
) -> Result<Action, FlowError>
where
    S: SharedContext,
    N: Node<S>,
{
    let start_msg = NodeInvocationStarted {
        node_id,
        max_attempts: policy.max_attempts,
    };
    let span = start_msg.span("node_invocation");

    async move {
        start_msg.log();
        let start_time = Instant::now();

        let prep = node
            .prepare(shared, params)
            .await
            .map_err(|source| node_failure(node_id, Phase::Prepare, 1, source))?;

        let (result, attempts) = {
            let prep = &prep;
            execute_with_retry(node_id, policy, params.cancellation(), move || {
                node.execute(prep)
            })
            .await
        };

        let output = match result {
            Ok(output) => output,
            Err(error) if error.is_cancelled() => {
                return Err(node_failure(node_id, Phase::Execute, attempts, error));
            }
            Err(error) => {
                FallbackInvoked {
                    node_id,
                    attempts,
                    error: &error,
                }
                .log();
                node.execute_fallback(&prep, error)
                    .await
                    .map_err(|source| node_failure(node_id, Phase::Execute, attempts, source))?
            }
        };

        let action = node
            .finalize(shared, params, prep, output)
            .await
            .map_err(|source| node_failure(node_id, Phase::Finalize, attempts, source))?;

        NodeInvocationCompleted {
            node_id,
            action: action.as_str(),
            attempts,
            duration: start_time.elapsed(),
        }
        .log();

        Ok(action)
    }
    .instrument(span)
    .await
}

/// Whether a batch node's items run one after another or all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BatchMode {
    Sequential,
    Parallel { max_concurrency: Option<usize> },
}

pub(crate) struct BatchNodeRunner<N> {
    node: N,
    mode: BatchMode,
}

impl<N> BatchNodeRunner<N> {
    pub(crate) fn new(node: N, mode: BatchMode) -> Self {
        Self { node, mode }
    }
}

#[async_trait]
impl<S, N> Executable<S> for BatchNodeRunner<N>
where
    S: SharedContext,
    N: BatchNode<S>,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        let node_id = invocation.node_id;
        let params = invocation.params;
        let policy = self
            .node
            .retry_policy()
            .unwrap_or_else(|| invocation.default_retry.clone());

        let items = self
            .node
            .prepare(shared, params)
            .await
            .map_err(|source| node_failure(node_id, Phase::Prepare, 1, source))?;

        let (mode, max_concurrency) = match self.mode {
            BatchMode::Sequential => ("sequential", None),
            BatchMode::Parallel { max_concurrency } => ("parallel", max_concurrency),
        };
        let start_msg = BatchStarted {
            name: node_id,
            mode,
            iterations: items.len(),
            max_concurrency,
        };
        let span = start_msg.span("batch_node");
        start_msg.log();
        let start_time = Instant::now();

        let outputs = match self.mode {
            BatchMode::Sequential => {
                let mut outputs = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let output = self
                        .run_item::<S>(node_id, index, item, &policy, params)
                        .instrument(span.clone())
                        .await?;
                    outputs.push(output);
                }
                outputs
            }
            BatchMode::Parallel { max_concurrency } => {
                let limit = ConcurrencyLimit::from(max_concurrency);
                let limit = &limit;
                let policy = &policy;
                try_join_all(items.iter().enumerate().map(|(index, item)| {
                    limit.run(self.run_item::<S>(node_id, index, item, policy, params))
                }))
                .instrument(span.clone())
                .await?
            }
        };

        BatchCompleted {
            name: node_id,
            iterations: items.len(),
            duration: start_time.elapsed(),
        }
        .log();

        self.node
            .finalize(shared, params, items, outputs)
            .await
            .map_err(|source| node_failure(node_id, Phase::Finalize, 1, source))
    }
}

impl<N> BatchNodeRunner<N> {
    async fn run_item<S>(
        &self,
        node_id: &str,
        index: usize,
        item: &<N as BatchNode<S>>::Item,
        policy: &RetryPolicy,
        params: &Params,
    ) -> Result<<N as BatchNode<S>>::Output, FlowError>
    where
        S: SharedContext,
        N: BatchNode<S>,
    {
        let node = &self.node;
        let (result, attempts) =
            execute_with_retry(node_id, policy, params.cancellation(), move || {
                node.execute_item(item)
            })
            .await;

        let recovered = match result {
            Ok(output) => Ok(output),
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                FallbackInvoked {
                    node_id,
                    attempts,
                    error: &error,
                }
                .log();
                node.execute_item_fallback(item, error).await
            }
        };

        recovered.map_err(|source| {
            let failure = node_failure(node_id, Phase::Execute, attempts, source);
            if !failure.is_cancelled() {
                IterationFailed {
                    name: node_id,
                    index,
                    error: &failure,
                }
                .log();
            }
            FlowError::IterationFailed {
                index,
                source: Box::new(failure),
            }
        })
    }
}

pub(crate) fn node_failure(node_id: &str, phase: Phase, attempts: u32, source: NodeError) -> FlowError {
    let phase_name = phase.to_string();
    if source.is_cancelled() {
        NodeCancelled {
            node_id,
            phase: &phase_name,
        }
        .log();
    } else {
        NodeFailed {
            node_id,
            phase: &phase_name,
            error: &source,
        }
        .log();
    }
    FlowError::NodeFailed {
        node_id: node_id.to_string(),
        phase,
        attempts,
        source,
    }
}
