// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Repeat a flow's traversal once per prepared parameter set, in order.

use async_trait::async_trait;
use std::time::Instant;
use tracing::Instrument;

use crate::context::{Action, Params, SharedContext};
use crate::engine::flow::{Flow, Traversal};
use crate::engine::runners::node_failure;
use crate::errors::{FlowError, Phase};
use crate::observability::messages::engine::{BatchCompleted, BatchStarted, IterationFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::{BatchPlan, Executable, Invocation};

/// Outcome of a batch run: the plan's final action and every iteration's traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub action: Action,
    /// One entry per prepared parameter set, in prepare order.
    pub traversals: Vec<Traversal>,
}

/// Runs `flow` once per `Params` entry returned by the plan, one after another.
///
/// Each iteration gets the batch's params with its own entry merged on top and
/// the same shared context. The first failing iteration aborts the batch;
/// later iterations never start.
pub struct BatchFlow<S, P>
where
    S: SharedContext,
{
    name: String,
    plan: P,
    flow: Flow<S>,
}

impl<S, P> BatchFlow<S, P>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    pub fn new(plan: P, flow: Flow<S>) -> Self {
        Self {
            name: flow.name().to_string(),
            plan,
            flow,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, shared: &S) -> Result<BatchRun, FlowError> {
        self.run_with(shared, &Params::new()).await
    }

    pub async fn run_with(&self, shared: &S, params: &Params) -> Result<BatchRun, FlowError> {
        let items = prepare_items(&self.plan, &self.name, shared, params).await?;

        let start_msg = BatchStarted {
            name: &self.name,
            mode: "sequential",
            iterations: items.len(),
            max_concurrency: None,
        };
        let span = start_msg.span("batch_flow");

        let traversals = async {
            start_msg.log();
            let start_time = Instant::now();
            let mut traversals = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let traversal =
                    run_iteration(&self.flow, &self.name, index, shared, params, item).await?;
                traversals.push(traversal);
            }
            BatchCompleted {
                name: &self.name,
                iterations: items.len(),
                duration: start_time.elapsed(),
            }
            .log();
            Ok::<_, FlowError>(traversals)
        }
        .instrument(span)
        .await?;

        finalize_batch(&self.plan, &self.name, shared, params, items, traversals).await
    }
}

#[async_trait]
impl<S, P> Executable<S> for BatchFlow<S, P>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        Ok(self.run_with(shared, invocation.params).await?.action)
    }
}

pub(crate) async fn prepare_items<S, P>(
    plan: &P,
    name: &str,
    shared: &S,
    params: &Params,
) -> Result<Vec<Params>, FlowError>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    plan.prepare(shared, params)
        .await
        .map_err(|source| node_failure(name, Phase::Prepare, 1, source))
}

/// One run of `flow`, hooks included, with `item` merged over the batch params.
pub(crate) async fn run_iteration<S>(
    flow: &Flow<S>,
    name: &str,
    index: usize,
    shared: &S,
    params: &Params,
    item: &Params,
) -> Result<Traversal, FlowError>
where
    S: SharedContext,
{
    let iteration_params = flow.params().merged_with(&params.merged_with(item));
    flow.run_merged(shared, &iteration_params)
        .await
        .map_err(|error| {
            if !error.is_cancelled() {
                IterationFailed {
                    name,
                    index,
                    error: &error,
                }
                .log();
            }
            FlowError::IterationFailed {
                index,
                source: Box::new(error),
            }
        })
}

pub(crate) async fn finalize_batch<S, P>(
    plan: &P,
    name: &str,
    shared: &S,
    params: &Params,
    items: Vec<Params>,
    traversals: Vec<Traversal>,
) -> Result<BatchRun, FlowError>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    let action = plan
        .finalize(shared, params, items, &traversals)
        .await
        .map_err(|source| node_failure(name, Phase::Finalize, 1, source))?;
    Ok(BatchRun { action, traversals })
}
