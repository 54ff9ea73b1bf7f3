// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Repeat a flow's traversal once per prepared parameter set, concurrently.
//!
//! Iterations are futures joined with [`try_join_all`] on the caller's task, so
//! they interleave cooperatively at `.await` points and borrow the shared
//! context instead of requiring it to be `'static` owned data. Results come
//! back in prepare order no matter which iteration finishes first.
//!
//! When an iteration fails, the join resolves with that error and drops every
//! iteration still in flight. Their side effects up to the drop remain in the
//! shared context; nothing further runs.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::time::Instant;
use tracing::Instrument;

use crate::context::{Action, Params, SharedContext};
use crate::engine::batch_flow::{finalize_batch, prepare_items, run_iteration, BatchRun};
use crate::engine::concurrency::ConcurrencyLimit;
use crate::engine::flow::Flow;
use crate::errors::FlowError;
use crate::observability::messages::engine::{BatchCompleted, BatchStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{BatchPlan, Executable, Invocation};

/// Runs `flow` once per `Params` entry returned by the plan, all at once.
pub struct ParallelBatchFlow<S, P>
where
    S: SharedContext,
{
    name: String,
    plan: P,
    flow: Flow<S>,
    limit: ConcurrencyLimit,
}

impl<S, P> ParallelBatchFlow<S, P>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    pub fn new(plan: P, flow: Flow<S>) -> Self {
        Self {
            name: flow.name().to_string(),
            plan,
            flow,
            limit: ConcurrencyLimit::unbounded(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Allow at most `max_concurrency` iterations in flight; `0` is treated as `1`.
    pub fn with_concurrency_limit(mut self, max_concurrency: usize) -> Self {
        self.limit = ConcurrencyLimit::new(max_concurrency);
        self
    }

    /// Replace the limit wholesale, e.g. with one shared between several batches.
    pub fn with_limit(mut self, limit: ConcurrencyLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        self.limit.limit()
    }

    pub async fn run(&self, shared: &S) -> Result<BatchRun, FlowError> {
        self.run_with(shared, &Params::new()).await
    }

    pub async fn run_with(&self, shared: &S, params: &Params) -> Result<BatchRun, FlowError> {
        let items = prepare_items(&self.plan, &self.name, shared, params).await?;

        let start_msg = BatchStarted {
            name: &self.name,
            mode: "parallel",
            iterations: items.len(),
            max_concurrency: self.limit.limit(),
        };
        let span = start_msg.span("parallel_batch_flow");
        start_msg.log();
        let start_time = Instant::now();

        let iterations = items.iter().enumerate().map(|(index, item)| {
            self.limit
                .run(run_iteration(&self.flow, &self.name, index, shared, params, item))
        });
        let traversals = try_join_all(iterations).instrument(span).await?;

        BatchCompleted {
            name: &self.name,
            iterations: items.len(),
            duration: start_time.elapsed(),
        }
        .log();

        finalize_batch(&self.plan, &self.name, shared, params, items, traversals).await
    }
}

#[async_trait]
impl<S, P> Executable<S> for ParallelBatchFlow<S, P>
where
    S: SharedContext,
    P: BatchPlan<S>,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        Ok(self.run_with(shared, invocation.params).await?.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Traversal;
    use crate::errors::NodeError;
    use crate::graph::Graph;
    use crate::traits::Node;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Shared context with one slot per iteration and an in-flight gauge.
    struct Slots {
        values: Vec<AtomicUsize>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Slots {
        fn new(len: usize) -> Self {
            Self {
                values: (0..len).map(|_| AtomicUsize::new(0)).collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    /// Sleeps, then writes `index + 1` into its own slot. Fails on `fail_at`.
    struct FillSlot {
        delay: Duration,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl Node<Slots> for FillSlot {
        type Prep = usize;
        type Output = usize;

        async fn prepare(&self, shared: &Slots, params: &Params) -> Result<usize, NodeError> {
            let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            shared.peak.fetch_max(now, Ordering::SeqCst);
            params
                .get_u64("index")
                .map(|index| index as usize)
                .ok_or_else(|| NodeError::failed("missing index"))
        }

        async fn execute(&self, index: &usize) -> Result<usize, NodeError> {
            // Later items finish first.
            tokio::time::sleep(self.delay * (100 - *index as u32)).await;
            if self.fail_at == Some(*index) {
                return Err(NodeError::failed(format!("item {index} failed")));
            }
            Ok(index + 1)
        }

        async fn finalize(
            &self,
            shared: &Slots,
            _params: &Params,
            index: usize,
            output: usize,
        ) -> Result<Action, NodeError> {
            shared.values[index].store(output, Ordering::SeqCst);
            shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Action::default())
        }
    }

    struct Indexed(usize);

    #[async_trait]
    impl BatchPlan<Slots> for Indexed {
        async fn prepare(&self, _shared: &Slots, _params: &Params) -> Result<Vec<Params>, NodeError> {
            Ok((0..self.0).map(|index| Params::new().with("index", index)).collect())
        }

        async fn finalize(
            &self,
            _shared: &Slots,
            _params: &Params,
            items: Vec<Params>,
            traversals: &[Traversal],
        ) -> Result<Action, NodeError> {
            if items.len() == traversals.len() {
                Ok(Action::new("all_done"))
            } else {
                Err(NodeError::failed("iteration count mismatch"))
            }
        }
    }

    fn fill_flow(delay: Duration, fail_at: Option<usize>) -> Flow<Slots> {
        let mut graph = Graph::new();
        graph.add_node("fill", FillSlot { delay, fail_at });
        Flow::new(graph, "fill").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hundred_iterations_fill_every_slot() {
        let shared = Slots::new(100);
        let batch = ParallelBatchFlow::new(Indexed(100), fill_flow(Duration::from_millis(1), None));

        let run = batch.run(&shared).await.unwrap();

        assert_eq!(run.action, Action::new("all_done"));
        assert_eq!(run.traversals.len(), 100);
        for (index, slot) in shared.values.iter().enumerate() {
            assert_eq!(slot.load(Ordering::SeqCst), index + 1);
        }
        assert_eq!(shared.peak.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_iterations_overlap_in_time() {
        let shared = Slots::new(10);
        let batch = ParallelBatchFlow::new(Indexed(10), fill_flow(Duration::from_millis(10), None));
        let started = tokio::time::Instant::now();

        batch.run(&shared).await.unwrap();

        // Sequential would take the sum of all delays; parallel takes the longest.
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_propagates_once() {
        let shared = Slots::new(20);
        let batch =
            ParallelBatchFlow::new(Indexed(20), fill_flow(Duration::from_millis(1), Some(7)));

        let err = batch.run(&shared).await.unwrap_err();

        match err {
            FlowError::IterationFailed { index, ref source } => {
                assert_eq!(index, 7);
                assert_eq!(source.failed_node_id(), Some("fill"));
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(shared.values[7].load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_limit_respected() {
        let shared = Slots::new(12);
        let batch = ParallelBatchFlow::new(Indexed(12), fill_flow(Duration::from_millis(1), None))
            .with_concurrency_limit(3);

        batch.run(&shared).await.unwrap();

        assert_eq!(batch.concurrency_limit(), Some(3));
        assert_eq!(shared.peak.load(Ordering::SeqCst), 3);
        for (index, slot) in shared.values.iter().enumerate() {
            assert_eq!(slot.load(Ordering::SeqCst), index + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_limit_spans_batches() {
        let shared = Slots::new(6);
        let limit = ConcurrencyLimit::new(2);
        let first = ParallelBatchFlow::new(Indexed(6), fill_flow(Duration::from_millis(1), None))
            .with_limit(limit.clone());
        let second = ParallelBatchFlow::new(Indexed(6), fill_flow(Duration::from_millis(1), None))
            .with_limit(limit);

        let (a, b) = tokio::join!(first.run(&shared), second.run(&shared));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(shared.peak.load(Ordering::SeqCst), 2);
    }
}
