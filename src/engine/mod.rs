// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution: the node lifecycle, retries, and the three flow variants.
//!
//! * [`Flow`] - walk a graph from its start node, routing on actions
//! * [`BatchFlow`] - one traversal per prepared parameter set, in order
//! * [`ParallelBatchFlow`] - the same traversals, run concurrently
//!
//! All three implement [`Executable`](crate::traits::Executable) and can be
//! registered as a single step of another graph.

pub mod batch_flow;
pub mod concurrency;
pub mod flow;
pub mod parallel_batch_flow;
pub mod retry;
pub(crate) mod runners;


pub use batch_flow::{BatchFlow, BatchRun};
pub use concurrency::ConcurrencyLimit;
pub use flow::{Flow, Traversal};
pub use parallel_batch_flow::ParallelBatchFlow;
pub use retry::RetryPolicy;
pub use runners::run_node;
