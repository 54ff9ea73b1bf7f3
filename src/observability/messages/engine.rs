// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for flow traversal and batch fan-out events.
//!
//! This module contains message types for logging events related to:
//! * Flow run lifecycle (start, completion, failure)
//! * Action-keyed transitions between nodes
//! * Batch and parallel batch iteration scheduling

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Flow run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::engine::FlowStarted;
///
/// let msg = FlowStarted {
///     flow: "chat",
///     start_node: "prompt",
///     node_count: 3,
/// };
///
/// assert_eq!(msg.to_string(), "Flow 'chat' started at node 'prompt' (3 nodes)");
/// ```
pub struct FlowStarted<'a> {
    pub flow: &'a str,
    pub start_node: &'a str,
    pub node_count: usize,
}

impl Display for FlowStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' started at node '{}' ({} nodes)",
            self.flow, self.start_node, self.node_count
        )
    }
}

impl StructuredLog for FlowStarted<'_> {
    fn log(&self) {
        tracing::info!(
            flow = self.flow,
            start_node = self.start_node,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "flow",
            span_name = name,
            flow = self.flow,
            start_node = self.start_node,
        )
    }
}

/// Flow run reached a node whose action has no successor.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FlowCompleted<'a> {
    pub flow: &'a str,
    pub last_node: &'a str,
    pub action: &'a str,
    pub steps: usize,
    pub duration: Duration,
}

impl Display for FlowCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' completed at node '{}' with action '{}': steps={}, duration={:?}",
            self.flow, self.last_node, self.action, self.steps, self.duration
        )
    }
}

impl StructuredLog for FlowCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            flow = self.flow,
            last_node = self.last_node,
            action = self.action,
            steps = self.steps,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// Flow run aborted by an unrecovered failure.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct FlowFailed<'a> {
    pub flow: &'a str,
    pub steps: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for FlowFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' failed after {} step(s): {}",
            self.flow, self.steps, self.error
        )
    }
}

impl StructuredLog for FlowFailed<'_> {
    fn log(&self) {
        tracing::error!(
            flow = self.flow,
            steps = self.steps,
            error = %self.error,
            "{}", self
        );
    }
}

/// Flow run stopped because its caller cancelled it.
///
/// # Log Level
/// `info!` - Expected when a caller cancels
pub struct FlowCancelled<'a> {
    pub flow: &'a str,
    pub steps: usize,
}

impl Display for FlowCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Flow '{}' cancelled after {} step(s)", self.flow, self.steps)
    }
}

impl StructuredLog for FlowCancelled<'_> {
    fn log(&self) {
        tracing::info!(flow = self.flow, steps = self.steps, "{}", self);
    }
}

/// Transition followed from one node to its successor.
///
/// # Log Level
/// `debug!` - Routine progress
pub struct TransitionTaken<'a> {
    pub from: &'a str,
    pub action: &'a str,
    pub to: &'a str,
}

impl Display for TransitionTaken<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' --{}--> '{}'", self.from, self.action, self.to)
    }
}

impl StructuredLog for TransitionTaken<'_> {
    fn log(&self) {
        tracing::debug!(from = self.from, action = self.action, to = self.to, "{}", self);
    }
}

/// Traversal ended on a named action the node has no route for, although it
/// routes others.
///
/// Not an error: an unmatched action is how traversals terminate. The warning
/// catches typos in action names. Falling through on the default action is the
/// usual way to finish and is not reported.
///
/// # Log Level
/// `warn!` - Potential misconfiguration
pub struct UnroutedAction<'a> {
    pub node_id: &'a str,
    pub action: &'a str,
    pub routed: Vec<&'a str>,
}

impl Display for UnroutedAction<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow ends: action '{}' not found in [{}] of node '{}'",
            self.action,
            self.routed.join(", "),
            self.node_id
        )
    }
}

impl StructuredLog for UnroutedAction<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, action = self.action, "{}", self);
    }
}

/// Batch flow or batch node fan-out started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::engine::BatchStarted;
///
/// let msg = BatchStarted {
///     name: "summaries",
///     mode: "parallel",
///     iterations: 12,
///     max_concurrency: Some(4),
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Batch 'summaries' starting 12 parallel iteration(s), max_concurrency=4"
/// );
/// ```
pub struct BatchStarted<'a> {
    pub name: &'a str,
    pub mode: &'a str,
    pub iterations: usize,
    pub max_concurrency: Option<usize>,
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch '{}' starting {} {} iteration(s)",
            self.name, self.iterations, self.mode
        )?;
        match self.max_concurrency {
            Some(limit) => write!(f, ", max_concurrency={}", limit),
            None => Ok(()),
        }
    }
}

impl StructuredLog for BatchStarted<'_> {
    fn log(&self) {
        tracing::info!(
            batch = self.name,
            mode = self.mode,
            iterations = self.iterations,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            batch = self.name,
            mode = self.mode,
            iterations = self.iterations,
        )
    }
}

/// Every iteration of a batch finished.
///
/// # Log Level
/// `info!`
pub struct BatchCompleted<'a> {
    pub name: &'a str,
    pub iterations: usize,
    pub duration: Duration,
}

impl Display for BatchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch '{}' completed {} iteration(s) in {:?}",
            self.name, self.iterations, self.duration
        )
    }
}

impl StructuredLog for BatchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            batch = self.name,
            iterations = self.iterations,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// One iteration failed; the batch is being aborted.
///
/// # Log Level
/// `error!`
pub struct IterationFailed<'a> {
    pub name: &'a str,
    pub index: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for IterationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch '{}' iteration {} failed, aborting remaining iterations: {}",
            self.name, self.index, self.error
        )
    }
}

impl StructuredLog for IterationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            batch = self.name,
            index = self.index,
            error = %self.error,
            "{}", self
        );
    }
}
