// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Node invocation (prepare -> execute -> finalize)
//! * Execute attempts, retries and backoff
//! * Fallback substitution after retries are exhausted

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Node invocation started.
///
/// # Log Level
/// `debug!` - Emitted once per node visit, can be very chatty in loops
pub struct NodeInvocationStarted<'a> {
    pub node_id: &'a str,
    pub max_attempts: u32,
}

impl Display for NodeInvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' invocation started: max_attempts={}",
            self.node_id, self.max_attempts
        )
    }
}

impl StructuredLog for NodeInvocationStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            max_attempts = self.max_attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node", span_name = name, node_id = self.node_id)
    }
}

/// Node invocation completed and produced an action.
///
/// # Log Level
/// `debug!` - Routine progress
pub struct NodeInvocationCompleted<'a> {
    pub node_id: &'a str,
    pub action: &'a str,
    pub attempts: u32,
    pub duration: Duration,
}

impl Display for NodeInvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed with action '{}': attempts={}, duration={:?}",
            self.node_id, self.action, self.attempts, self.duration
        )
    }
}

impl StructuredLog for NodeInvocationCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            action = self.action,
            attempts = self.attempts,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A single execute attempt failed.
///
/// # Log Level
/// `warn!` - Recoverable while attempts remain
///
/// # Example
/// ```
/// use nodeflow::observability::messages::node::ExecuteAttemptFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "rate limited");
/// let msg = ExecuteAttemptFailed {
///     node_id: "summarize",
///     attempt: 2,
///     max_attempts: 3,
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Node 'summarize' execute attempt 2/3 failed: rate limited");
/// ```
pub struct ExecuteAttemptFailed<'a> {
    pub node_id: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecuteAttemptFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' execute attempt {}/{} failed: {}",
            self.node_id, self.attempt, self.max_attempts, self.error
        )
    }
}

impl StructuredLog for ExecuteAttemptFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            error = %self.error,
            "{}", self
        );
    }
}

/// Waiting before the next execute attempt.
///
/// # Log Level
/// `debug!`
pub struct RetryScheduled<'a> {
    pub node_id: &'a str,
    pub next_attempt: u32,
    pub delay: Duration,
}

impl Display for RetryScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' retrying in {:?} (attempt {})",
            self.node_id, self.delay, self.next_attempt
        )
    }
}

impl StructuredLog for RetryScheduled<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            next_attempt = self.next_attempt,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }
}

/// Retries stopped because the run was cancelled.
///
/// # Log Level
/// `info!` - Expected when a caller cancels
pub struct RetryAbandoned<'a> {
    pub node_id: &'a str,
    pub attempts: u32,
}

impl Display for RetryAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' stopped retrying after {} attempt(s): cancelled",
            self.node_id, self.attempts
        )
    }
}

impl StructuredLog for RetryAbandoned<'_> {
    fn log(&self) {
        tracing::info!(node_id = self.node_id, attempts = self.attempts, "{}", self);
    }
}

/// All attempts failed; the node's fallback is taking over.
///
/// # Log Level
/// `warn!` - Degraded result
pub struct FallbackInvoked<'a> {
    pub node_id: &'a str,
    pub attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for FallbackInvoked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' exhausted {} attempt(s), invoking fallback: {}",
            self.node_id, self.attempts, self.error
        )
    }
}

impl StructuredLog for FallbackInvoked<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }
}

/// A node stopped because the run was cancelled.
///
/// # Log Level
/// `info!` - Expected when a caller cancels
pub struct NodeCancelled<'a> {
    pub node_id: &'a str,
    pub phase: &'a str,
}

impl Display for NodeCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' cancelled in {} phase", self.node_id, self.phase)
    }
}

impl StructuredLog for NodeCancelled<'_> {
    fn log(&self) {
        tracing::info!(node_id = self.node_id, phase = self.phase, "{}", self);
    }
}

/// A node failed for good and is aborting its traversal.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NodeFailed<'a> {
    pub node_id: &'a str,
    pub phase: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' failed in {} phase: {}",
            self.node_id, self.phase, self.error
        )
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            phase = self.phase,
            error = %self.error,
            "{}", self
        );
    }
}
