// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

use super::{NodeError, ValidationError};

/// Lifecycle phase in which a node failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Execute,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prepare => "prepare",
            Phase::Execute => "execute",
            Phase::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Errors surfaced to the caller of a flow run.
///
/// A failure aborts the traversal it happened in and propagates to the nearest
/// enclosing `run`. Mutations already applied to the shared context stay applied.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A node failed and neither retries nor its fallback recovered it
    #[error("node '{node_id}' failed in {phase} phase after {attempts} attempt(s): {source}")]
    NodeFailed {
        node_id: String,
        phase: Phase,
        /// Execute attempts made; 1 for prepare/finalize failures.
        attempts: u32,
        #[source]
        source: NodeError,
    },

    /// One iteration of a batch flow or batch node failed; it fails the whole batch
    #[error("batch iteration {index} failed: {source}")]
    IterationFailed {
        index: usize,
        #[source]
        source: Box<FlowError>,
    },

    /// The graph handed to a flow does not resolve
    #[error("invalid flow graph: {}", format_validation_errors(.0))]
    InvalidGraph(Vec<ValidationError>),
}

impl FlowError {
    /// The innermost node error, looking through batch iteration wrappers.
    pub fn root_node_error(&self) -> Option<&NodeError> {
        match self {
            FlowError::NodeFailed { source, .. } => Some(source),
            FlowError::IterationFailed { source, .. } => source.root_node_error(),
            FlowError::InvalidGraph(_) => None,
        }
    }

    /// Id of the node that originally failed, looking through batch wrappers.
    pub fn failed_node_id(&self) -> Option<&str> {
        match self {
            FlowError::NodeFailed { node_id, .. } => Some(node_id),
            FlowError::IterationFailed { source, .. } => source.failed_node_id(),
            FlowError::InvalidGraph(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.root_node_error().is_some_and(NodeError::is_cancelled)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
