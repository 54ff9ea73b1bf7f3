// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by node implementations from any lifecycle phase.

use thiserror::Error;

/// Failure produced inside a node's prepare, execute, fallback or finalize phase.
///
/// Node bodies usually build one with [`NodeError::failed`] or lift any other
/// error through `anyhow` with `?`.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The node's own work failed with a plain message.
    #[error("{0}")]
    Failed(String),

    /// Work was abandoned because the run's cancellation token fired.
    /// The retry loop never retries this variant.
    #[error("execution cancelled")]
    Cancelled,

    /// Any other error surfaced by node code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NodeError {
    pub fn failed(message: impl Into<String>) -> Self {
        NodeError::Failed(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NodeError::Cancelled)
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Other(err.into())
    }
}

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        NodeError::Other(err.into())
    }
}
