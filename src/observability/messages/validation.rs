// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph construction and validation events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A transition registration replaced an earlier one for the same action.
///
/// # Log Level
/// `warn!` - Last registration wins
///
/// # Example
/// ```
/// use nodeflow::observability::messages::validation::SuccessorOverwritten;
///
/// let msg = SuccessorOverwritten {
///     node_id: "decide",
///     action: "search",
///     previous: "search_web",
///     replacement: "search_docs",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct SuccessorOverwritten<'a> {
    pub node_id: &'a str,
    pub action: &'a str,
    pub previous: &'a str,
    pub replacement: &'a str,
}

impl Display for SuccessorOverwritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Overwriting successor for action '{}' on node '{}': '{}' -> '{}'",
            self.action, self.node_id, self.previous, self.replacement
        )
    }
}

impl StructuredLog for SuccessorOverwritten<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            action = self.action,
            previous = self.previous,
            replacement = self.replacement,
            "{}", self
        );
    }
}

/// A node id was registered twice; the newer node replaces the older one.
///
/// # Log Level
/// `warn!`
pub struct NodeReplaced<'a> {
    pub node_id: &'a str,
}

impl Display for NodeReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node id '{}' registered twice, replacing earlier node", self.node_id)
    }
}

impl StructuredLog for NodeReplaced<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, "{}", self);
    }
}

/// Graph validation rejected a flow.
///
/// # Log Level
/// `error!`
pub struct GraphRejected<'a> {
    pub flow: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for GraphRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Flow '{}' graph rejected: {}", self.flow, self.error)
    }
}

impl StructuredLog for GraphRejected<'_> {
    fn log(&self) {
        tracing::error!(flow = self.flow, error = %self.error, "{}", self);
    }
}
