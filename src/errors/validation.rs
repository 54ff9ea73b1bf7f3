// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during graph validation when a flow is constructed
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The flow's start node is not registered in the graph
    UnknownStartNode {
        /// The start node id that could not be found
        node_id: String,
    },
    /// A transition was registered on a node id that was never added
    UnknownTransitionSource {
        /// The node id that owns the transition
        node_id: String,
        /// The action key of the transition
        action: String,
    },
    /// A transition points at a successor that was never added
    UnresolvedSuccessor {
        /// The node that owns the transition
        node_id: String,
        /// The action key of the transition
        action: String,
        /// The successor id that couldn't be resolved
        successor: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownStartNode { node_id } => {
                write!(f, "Start node '{}' is not registered in the graph", node_id)
            }
            ValidationError::UnknownTransitionSource { node_id, action } => {
                write!(
                    f,
                    "Transition '{}' registered on node '{}' which does not exist",
                    action, node_id
                )
            }
            ValidationError::UnresolvedSuccessor {
                node_id,
                action,
                successor,
            } => {
                write!(
                    f,
                    "Node '{}' routes action '{}' to '{}' which does not exist",
                    node_id, action, successor
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
