// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph validation run when a flow is constructed.
//!
//! A flow walks its graph by id lookups, so every id it can reach must resolve.
//! Validation checks, in order:
//!
//! 1. **Start node**: the flow's start id is registered
//! 2. **Transition sources**: every node that owns transitions is registered
//! 3. **Successors**: every transition target is registered
//!
//! All problems are collected rather than stopping at the first one, so a
//! misconfigured graph can be fixed in one pass. Cycles are legal and are not
//! checked; termination is decided at run time by actions.

use super::{NodeMap, TransitionTable};
use crate::context::SharedContext;
use crate::errors::ValidationError;

pub fn validate_graph<S>(
    nodes: &NodeMap<S>,
    transitions: &TransitionTable,
    start: &str,
) -> Result<(), Vec<ValidationError>>
where
    S: SharedContext,
{
    let mut errors = Vec::new();

    if !nodes.contains_key(start) {
        errors.push(ValidationError::UnknownStartNode {
            node_id: start.to_string(),
        });
    }

    let mut edges = transitions.edges().collect::<Vec<_>>();
    edges.sort_unstable();

    for (from, action, to) in edges {
        if !nodes.contains_key(from) {
            errors.push(ValidationError::UnknownTransitionSource {
                node_id: from.to_string(),
                action: action.to_string(),
            });
        }
        if !nodes.contains_key(to) {
            errors.push(ValidationError::UnresolvedSuccessor {
                node_id: from.to_string(),
                action: action.to_string(),
                successor: to.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
