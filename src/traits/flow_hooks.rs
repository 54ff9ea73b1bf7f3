// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::context::{Action, Params, SharedContext};
use crate::engine::Traversal;
use crate::errors::NodeError;

/// Prepare/finalize hooks around a plain flow's traversal.
///
/// With hooks attached a flow follows the same three phases as a node:
/// `prepare`, then the traversal as its execute step, then `finalize`. The
/// action `finalize` returns becomes the flow's action, which is what an
/// enclosing graph routes on. Both hooks default to passing through.
#[async_trait]
pub trait FlowHooks<S>: Send + Sync
where
    S: SharedContext,
{
    async fn prepare(&self, _shared: &S, _params: &Params) -> Result<(), NodeError> {
        Ok(())
    }

    async fn finalize(
        &self,
        _shared: &S,
        _params: &Params,
        traversal: &Traversal,
    ) -> Result<Action, NodeError> {
        Ok(traversal.action.clone())
    }
}
