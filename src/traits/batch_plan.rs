// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::context::{Action, Params, SharedContext};
use crate::engine::Traversal;
use crate::errors::NodeError;

/// Prepare/finalize hooks of a batch flow.
///
/// `prepare` decides how many traversals run: one per returned `Params` entry,
/// each merged over the flow's params. `finalize` sees the entries and the
/// per-iteration [`Traversal`] summaries in entry order; anything worth keeping
/// beyond that must be recorded in the shared context by the nodes themselves.
#[async_trait]
pub trait BatchPlan<S>: Send + Sync
where
    S: SharedContext,
{
    async fn prepare(&self, shared: &S, params: &Params) -> Result<Vec<Params>, NodeError>;

    async fn finalize(
        &self,
        _shared: &S,
        _params: &Params,
        _items: Vec<Params>,
        _traversals: &[Traversal],
    ) -> Result<Action, NodeError> {
        Ok(Action::default())
    }
}

/// A fixed list of iteration params, for batches whose items are known up front.
#[async_trait]
impl<S> BatchPlan<S> for Vec<Params>
where
    S: SharedContext,
{
    async fn prepare(&self, _shared: &S, _params: &Params) -> Result<Vec<Params>, NodeError> {
        Ok(self.clone())
    }
}
