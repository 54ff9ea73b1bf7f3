// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::{Action, Params, SharedContext};
use crate::engine::RetryPolicy;
use crate::errors::FlowError;

/// What a graph tells a step about the slot it occupies.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Id under which the step is registered in the enclosing graph.
    pub node_id: &'a str,
    /// Params for this visit, already merged over the enclosing flow's defaults.
    pub params: &'a Params,
    /// Retry policy for steps that do not declare their own.
    pub default_retry: &'a RetryPolicy,
}

/// Anything that can occupy a slot in a graph: run to completion, hand back an action.
///
/// Typed [`Node`](crate::traits::Node) and [`BatchNode`](crate::traits::BatchNode)
/// implementations are wrapped in engine runners that implement this trait; flows,
/// batch flows and parallel batch flows implement it directly, which is what lets
/// a flow be nested inside another flow's graph.
#[async_trait]
pub trait Executable<S>: Send + Sync
where
    S: SharedContext,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError>;
}

#[async_trait]
impl<S, T> Executable<S> for Arc<T>
where
    S: SharedContext,
    T: Executable<S> + ?Sized,
{
    async fn invoke(&self, shared: &S, invocation: Invocation<'_>) -> Result<Action, FlowError> {
        (**self).invoke(shared, invocation).await
    }
}
