// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::context::{Action, Params, SharedContext};
use crate::engine::RetryPolicy;
use crate::errors::NodeError;

/// Atomic unit of work with a prepare -> execute -> finalize lifecycle.
///
/// - `prepare` reads the shared context and params and returns whatever `execute`
///   needs. It must not race sibling iterations when run under a parallel batch.
/// - `execute` does the work. It never sees the shared context, which keeps it
///   retryable and safe to run concurrently. It is retried per [`Node::retry_policy`];
///   when every attempt fails, [`Node::execute_fallback`] gets the last error.
/// - `finalize` is the only phase meant to mutate the shared context. It returns
///   the [`Action`] that selects the successor.
///
/// Prepare and finalize are never retried.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use nodeflow::context::{Action, Params, SharedStore};
/// use nodeflow::errors::NodeError;
/// use nodeflow::traits::Node;
///
/// struct Shout;
///
/// #[async_trait]
/// impl Node<SharedStore> for Shout {
///     type Prep = String;
///     type Output = String;
///
///     async fn prepare(&self, shared: &SharedStore, _params: &Params) -> Result<String, NodeError> {
///         shared
///             .get("text")
///             .and_then(|v| v.as_str().map(str::to_string))
///             .ok_or_else(|| NodeError::failed("no text"))
///     }
///
///     async fn execute(&self, text: &String) -> Result<String, NodeError> {
///         Ok(text.to_uppercase())
///     }
///
///     async fn finalize(
///         &self,
///         shared: &SharedStore,
///         _params: &Params,
///         _text: String,
///         loud: String,
///     ) -> Result<Action, NodeError> {
///         shared.insert("text", loud);
///         Ok(Action::default())
///     }
/// }
/// ```
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: SharedContext,
{
    /// Value handed from `prepare` to `execute` and `finalize`.
    type Prep: Send + Sync;
    /// Value produced by `execute` (or its fallback).
    type Output: Send;

    async fn prepare(&self, shared: &S, params: &Params) -> Result<Self::Prep, NodeError>;

    async fn execute(&self, prep: &Self::Prep) -> Result<Self::Output, NodeError>;

    /// Substitute result once every execute attempt has failed. Re-raises by default.
    async fn execute_fallback(
        &self,
        _prep: &Self::Prep,
        error: NodeError,
    ) -> Result<Self::Output, NodeError> {
        Err(error)
    }

    async fn finalize(
        &self,
        _shared: &S,
        _params: &Params,
        _prep: Self::Prep,
        _output: Self::Output,
    ) -> Result<Action, NodeError> {
        Ok(Action::default())
    }

    /// `None` defers to the owning graph's default policy.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}

/// Node whose execute phase runs once per prepared item.
///
/// Retries and fallback apply to each item on its own: one flaky item does not
/// re-run the items that already succeeded. `finalize` receives the items and
/// their outputs in the order `prepare` returned them, whether the node was
/// registered as sequential or parallel.
#[async_trait]
pub trait BatchNode<S>: Send + Sync
where
    S: SharedContext,
{
    type Item: Send + Sync;
    type Output: Send;

    async fn prepare(&self, shared: &S, params: &Params) -> Result<Vec<Self::Item>, NodeError>;

    async fn execute_item(&self, item: &Self::Item) -> Result<Self::Output, NodeError>;

    async fn execute_item_fallback(
        &self,
        _item: &Self::Item,
        error: NodeError,
    ) -> Result<Self::Output, NodeError> {
        Err(error)
    }

    async fn finalize(
        &self,
        _shared: &S,
        _params: &Params,
        _items: Vec<Self::Item>,
        _outputs: Vec<Self::Output>,
    ) -> Result<Action, NodeError> {
        Ok(Action::default())
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}
