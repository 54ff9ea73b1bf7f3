// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data threaded through a run: per-invocation [`Params`], the [`Action`] a node
//! hands back, and [`SharedStore`], an optional ready-made shared context.
//!
//! The shared context itself is any [`SharedContext`] type chosen by the caller.
//! It is passed by reference into every phase of every node and is never
//! cloned, replaced or locked by the engine. Concurrent iterations of a
//! parallel batch all see the same reference, so mutation goes through
//! whatever interior mutability the caller picks: atomics, a `Mutex`,
//! index-addressed slots, or [`SharedStore`].

mod action;
mod params;
mod shared_store;

pub use action::{Action, DEFAULT_ACTION};
pub use params::Params;
pub use shared_store::SharedStore;

/// Types usable as the shared context of a run.
pub trait SharedContext: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> SharedContext for T {}
