// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod chat;          // terminal chat demo node
pub mod config;        // engine config files
pub mod context;       // params, actions, shared store
pub mod engine;        // flows, batch flows, retry
pub mod errors;        // error handling
pub mod graph;         // node registry + transitions
pub mod observability;
pub mod traits;        // node and step abstractions
