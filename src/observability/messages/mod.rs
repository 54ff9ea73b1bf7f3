// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `engine` - flow traversal, transitions and batch fan-out
//! * `node` - node lifecycle, retries and fallbacks
//! * `validation` - graph construction warnings and validation failures

use tracing::Span;

pub mod engine;
pub mod node;
pub mod validation;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the message through `tracing` at the message's level.
    fn log(&self);

    /// Open a span carrying the message's fields. Messages that do not mark the
    /// start of a unit of work fall back to a bare span.
    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("nodeflow", span_name = name)
    }
}
