// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational logging in the engine goes through message
//! structs in [`messages`]. Each one implements `Display` for the human-readable
//! line and [`messages::StructuredLog`] to emit it with structured fields at the
//! right level, so log text is never assembled ad hoc at call sites.
//!
//! # Usage
//!
//! ```rust
//! use nodeflow::observability::messages::node::ExecuteAttemptFailed;
//! use nodeflow::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "timeout");
//! ExecuteAttemptFailed {
//!     node_id: "fetch",
//!     attempt: 1,
//!     max_attempts: 3,
//!     error: &error,
//! }
//! .log();
//! ```
//!
//! Installing a subscriber is left to the embedding application; the
//! `nodeflow-chat` binary uses `tracing-subscriber` with an `EnvFilter`.

pub mod messages;
