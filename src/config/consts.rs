// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Total execute attempts when neither node nor graph sets a retry policy
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
/// Backoff multiplier that keeps the delay between attempts fixed
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
/// Upper bound on `retry.max_attempts` accepted from a config file
pub const MAX_CONFIG_ATTEMPTS: u32 = 100;
/// Action the chat node returns to loop back onto itself
pub const CONTINUE_ACTION: &str = "continue";
/// Input that ends a chat session
pub const EXIT_COMMAND: &str = "exit";
