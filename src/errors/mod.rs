// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod flow;
mod node;
mod validation;

pub use config::ConfigError;
pub use flow::{FlowError, Phase};
pub use node::NodeError;
pub use validation::ValidationError;
