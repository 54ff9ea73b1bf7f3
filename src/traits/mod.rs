// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod batch_plan;
pub mod executable;
pub mod flow_hooks;
pub mod node;

pub use batch_plan::BatchPlan;
pub use executable::{Executable, Invocation};
pub use flow_hooks::FlowHooks;
pub use node::{BatchNode, Node};
