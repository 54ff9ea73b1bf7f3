// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Action key used when a node's finalize phase does not pick one.
pub const DEFAULT_ACTION: &str = "default";

/// Branch key returned by a node's finalize phase.
///
/// An action is the only way a node selects its successor: the flow looks it up
/// in the node's transition table and stops when nothing is registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action(String);

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_ACTION
    }
}

impl Default for Action {
    fn default() -> Self {
        Self(DEFAULT_ACTION.to_string())
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Action {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// `None` maps to the default action, matching nodes that "return nothing".
impl<T: Into<Action>> From<Option<T>> for Action {
    fn from(name: Option<T>) -> Self {
        name.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_action_is_default() {
        let action: Action = None::<&str>.into();
        assert!(action.is_default());
        assert_eq!(action.as_str(), DEFAULT_ACTION);
    }

    #[test]
    fn test_named_action() {
        let action: Action = Some("continue").into();
        assert_eq!(action, Action::new("continue"));
        assert!(!action.is_default());
        assert_eq!(action.to_string(), "continue");
    }
}
