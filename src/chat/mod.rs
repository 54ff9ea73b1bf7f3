// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Terminal chat loop built from a single self-looping node.
//!
//! ```text
//!   +--continue--+
//!   v            |
//! [chat] --------+
//! ```
//!
//! The chat node reads one line per visit. A reply routes `continue` back to
//! itself. The `exit` command or end of input says goodbye and returns the
//! default action, which has no successor, so the flow ends on that visit.

mod io;

pub use io::{ChatRequest, EchoResponder, LineSource, Responder, ScriptedSource, StdinSource};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::consts::{CONTINUE_ACTION, EXIT_COMMAND};
use crate::context::{Action, Params};
use crate::engine::{Flow, RetryPolicy};
use crate::errors::{FlowError, NodeError};
use crate::graph::Graph;
use crate::traits::Node;

/// Model name passed to the responder when params do not set `model`.
pub const DEFAULT_MODEL: &str = "echo";
/// Reply recorded when the responder fails and retries are exhausted.
pub const APOLOGY: &str = "Sorry, I could not come up with a reply.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shared context of a chat run: the transcript and whether it has ended.
#[derive(Debug, Default)]
pub struct ChatState {
    messages: Mutex<Vec<Message>>,
    ended: AtomicBool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: Message) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed exchanges (assistant replies).
    pub fn turns(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .count()
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// One exchange: read a line, ask the responder, record and print the reply.
///
/// When the user leaves, the visit prints `Goodbye!`, marks the state ended and
/// returns the default action.
pub struct ChatTurnNode<L, R> {
    source: L,
    responder: R,
    print_replies: bool,
    retry: Option<RetryPolicy>,
}

impl<L, R> ChatTurnNode<L, R>
where
    L: LineSource,
    R: Responder,
{
    pub fn new(source: L, responder: R) -> Self {
        Self {
            source,
            responder,
            print_replies: false,
            retry: None,
        }
    }

    /// Print replies and the goodbye to stdout.
    pub fn printing_replies(mut self) -> Self {
        self.print_replies = true;
        self
    }

    /// Retry the responder with this policy instead of the graph default.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }
}

#[async_trait]
impl<L, R> Node<ChatState> for ChatTurnNode<L, R>
where
    L: LineSource,
    R: Responder,
{
    /// `None` when the user asked to leave.
    type Prep = Option<ChatRequest>;
    type Output = Option<String>;

    async fn prepare(&self, shared: &ChatState, params: &Params) -> Result<Self::Prep, NodeError> {
        let line = tokio::select! {
            line = self.source.read_line() => line?,
            _ = params.cancellation().cancelled() => return Err(NodeError::Cancelled),
        };

        let Some(line) = line else {
            return Ok(None);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            return Ok(None);
        }

        shared.push(Message::user(line));
        Ok(Some(ChatRequest {
            model: params.get_str("model").unwrap_or(DEFAULT_MODEL).to_string(),
            history: shared.messages(),
        }))
    }

    async fn execute(&self, prep: &Self::Prep) -> Result<Self::Output, NodeError> {
        match prep {
            Some(request) => Ok(Some(self.responder.respond(request).await?)),
            None => Ok(None),
        }
    }

    async fn execute_fallback(
        &self,
        prep: &Self::Prep,
        error: NodeError,
    ) -> Result<Self::Output, NodeError> {
        match prep {
            Some(_) => Ok(Some(APOLOGY.to_string())),
            None => Err(error),
        }
    }

    async fn finalize(
        &self,
        shared: &ChatState,
        _params: &Params,
        _prep: Self::Prep,
        output: Self::Output,
    ) -> Result<Action, NodeError> {
        let Some(reply) = output else {
            if self.print_replies {
                println!("Goodbye!");
            }
            shared.end();
            return Ok(Action::default());
        };
        if self.print_replies {
            println!("Assistant: {reply}");
        }
        shared.push(Message::assistant(reply));
        Ok(Action::new(CONTINUE_ACTION))
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.clone()
    }
}

/// Wire a chat node into a single-node graph that loops on `continue`.
///
/// `print` controls whether replies and the goodbye are written to stdout.
pub fn build_chat_flow<L, R>(
    node: ChatTurnNode<L, R>,
    default_retry: RetryPolicy,
    print: bool,
) -> Result<Flow<ChatState>, FlowError>
where
    L: LineSource + 'static,
    R: Responder + 'static,
{
    let node = if print { node.printing_replies() } else { node };

    let mut graph = Graph::new().with_default_retry(default_retry);
    graph
        .add_node("chat", node)
        .on("chat", CONTINUE_ACTION, "chat");

    Ok(Flow::new(graph, "chat")?.with_name("chat"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use tokio_util::sync::CancellationToken;

    /// Fails the first `failures` calls, then echoes.
    struct Unreliable {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Responder for Unreliable {
        async fn respond(&self, request: &ChatRequest) -> Result<String, NodeError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(NodeError::failed("model overloaded"));
            }
            EchoResponder.respond(request).await
        }
    }

    fn scripted_flow(lines: &[&str]) -> Flow<ChatState> {
        let node = ChatTurnNode::new(ScriptedSource::new(lines.to_vec()), EchoResponder);
        build_chat_flow(node, RetryPolicy::default(), false).unwrap()
    }

    #[tokio::test]
    async fn test_two_turns_then_exit() {
        let state = ChatState::new();

        let traversal = scripted_flow(&["hi", "hi", "exit"]).run(&state).await.unwrap();

        assert_eq!(traversal.steps, 3);
        assert_eq!(traversal.last_node, "chat");
        assert!(traversal.action.is_default());
        assert_eq!(state.turns(), 2);
        assert!(state.is_ended());
        assert_eq!(
            state.messages(),
            vec![
                Message::user("hi"),
                Message::assistant("You said: hi"),
                Message::user("hi"),
                Message::assistant("You said: hi"),
            ]
        );
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let state = ChatState::new();

        let traversal = scripted_flow(&["hello"]).run(&state).await.unwrap();

        assert_eq!(traversal.steps, 2);
        assert_eq!(state.turns(), 1);
        assert!(state.is_ended());
    }

    #[tokio::test]
    async fn test_exit_is_case_insensitive_and_trimmed() {
        let state = ChatState::new();

        scripted_flow(&["  EXIT  "]).run(&state).await.unwrap();

        assert!(state.messages().is_empty());
        assert!(state.is_ended());
    }

    #[tokio::test]
    async fn test_responder_retried_before_fallback() {
        let state = ChatState::new();
        let responder = Unreliable {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let node = ChatTurnNode::new(ScriptedSource::new(["ping", "exit"]), responder)
            .with_retry(RetryPolicy::new(3));

        build_chat_flow(node, RetryPolicy::default(), false)
            .unwrap()
            .run(&state)
            .await
            .unwrap();

        assert_eq!(state.messages()[1], Message::assistant("You said: ping"));
    }

    #[tokio::test]
    async fn test_exhausted_responder_apologizes() {
        let state = ChatState::new();
        let responder = Unreliable {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let node = ChatTurnNode::new(ScriptedSource::new(["ping", "exit"]), responder);

        build_chat_flow(node, RetryPolicy::new(2), false)
            .unwrap()
            .run(&state)
            .await
            .unwrap();

        assert_eq!(state.messages()[1], Message::assistant(APOLOGY));
    }

    #[tokio::test]
    async fn test_model_param_reaches_responder() {
        struct ModelName;

        #[async_trait]
        impl Responder for ModelName {
            async fn respond(&self, request: &ChatRequest) -> Result<String, NodeError> {
                Ok(request.model.clone())
            }
        }

        let state = ChatState::new();
        let node = ChatTurnNode::new(ScriptedSource::new(["which model?"]), ModelName);
        build_chat_flow(node, RetryPolicy::default(), false)
            .unwrap()
            .run_with(&state, &Params::new().with("model", "large"))
            .await
            .unwrap();

        assert_eq!(state.messages()[1], Message::assistant("large"));
    }

    /// Never yields a line.
    struct Silent;

    #[async_trait]
    impl LineSource for Silent {
        async fn read_line(&self) -> Result<Option<String>, NodeError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_waiting_for_input() {
        let state = ChatState::new();
        let token = CancellationToken::new();
        token.cancel();
        let flow =
            build_chat_flow(ChatTurnNode::new(Silent, EchoResponder), RetryPolicy::default(), false)
                .unwrap();

        let err = flow
            .run_with(&state, &Params::new().with_cancellation(token))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!state.is_ended());
    }
}
