// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Where chat input comes from and who answers it.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::chat::{Message, Role};
use crate::errors::NodeError;

/// A source of user lines. `Ok(None)` means the input is exhausted.
#[async_trait]
pub trait LineSource: Send + Sync {
    async fn read_line(&self) -> Result<Option<String>, NodeError>;
}

/// Reads lines from the process's stdin, printing a prompt before each one.
///
/// Lines are read on a dedicated thread and handed over through a channel. A
/// read still blocked on the terminal when the runtime shuts down is left
/// behind with that thread instead of holding up the shutdown.
pub struct StdinSource {
    prompt: String,
    lines: tokio::sync::Mutex<mpsc::Receiver<std::io::Result<String>>>,
}

impl StdinSource {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self::from_reader(prompt, std::io::BufReader::new(std::io::stdin()))
    }

    fn from_reader<R>(prompt: impl Into<String>, reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        spawn_reader(reader, tx);
        Self {
            prompt: prompt.into(),
            lines: tokio::sync::Mutex::new(rx),
        }
    }
}

fn spawn_reader<R>(reader: R, tx: mpsc::Sender<std::io::Result<String>>)
where
    R: BufRead + Send + 'static,
{
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
}

#[async_trait]
impl LineSource for StdinSource {
    async fn read_line(&self) -> Result<Option<String>, NodeError> {
        if !self.prompt.is_empty() {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(self.prompt.as_bytes()).await?;
            stdout.flush().await?;
        }

        let mut lines = self.lines.lock().await;
        match lines.recv().await {
            Some(line) => Ok(Some(line?)),
            None => Ok(None),
        }
    }
}

/// Replays a fixed script of lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    lines: Mutex<VecDeque<String>>,
}

impl ScriptedSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LineSource for ScriptedSource {
    async fn read_line(&self) -> Result<Option<String>, NodeError> {
        Ok(self
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front())
    }
}

/// What a responder is asked: the model to use and the conversation so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn last_user_message(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
    }
}

/// Produces the assistant's reply to a conversation.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: &ChatRequest) -> Result<String, NodeError>;
}

/// Replies by repeating the user's last message.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponder;

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, request: &ChatRequest) -> Result<String, NodeError> {
        request
            .last_user_message()
            .map(|content| format!("You said: {content}"))
            .ok_or_else(|| NodeError::failed("conversation has no user message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_drains_in_order() {
        let source = ScriptedSource::new(["a", "b"]);

        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("a"));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("b"));
        assert_eq!(source.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_lines_arrive_in_order_then_end() {
        let source = StdinSource::from_reader("", std::io::Cursor::new("first\nsecond\n"));

        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(source.read_line().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_pending_read_does_not_hold_up_runtime_shutdown() {
        use std::os::unix::net::UnixStream;
        use std::time::{Duration, Instant};

        // The writer end stays open, so the reader thread blocks like a quiet terminal.
        let (_writer, reader) = UnixStream::pair().unwrap();
        let source = StdinSource::from_reader("", std::io::BufReader::new(reader));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let read = runtime.block_on(async {
            tokio::time::timeout(Duration::from_millis(50), source.read_line()).await
        });
        assert!(read.is_err());

        let started = Instant::now();
        drop(runtime);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_echo_repeats_last_user_message() {
        let request = ChatRequest {
            model: "echo".into(),
            history: vec![
                Message::user("first"),
                Message::assistant("You said: first"),
                Message::user("second"),
            ],
        };

        assert_eq!(
            EchoResponder.respond(&request).await.unwrap(),
            "You said: second"
        );
    }

    #[tokio::test]
    async fn test_echo_without_user_message_fails() {
        let request = ChatRequest {
            model: "echo".into(),
            history: vec![],
        };

        assert!(EchoResponder.respond(&request).await.is_err());
    }
}
