// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use nodeflow::chat::{
    build_chat_flow, ChatState, ChatTurnNode, EchoResponder, LineSource, ScriptedSource,
    StdinSource,
};
use nodeflow::config::{load_and_validate_config, EngineConfig};
use nodeflow::engine::Traversal;
use nodeflow::errors::FlowError;

/// Exit code conventionally used for a run interrupted by Ctrl-C
const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Terminal chat loop driven by a self-looping flow node
#[derive(Parser, Debug)]
#[command(name = "nodeflow-chat", version, about)]
struct Args {
    /// Engine config file (.yaml, .yml or .toml)
    #[arg(short, long, env = "NODEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Answer a single prompt and exit instead of reading stdin
    #[arg(short, long)]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match run(args, cancellation).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) if is_interrupt(&err) => {
            eprintln!("\nInterrupted");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, cancellation: CancellationToken) -> anyhow::Result<Traversal> {
    let cfg = match &args.config {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };

    match args.prompt {
        Some(prompt) => chat(ScriptedSource::new([prompt]), &cfg, cancellation).await,
        None => {
            println!("Welcome to the chat! Type 'exit' to end the conversation.");
            chat(StdinSource::new("You: "), &cfg, cancellation).await
        }
    }
}

async fn chat<L>(
    source: L,
    cfg: &EngineConfig,
    cancellation: CancellationToken,
) -> anyhow::Result<Traversal>
where
    L: LineSource + 'static,
{
    let node = ChatTurnNode::new(source, EchoResponder);
    let flow = build_chat_flow(node, cfg.retry_policy(), true)?;
    let params = cfg.default_params().with_cancellation(cancellation);

    let state = ChatState::new();
    let traversal = flow.run_with(&state, &params).await?;
    Ok(traversal)
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    err.downcast_ref::<FlowError>()
        .is_some_and(FlowError::is_cancelled)
}
