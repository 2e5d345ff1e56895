//! CLI entrypoint for council
//!
//! Wires all layers together with dependency injection, runs one
//! deliberation turn, and prints the event stream to stdout as
//! newline-delimited JSON. Diagnostics go to stderr.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use council_application::{
    ConversationStore, RunCouncilInput, RunCouncilUseCase, TurnOutcome,
};
use council_infrastructure::{
    ConfigLoader, FileConversationStore, InMemoryConversationStore,
    bootstrap::{build_registry, resolve_api_key},
    write_events,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "council", about = "Ask a council of LLMs and stream the deliberation")]
struct Cli {
    /// The question to put before the council
    question: Option<String>,

    /// Councilor model id (repeatable; defaults come from config)
    #[arg(short, long = "model")]
    model: Vec<String>,

    /// Continue an existing conversation
    #[arg(long)]
    conversation: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep conversations in memory only (skip the file store)
    #[arg(long)]
    ephemeral: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List stored conversations
    Conversations,
    /// Delete a stored conversation
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout carries only the event stream.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref()).context("loading configuration")?;
    let settings = config.settings()?;

    // === Dependency Injection ===
    let store: Arc<dyn ConversationStore> = if cli.ephemeral {
        Arc::new(InMemoryConversationStore::new())
    } else {
        Arc::new(FileConversationStore::new(config.store_dir())?)
    };

    match cli.command {
        Some(Command::Conversations) => {
            for conversation in store.list().await? {
                println!(
                    "{}  {}  {} message(s)",
                    conversation.id,
                    conversation.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    conversation.messages.len()
                );
            }
            return Ok(());
        }
        Some(Command::Delete { id }) => {
            store.delete(&id).await?;
            info!(conversation = %id, "deleted");
            return Ok(());
        }
        None => {}
    }

    let Some(question) = cli.question else {
        bail!("A question is required. See --help.");
    };

    let api_key = resolve_api_key(&config)?;
    let registry = Arc::new(build_registry(&config, &settings, api_key)?);
    let use_case = RunCouncilUseCase::new(registry, store, settings);

    let mut input = RunCouncilInput::new(question);
    if !cli.model.is_empty() {
        input = input.with_models(cli.model.clone());
    }
    if let Some(id) = &cli.conversation {
        input = input.with_conversation(id);
    }

    // Ctrl-C cancels the turn; in-flight model calls unwind promptly.
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let run = use_case.run(input, cancel).await?;
    eprintln!("conversation: {}", run.conversation_id);

    let mut stdout = tokio::io::stdout();
    write_events(run.events, &mut stdout).await?;

    match run.outcome.await? {
        TurnOutcome::Completed(turn) => {
            info!(turn = %turn.turn_id, "turn complete");
            Ok(())
        }
        TurnOutcome::Failed { reason, .. } => bail!("turn failed: {reason}"),
        TurnOutcome::Cancelled => {
            info!("turn cancelled");
            Ok(())
        }
    }
}
