//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod settings;
pub mod transcripts;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::chat::{run_chat, ChatOptions};
use crate::cli::settings::{run_set, run_unset};
use crate::cli::transcripts::run_transcripts;
use crate::core::config::Config;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "sillage")]
#[command(version)]
#[command(about = "A streaming chat client for OpenAI-compatible APIs")]
#[command(
    long_about = "Sillage sends your messages to an OpenAI-compatible chat completion endpoint \
and prints the reply as it streams in, including the model's reasoning when the provider \
sends it separately.\n\n\
Environment Variables:\n\
  SILLAGE_API_KEY   API key (falls back to OPENAI_API_KEY)\n\
  RUST_LOG          Diagnostic log filter, overrides -v\n\n\
Controls:\n\
  Enter             Send the message\n\
  Ctrl+C            Cancel the response while it streams; quit at the prompt\n\
  Ctrl+D            Quit\n\n\
Commands:\n\
  /help             List chat commands\n\
  /save <name>      Store the conversation as a named transcript\n\
  /load <name>      Replace the conversation with a stored transcript"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat (overrides default-model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Upper bound on generated tokens per response
    #[arg(long, global = true, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: Option<u32>,

    /// Send only the newest message instead of the whole conversation
    #[arg(long, global = true)]
    pub single_turn: bool,

    /// Mirror the conversation into an auto-refreshing HTML page
    #[arg(long, global = true, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Start from a stored transcript
    #[arg(long, global = true, value_name = "NAME")]
    pub load: Option<String>,

    /// API key (overrides SILLAGE_API_KEY and OPENAI_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// API base URL (overrides base-url)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Increase diagnostic logging on stderr (-v, -vv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the current configuration
    Config,
    /// Manage stored transcripts
    Transcripts {
        #[command(subcommand)]
        action: TranscriptAction,
    },
}

#[derive(Subcommand)]
pub enum TranscriptAction {
    /// List stored transcripts
    List,
    /// Print a stored transcript
    Show { name: String },
    /// Delete a stored transcript
    Delete { name: String },
}

/// Git description baked in at build time.
pub fn git_describe() -> &'static str {
    option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown")
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async_main());
    // Stdin is read on a blocking thread that cannot be interrupted.
    runtime.shutdown_background();
    result
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let mut args = Args::parse();
    init_tracing(args.verbose);

    match args.command.take() {
        Some(Commands::Set { key, value }) => {
            let mut config = Config::load()?;
            let message = run_set(&mut config, &key, &value)?;
            config.save()?;
            println!("✅ {message}");
            Ok(())
        }
        Some(Commands::Unset { key }) => {
            let mut config = Config::load()?;
            let message = run_unset(&mut config, &key)?;
            config.save()?;
            println!("✅ {message}");
            Ok(())
        }
        Some(Commands::Config) => {
            let config = Config::load()?;
            config.print_all();
            Ok(())
        }
        Some(Commands::Transcripts { action }) => {
            let config = Config::load()?;
            run_transcripts(&config, &action)
        }
        Some(Commands::Chat) | None => {
            let config = Config::load()?;
            run_chat(ChatOptions::from_args(args), config).await
        }
    }
}
