//! Command-line interface parsing and handling
//!
//! Every subcommand opens a [`Session`](session::Session) (config, base URL,
//! credentials, transcript) and hands it to the matching runner.

pub mod account;
pub mod ask;
pub mod history;
pub mod render;
pub mod session;
pub mod stream;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::account::{run_login, run_logout, run_set, run_unset};
use crate::cli::ask::{run_ask, run_plan, PlanArgs};
use crate::cli::history::{run_clear_history, run_health, run_history};
use crate::cli::session::Session;
use crate::cli::stream::run_stream;

#[derive(Parser)]
#[command(name = "blinderfit")]
#[command(about = "Ask the BlinderFit FitMentor assistant from your terminal")]
#[command(
    long_about = "blinderfit talks to the BlinderFit backend's AI assistant. Ask free-form \
questions, generate a personalized fitness plan, or stream an answer word by word.\n\n\
Authentication:\n\
  Use 'blinderfit login' to store your BlinderFit ID token in the system keyring.\n\n\
Environment Variables:\n\
  BLINDERFIT_API_BASE_URL   Backend base URL (overrides config and environment defaults)\n\
  BLINDERFIT_ENV            'development' (http://localhost:8000) or 'production'\n\
  BLINDERFIT_AUTH_TOKEN     Bearer token used when none is stored in the keyring\n\
  RUST_LOG                  Diagnostic log filter (diagnostics go to stderr)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Append questions and answers to this file (ask, plan and stream)
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the assistant a question
    Ask {
        /// Treat the question as a JSON value and send its serialized form
        #[arg(long)]
        json: bool,
        /// The question (multiple words are joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Generate a personalized fitness plan
    Plan(PlanArgs),
    /// Stream an answer word by word
    Stream {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Show recent conversations with the assistant
    History {
        /// Number of conversations to fetch
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
    /// Delete the stored conversation history
    ClearHistory,
    /// Check that the backend is reachable
    Health,
    /// Store an ID token in the system keyring (read from stdin)
    Login,
    /// Remove the stored ID token
    Logout,
    /// Set configuration values (prints the configuration without a value)
    Set {
        /// Configuration key to set (api-base-url, environment)
        key: Option<String>,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

fn init_tracing(verbose: u8) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let level = match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    if let Some(directive) =
        level.and_then(|level| format!("blinderfit={level}").parse::<Directive>().ok())
    {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Only commands that talk to the assistant write a transcript.
fn transcript_for(command: &Commands, log: Option<PathBuf>) -> Option<PathBuf> {
    match command {
        Commands::Ask { .. } | Commands::Plan(_) | Commands::Stream { .. } => log,
        _ => {
            if let Some(path) = &log {
                warn!(
                    path = %path.display(),
                    "--log only applies to ask, plan and stream; ignoring it"
                );
            }
            None
        }
    }
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let log = transcript_for(&args.command, args.log);
    match args.command {
        Commands::Login => run_login(),
        Commands::Logout => run_logout(),
        Commands::Set { key, value } => run_set(key, value),
        Commands::Unset { key } => run_unset(&key),
        Commands::Ask { json, question } => {
            let session = Session::open(log)?;
            run_ask(&session, question, json).await
        }
        Commands::Plan(plan) => {
            let session = Session::open(log)?;
            run_plan(&session, plan).await
        }
        Commands::Stream { prompt } => {
            let session = Session::open(log)?;
            run_stream(&session, prompt).await
        }
        Commands::History { limit } => {
            let session = Session::open(log)?;
            run_history(&session, limit).await
        }
        Commands::ClearHistory => {
            let session = Session::open(log)?;
            run_clear_history(&session).await
        }
        Commands::Health => {
            let session = Session::open(log)?;
            run_health(&session).await
        }
    }
}
