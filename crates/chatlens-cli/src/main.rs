//! chatlens terminal client.
//!
//! Chats with Gemini, analyzes images and keeps a browsable archive of past
//! conversations and favorite replies.

mod command;
mod render;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chatlens_core::chat::{ChatArchive, KeyValueStore};
use chatlens_core::session::ChatSession;
use chatlens_infrastructure::{
    ChatlensPaths, ConfigService, FileImagePicker, JsonFileStore, MemoryStore,
};
use chatlens_interaction::GeminiApiAgent;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use render::TerminalNotifier;
use repl::Repl;

#[derive(Parser, Debug)]
#[command(name = "chatlens", version, about = "Chat and image analysis with Gemini")]
struct Cli {
    /// Keep config and data under this directory instead of the platform defaults
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep histories and favorites in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Override the text model from config.toml
    #[arg(long)]
    text_model: Option<String>,

    /// Override the image-analysis model from config.toml
    #[arg(long)]
    vision_model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a secret.json template for the API key
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = ChatlensPaths::resolve(cli.data_dir.as_deref())?;
    let _log_guard = init_logging(&paths)?;
    let config_service = ConfigService::new(paths.clone());

    if let Some(Commands::Init) = cli.command {
        let secret_file = paths.secret_file();
        if config_service.ensure_secret_file()? {
            println!("Created {}", secret_file.display());
        } else {
            println!("{} already exists", secret_file.display());
        }
        return Ok(());
    }

    let mut config = config_service
        .load_config()
        .context("Failed to load config.toml")?;
    if let Some(model) = cli.text_model {
        config.text_model = model;
    }
    if let Some(model) = cli.vision_model {
        config.vision_model = model;
    }

    let api_key = match config_service.gemini_api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            eprintln!(
                "{}",
                format!(
                    "Set GEMINI_API_KEY or run `chatlens init` and edit {}",
                    paths.secret_file().display()
                )
                .yellow()
            );
            return Err(e.into());
        }
    };

    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(paths.store_dir()))
    };
    let archive = Arc::new(ChatArchive::open(store).await);
    let service = Arc::new(GeminiApiAgent::from_config(api_key, &config));
    let picker = Arc::new(FileImagePicker::new());

    let session = ChatSession::new(archive, service, picker.clone(), Arc::new(TerminalNotifier))
        .with_analysis_prompt(config.analysis_prompt);

    tracing::info!(
        text_model = %config.text_model,
        vision_model = %config.vision_model,
        ephemeral = cli.ephemeral,
        "chatlens starting"
    );

    Repl::new(Arc::new(session), picker).run().await?;

    tracing::info!("chatlens stopped");
    Ok(())
}

/// Logs to a daily rolling file so the terminal stays clean.
///
/// `RUST_LOG` overrides the default `chatlens=info` filter.
fn init_logging(paths: &ChatlensPaths) -> Result<WorkerGuard> {
    let logs_dir = paths.logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "chatlens.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("chatlens=info,chatlens_core=info,chatlens_infrastructure=info,chatlens_interaction=info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
