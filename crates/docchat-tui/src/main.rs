use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use docchat_core::{
    resolve_upload, BackendClient, ChatMode, Config, SelectedFile, TransferState,
    UploadFailurePolicy, FALLBACK_ANSWER,
};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "Upload a document and chat with it through a RAG backend")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "DOCCHAT_BASE_URL")]
    base_url: Option<String>,

    /// Answer strategy: rag or file_only
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ChatMode>,

    /// Stay on the upload screen when an upload fails instead of continuing
    #[arg(long)]
    report_upload_errors: bool,

    /// Where the interactive UI writes its log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Document to upload as soon as the UI starts
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and exit
    Upload {
        /// Path to the document
        path: PathBuf,
    },
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
        /// Upload this document first
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Check that the backend is reachable
    Check,
}

fn parse_mode(s: &str) -> Result<ChatMode, String> {
    ChatMode::from_str(s).ok_or_else(|| format!("unknown mode '{}', expected rag or file_only", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {}, using defaults", "Could not read config".yellow(), e);
        let mut config = Config::new();
        config.apply_env();
        config
    });
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(mode) = cli.mode {
        config.default_mode = mode;
    }
    if cli.report_upload_errors {
        config.upload_failure_policy = UploadFailurePolicy::Report;
    }

    let client = BackendClient::from_config(&config).context("building HTTP client")?;

    match cli.command {
        None => {
            let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
            logging::init_file(&log_path)?;
            run_tui(config, client, cli.file).await
        }
        Some(command) => {
            logging::init_stderr();
            match command {
                Commands::Upload { path } => upload_document(&config, &client, &path).await,
                Commands::Ask { question, file } => {
                    if let Some(path) = file {
                        upload_document(&config, &client, &path).await?;
                    }
                    ask_question(&client, &question, config.default_mode).await
                }
                Commands::Check => check_backend(&client).await,
            }
        }
    }
}

async fn run_tui(config: Config, client: BackendClient, initial_file: Option<PathBuf>) -> Result<()> {
    tracing::info!(base_url = %client.base_url(), "starting docchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(config, client, events.sender());

    if let Some(path) = initial_file {
        app.path_input = path.display().to_string();
        app.path_cursor = app.path_input.chars().count();
        app.select_file(&path);
    }

    let result = async {
        loop {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }

            if app.should_quit {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn upload_document(config: &Config, client: &BackendClient, path: &Path) -> Result<()> {
    let file = SelectedFile::from_path(path, &config.file_limits())?;

    println!(
        "{} {} {}",
        "Uploading".bold().cyan(),
        file.name.bold(),
        format!("({})", file.display_size()).dimmed()
    );

    let outcome = client
        .upload(&file, |progress| {
            eprint!("\r  {:>3}%", progress.percent());
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();

    match resolve_upload(&outcome, config.upload_failure_policy) {
        TransferState::Failed { reason } => {
            anyhow::bail!("upload of {} failed: {}", file.name, reason)
        }
        _ => {
            println!("{} {}", "Uploaded".bold().green(), file.name);
            Ok(())
        }
    }
}

async fn ask_question(client: &BackendClient, question: &str, mode: ChatMode) -> Result<()> {
    match client.chat(question, mode).await {
        Ok(answer) => println!("{}", answer),
        Err(e) => {
            tracing::warn!(error = %e, "chat request failed");
            println!("{}", FALLBACK_ANSWER.red());
        }
    }
    Ok(())
}

async fn check_backend(client: &BackendClient) -> Result<()> {
    match client.health().await {
        Ok(true) => {
            println!("{} {}", "Backend reachable at".green(), client.base_url().bold());
            Ok(())
        }
        Ok(false) => anyhow::bail!("backend at {} is returning server errors", client.base_url()),
        Err(e) => Err(e).with_context(|| format!("could not reach {}", client.base_url())),
    }
}
