use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{HttpQaBackend, QaBackend, SessionEvent, SessionOrchestrator};
use shared::domain::{Document, ServerStatus};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{parse_command, Command, HELP_TEXT};
use config::{load_settings, normalize_server_url};

#[derive(Parser, Debug)]
#[command(name = "docqa", about = "Ask questions about a PDF through a QA server")]
struct Args {
    /// QA server base url; overrides config and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Tracing filter, e.g. `info` or `client_core=debug`.
    #[arg(long)]
    log_filter: Option<String>,
    /// Config file to use instead of the discovered one.
    #[arg(long)]
    config: Option<PathBuf>,
    /// PDF to upload as soon as the server is reachable.
    #[arg(long)]
    document: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(log_filter) = args.log_filter {
        settings.log_filter = log_filter;
    }

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server_url = normalize_server_url(&settings.server_url)?;
    let backend: Arc<dyn QaBackend> = Arc::new(HttpQaBackend::new(&server_url)?);
    let session = SessionOrchestrator::new(backend);
    let mut events = session.subscribe();

    println!("Checking {server_url} ...");
    let status = drive(session.start(), &mut events).await;
    if status == ServerStatus::Offline {
        println!("{}", render::OFFLINE_TITLE);
        println!("{}", render::OFFLINE_HINT);
        return Err(anyhow!("QA server at {server_url} is unreachable"));
    }
    info!(%server_url, "session started");

    if let Some(path) = args.document.as_deref() {
        upload_file(&session, &mut events, path).await;
    }

    println!("{HELP_TEXT}");
    repl(&session, &mut events).await
}

async fn repl(
    session: &Arc<SessionOrchestrator>,
    events: &mut broadcast::Receiver<SessionEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP_TEXT}"),
            Command::Status => println!("{}", render::render_status(&session.snapshot().await)),
            Command::Unknown(input) => println!("Unknown command '{input}'. Try /help."),
            Command::Upload(path) => upload_file(session, events, &path).await,
            Command::Ask(question) => {
                if let Err(err) = drive(session.ask(&question), events).await {
                    if let Some(text) = render::render_refusal(&err) {
                        println!("{text}");
                    }
                }
            }
        }
    }

    debug!("input closed; ending session");
    Ok(())
}

async fn upload_file(
    session: &Arc<SessionOrchestrator>,
    events: &mut broadcast::Receiver<SessionEvent>,
    path: &Path,
) {
    let document = match read_document(path).await {
        Ok(document) => document,
        Err(err) => {
            println!("! {err:#}");
            return;
        }
    };

    match drive(session.upload(document), events).await {
        Ok(ack) => println!("{}", ack.message),
        Err(err) => {
            if let Some(text) = render::render_refusal(&err) {
                println!("{text}");
            }
        }
    }
}

async fn read_document(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("'{}' does not name a file", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(Document::new(name, bytes))
}

/// Awaits `operation` while printing the session events it produces, so the
/// loading indicator shows up before the answer does.
async fn drive<F: Future>(
    operation: F,
    events: &mut broadcast::Receiver<SessionEvent>,
) -> F::Output {
    tokio::pin!(operation);
    loop {
        tokio::select! {
            biased;
            Ok(event) = events.recv() => print_event(&event),
            output = &mut operation => {
                while let Ok(event) = events.try_recv() {
                    print_event(&event);
                }
                return output;
            }
        }
    }
}

fn print_event(event: &SessionEvent) {
    if let Some(line) = render::render_event(event) {
        println!("{line}");
    }
}
