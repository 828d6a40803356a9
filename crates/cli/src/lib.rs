//! # Context Desk
//!
//! Serves a directory to a browser, lets the user pick files and sends the
//! picked files together with a prompt to a chat-completion model.
//!
//! ```text
//! context-desk serve ./project
//!     │
//!     ├──> GET  /api/files, /api/tree      (scanner + tree)
//!     ├──> POST /api/sessions/{id}/toggle  (session selection)
//!     └──> POST /api/sessions/{id}/submit  (gateway)
//! ```

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_gateway::{GatewayConfig, ModelGateway};
use context_protocol::serialize_json;
use context_scanner::PathScanner;
use std::io;
use std::path::PathBuf;

mod config;
mod flags;
mod http_api;
mod routes;
mod server_security;

pub use routes::{router, AppState};

use config::{resolve_root, ServeArgs, ServerConfig};
use flags::ScanFlags;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "context-desk")]
#[command(about = "Pick files from a directory and ask a chat model about them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the browser UI and JSON API for a directory
    Serve(ServeArgs),
    /// Print every file under a directory as JSON
    List(RootArgs),
    /// Print the directory tree
    Tree(RootArgs),
    /// Send one prompt with the given files and print the answer
    Ask(AskArgs),
}

#[derive(Args)]
struct RootArgs {
    /// Directory to scan
    root: PathBuf,

    #[command(flatten)]
    scan: ScanFlags,
}

#[derive(Args)]
struct AskArgs {
    /// Directory the file paths are relative to
    root: PathBuf,

    /// Question or instruction for the model
    #[arg(short, long)]
    prompt: String,

    /// Files to include, relative to the root, in the order given
    #[arg(required = true)]
    files: Vec<String>,
}

pub async fn main_entry() -> Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Transport crates are chatty at debug level.
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::List(args) => run_list(args)?,
        Commands::Tree(args) => run_tree(args)?,
        Commands::Ask(args) => run_ask(args).await?,
    }

    Ok(())
}

fn scan(args: &RootArgs) -> Result<Vec<context_protocol::FileDescriptor>> {
    let root = resolve_root(&args.root)?;
    PathScanner::new(&root)
        .with_options(args.scan.as_options())
        .scan()
        .with_context(|| format!("Failed to list files under {}", root.display()))
}

fn run_list(args: RootArgs) -> Result<()> {
    let files = scan(&args)?;
    print_stdout(&serialize_json(&files)?)
}

fn run_tree(args: RootArgs) -> Result<()> {
    let files = scan(&args)?;
    let rendered = context_tree::render_text(&context_tree::build(&files));
    print_stdout(rendered.trim_end_matches('\n'))
}

async fn run_ask(args: AskArgs) -> Result<()> {
    let root = resolve_root(&args.root)?;
    let gateway = ModelGateway::from_config(&root, &GatewayConfig::from_env())?;
    let answer = gateway.send(&args.prompt, &args.files).await?;
    print_stdout(&answer)
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::resolve(args, GatewayConfig::from_env())?;
    let bind = server_security::bind_target(&config.host, config.port);
    let addrs = server_security::resolve_guarded_bind_addrs(&bind, config.public).await?;
    let addr = server_security::choose_preferred_bind_addr(&addrs)
        .ok_or_else(|| anyhow::anyhow!("Bind address resolved to zero socket addrs: {bind}"))?;

    let gateway = ModelGateway::from_config(&config.root, &config.gateway)?;
    let state = AppState::new(
        config.root.clone(),
        config.scan.as_options(),
        gateway,
        config.max_sessions,
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    log::info!("Serving files from {}", config.root.display());
    print_stdout(&format!("Server is running on {base_url}"))?;
    print_stdout(&format!("Serving files from: {}", config.root.display()))?;
    if !config.gateway.is_configured() {
        print_stdout(&format!(
            "Submissions disabled: set {} to enable them",
            context_gateway::API_KEY_ENV
        ))?;
    }
    if config.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!("Try: curl {base_url}/health"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
