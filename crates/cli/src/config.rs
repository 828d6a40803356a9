use crate::flags::ScanFlags;
use anyhow::{Context as AnyhowContext, Result};
use clap::Args;
use context_gateway::GatewayConfig;
use context_session::DEFAULT_MAX_SESSIONS;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub(crate) struct ServeArgs {
    /// Directory whose files are offered to the client
    pub(crate) root: PathBuf,

    /// Interface to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub(crate) host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub(crate) port: u16,

    /// Allow binding to a non-loopback address
    #[arg(long)]
    pub(crate) public: bool,

    #[command(flatten)]
    pub(crate) scan: ScanFlags,

    /// Live sessions kept before the oldest is evicted
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    pub(crate) max_sessions: usize,
}

/// Settings for one `serve` run after the root has been checked.
#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) root: PathBuf,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) public: bool,
    pub(crate) scan: ScanFlags,
    pub(crate) max_sessions: usize,
    pub(crate) gateway: GatewayConfig,
}

impl ServerConfig {
    pub(crate) fn resolve(args: ServeArgs, gateway: GatewayConfig) -> Result<Self> {
        if args.max_sessions == 0 {
            anyhow::bail!("--max-sessions must be at least 1");
        }
        Ok(Self {
            root: resolve_root(&args.root)?,
            host: args.host,
            port: args.port,
            public: args.public,
            scan: args.scan,
            max_sessions: args.max_sessions,
            gateway,
        })
    }
}

/// Canonical absolute root; a missing path or a plain file aborts startup.
pub(crate) fn resolve_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Scan root does not exist: {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Scan root is not a directory: {}", root.display());
    }
    Ok(root)
}
