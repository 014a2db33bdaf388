//! Telegram Session Manager CLI - main entry point
//!
//! Interactive menu for managing several Telegram accounts.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tg_session_manager::{
    commands, metrics, Config, JsonFileStore, TelegramConnector, TerminalConsole,
};

#[derive(Parser)]
#[command(name = "tg_session_manager")]
#[command(about = "Manage chats, groups and channels across Telegram accounts", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with stored sessions (overrides config.yml)
    #[arg(long, env = "SESSIONS_FILE")]
    sessions_file: Option<PathBuf>,

    /// Directory for per-account .session files (overrides config.yml)
    #[arg(long, env = "SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,
}

impl Cli {
    fn into_config(self, mut config: Config) -> (Config, Option<String>) {
        if let Some(path) = self.sessions_file {
            config.sessions_file = path;
        }
        if let Some(dir) = self.session_dir {
            config.session_dir = dir;
        }
        (config, self.metrics_addr)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with the menu
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tg_session_manager=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, metrics_addr) = Cli::parse().into_config(Config::new());

    if let Some(addr) = metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    info!(
        sessions_file = %config.sessions_file.display(),
        session_dir = %config.session_dir.display(),
        "Starting session manager"
    );

    let store = JsonFileStore::new(&config.sessions_file);
    let connector = TelegramConnector::new(&config.session_dir, config.dialog_limit);
    let mut console = TerminalConsole::new();

    metrics::record_action_start("session_manager");
    let start = Instant::now();

    let result = commands::run(&connector, &store, &mut console).await;

    metrics::record_action_result("session_manager", start.elapsed(), result.is_ok());

    result?;
    Ok(())
}
