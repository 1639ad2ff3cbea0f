//! Wicket daemon — entry point for running the identity & access backend.

mod config;
mod logging;
mod shutdown;

use std::path::PathBuf;

use clap::Parser;

use wicket_api::{ApiServer, AppState};
use wicket_identity::{Directory, User, UserStore};
use wicket_promotions::Promotions;
use wicket_sessions::Sessions;
use wicket_types::Role;

use config::ServerConfig;
use logging::{init_logging, LogFormat};
use shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "wicket-daemon", about = "Wicket identity & access API daemon")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "WICKET_ADDR")]
    addr: Option<String>,

    /// JSON data file for the user directory. Omit for a volatile
    /// directory that vanishes on exit.
    #[arg(long, env = "WICKET_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Directory of static UI files to serve at the root.
    #[arg(long, env = "WICKET_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WICKET_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WICKET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Badge of a chief created at startup when the directory is empty.
    #[arg(long, env = "WICKET_SEED_BADGE")]
    seed_badge: Option<u32>,

    /// Password of the seeded chief.
    #[arg(long, env = "WICKET_SEED_PASSWORD")]
    seed_password: Option<String>,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    let config = ServerConfig {
        addr: cli.addr.unwrap_or(base.addr),
        data_file: cli.data_file.or(base.data_file),
        static_dir: cli.static_dir.or(base.static_dir),
        log_format: cli.log_format.unwrap_or(base.log_format),
        log_level: cli.log_level.unwrap_or(base.log_level),
        seed_badge: cli.seed_badge.or(base.seed_badge),
        seed_password: cli.seed_password.or(base.seed_password),
    };

    init_logging(LogFormat::parse(&config.log_format), &config.log_level);

    let users = match &config.data_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening user directory");
            UserStore::open(path)?
        }
        None => {
            tracing::info!("running with a volatile user directory");
            UserStore::new()
        }
    };

    let shutdown = ShutdownController::new();
    let sessions = Sessions::new(shutdown.subscribe());
    let promotions = Promotions::new(shutdown.subscribe());
    let server_shutdown = shutdown.subscribe();

    seed_chief_if_empty(&users, &config).await?;

    let directory = Directory::new(users.clone(), sessions, promotions);
    let mut server = ApiServer::new(&config.addr, AppState { directory });
    if let Some(dir) = &config.static_dir {
        server = server.with_static_dir(dir);
    }

    let signal_task = tokio::spawn(async move {
        shutdown.wait_for_signal().await;
    });

    server.serve(server_shutdown).await?;
    signal_task.abort();

    users.save().await?;
    tracing::info!("wicket daemon exited cleanly");
    Ok(())
}

/// A brand-new deployment has no one who could pass the chief-only user
/// creation check; seed one chief from the config if the directory is
/// empty.
async fn seed_chief_if_empty(users: &UserStore, config: &ServerConfig) -> anyhow::Result<()> {
    if !users.is_empty().await {
        return Ok(());
    }

    match (config.seed_badge, config.seed_password.as_deref()) {
        (Some(badge), Some(password)) => {
            let chief = User::new(badge, "Seed Chief", "chief@wicket.local", password, Role::Chief)?;
            users.create(chief).await?;
            tracing::warn!(badge, "user directory was empty — seeded initial chief");
        }
        _ => {
            tracing::warn!(
                "user directory is empty and no seed chief is configured; no one can log in"
            );
        }
    }
    Ok(())
}
