use crate::bootstrap::Application;
use crate::config::AppConfig;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line interface for routeshim
#[derive(Parser, Debug)]
#[command(name = "routeshim")]
#[command(about = "routeshim application server", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "APP_CONFIG", default_value = "config/app.yaml", global = true)]
    pub config: PathBuf,

    /// dotenv file applied on top of the configuration file
    #[arg(long, default_value = ".env", global = true)]
    pub env_file: PathBuf,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the application
    Serve {
        /// Address and port to bind (overrides `server.addr`)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Print the route table
    Routes,
    /// Verify that every route resolves to a handler and registered middleware
    Check,
}

/// One line per route: method, pattern, handler, middleware.
#[must_use]
pub fn format_route_table(router: &Router) -> String {
    let mut out = String::new();
    for route in router.routes() {
        let middleware = if route.middleware.is_empty() {
            "-".to_string()
        } else {
            route.middleware.join(",")
        };
        let _ = writeln!(
            out,
            "{:<8} {:<32} {:<40} {}",
            route.method.as_str(),
            route.pattern,
            route.handler.to_string(),
            middleware
        );
    }
    out
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if configuration or route files cannot be loaded, the server cannot bind,
/// or `check` finds unresolved routes.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(Some(&cli.config), Some(&cli.env_file))?;
    let mut log_config = LogConfig::from_env();
    if config.is_dev() && std::env::var("APP_LOG_FORMAT").is_err() {
        log_config = LogConfig {
            log_level: log_config.log_level,
            ..LogConfig::default_dev()
        };
    }
    let _log_guard = init_logging_with_config(&log_config)?;
    RuntimeConfig::from_env().apply();

    let app = Application::from_config(config)?;

    match cli.command {
        Commands::Serve { addr } => {
            let problems = app.check();
            for problem in &problems {
                warn!(problem = %problem, "Unresolved route");
            }
            let addr = addr.unwrap_or_else(|| app.config().server.addr.clone());
            let handle = app.serve_on(&addr)?;
            wait_for_shutdown(handle)
        }
        Commands::Routes => {
            print!("{}", format_route_table(app.dispatcher().router()));
            Ok(())
        }
        Commands::Check => {
            let problems = app.check();
            if problems.is_empty() {
                println!(
                    "OK: {} routes resolve",
                    app.dispatcher().router().len()
                );
                Ok(())
            } else {
                for problem in &problems {
                    eprintln!("{problem}");
                }
                bail!("{} unresolved route(s)", problems.len());
            }
        }
    }
}

#[cfg(unix)]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal = signal, "Shutdown signal received");
    }
    handle.stop();
    info!("Server stopped");
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server thread panicked: {e:?}"))
}
