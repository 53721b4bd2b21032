use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pg_dumper_lib::cli::Cli;
use pg_dumper_lib::config::Config;
use pg_dumper_lib::process::SystemExecutor;
use pg_dumper_lib::server::{self, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    } else {
        env_logger.parse_env(env_logger::Env::default().default_filter_or("info"));
    }
    if let Err(e) = env_logger.try_init() {
        eprintln!("Initializing the logger failed: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::resolve(cli.settings) {
        Ok(config) => config,
        Err(e) => {
            log::error!(target: "config", "{e}");
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    log::info!("Starting (binding to '{addr}', config = {config:?})");

    let listener = if config.host.is_empty() {
        TcpListener::bind(&config.unspecified_addrs()[..]).await
    } else {
        TcpListener::bind((config.host.as_str(), config.port)).await
    };
    let listener = match listener {
        Ok(listener) => listener,
        Err(e) => {
            log::error!(target: "server", "Binding to '{addr}' failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(AppState::new(&config, Arc::new(SystemExecutor)));
    if let Err(e) = server::serve(listener, state).await {
        log::error!(target: "server", "Serving failed: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
