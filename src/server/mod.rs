//! HTTP endpoints to trigger the dump operations.
//!
//! | Path        | Query  | Operation                                   |
//! |-------------|--------|---------------------------------------------|
//! | `/list`     |        | Lists the stored dumps, one per line.       |
//! | `/dump`     | `name` | Creates the dump `name` using `pg_dump`.    |
//! | `/restore`  | `name` | Restores the dump `name`.                   |
//! | `/delete`   | `name` | Deletes the dump `name`.                    |
//! | `/download` | `name` | Downloads the file of the dump `name`.      |
//! | `/health`   |        | Checks `pg_dump` and the database.          |

pub mod handlers;
pub mod response;

use std::io;
use std::sync::Arc;

use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

use crate::config::Config;
use crate::dumps::Dumps;
use crate::postgres::Postgres;
use crate::process::Executor;

/// State shared by all requests. Never changes after startup.
pub struct AppState {
    pub dumps: Dumps,
    pub postgres: Postgres,
}

impl AppState {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            dumps: Dumps::with_config(config),
            postgres: Postgres::new(config, executor),
        }
    }
}

/// Routes of all operations. Any HTTP method is accepted.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/list", any(handlers::list))
        .route("/dump", any(handlers::dump))
        .route("/restore", any(handlers::restore))
        .route("/delete", any(handlers::delete))
        .route("/download", any(handlers::download))
        .route("/health", any(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Serves the operations on `listener` until SIGINT or SIGTERM is received.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => log::info!(target: "server", "Received SIGTERM, shutting down"),
            _ = sigint.recv() => log::info!(target: "server", "Received SIGINT, shutting down"),
        }
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
