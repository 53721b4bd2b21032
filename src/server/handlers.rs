//! Handlers of the dump operations.
//!
//! Every handler validates the request, executes the operation and formats
//! its result. Blocking work runs on the blocking thread pool, so only the
//! task serving the request waits for it. Concurrent operations on the same
//! dump aren't coordinated.

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::response::{self, OperationError};
use super::AppState;
use crate::dumps::validate_name;

/// Raw query parameters in request order. Repeated keys are kept.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

#[derive(Debug, Default)]
pub struct NameQuery {
    pub name: Option<String>,
}

impl NameQuery {
    /// Takes the first `name` parameter, further ones are ignored.
    fn from_pairs(query: QueryPairs) -> Result<Self, OperationError> {
        let Query(pairs) = query?;
        let name = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "name").then_some(value));

        Ok(Self { name })
    }

    /// The dump name, which must be present and can't be a path.
    fn name(self) -> Result<String, OperationError> {
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .ok_or(OperationError::MissingParameter("name"))?;
        validate_name(&name)?;

        Ok(name)
    }
}

async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, OperationError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, OperationError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state)).await?
}

pub async fn dump(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Response, OperationError> {
    let name = NameQuery::from_pairs(query)?.name()?;
    let outcome = blocking(&state, move |state| {
        let path = state.dumps.path_for(&name);
        Ok(state.postgres.dump(&path)?)
    })
    .await?;

    response::outcome(outcome)
}

pub async fn restore(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Response, OperationError> {
    let name = NameQuery::from_pairs(query)?.name()?;
    let outcome = blocking(&state, move |state| {
        let path = state.dumps.path_for(&name);
        Ok(state.postgres.restore(&path)?)
    })
    .await?;

    response::outcome(outcome)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Response, OperationError> {
    let name = NameQuery::from_pairs(query)?.name()?;
    blocking(&state, move |state| {
        state.dumps.delete(&name).map_err(OperationError::io(format!(
            "Error while deleting dump '{}'",
            state.dumps.path_for(&name).display()
        )))
    })
    .await?;

    Ok(StatusCode::OK.into_response())
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Response, OperationError> {
    let body = blocking(&state, |state| {
        let entries = state
            .dumps
            .list()
            .map_err(OperationError::io("Error while listing dump files"))?;

        Ok(entries.map(|entry| format!("{entry}\n")).collect::<String>())
    })
    .await?;

    Ok((StatusCode::OK, body).into_response())
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Response, OperationError> {
    let name = NameQuery::from_pairs(query)?.name()?;
    let path = state.dumps.path_for(&name);

    let context = format!("Error while reading dump '{}'", path.display());

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OperationError::NotFound(path));
        }
        Err(e) => return Err(OperationError::io(context.clone())(e)),
    };
    let metadata = file.metadata().await.map_err(OperationError::io(context))?;
    if !metadata.is_file() {
        return Err(OperationError::NotFound(path));
    }

    let file_name = path
        .file_name()
        .map(|file_name| file_name.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!(target: "server", "Download of dump '{name}' ({} bytes)", metadata.len());

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_LENGTH, metadata.len().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={file_name:?}"),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

/// Checks that `pg_dump` is available and the database accepts connections.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Response, OperationError> {
    let body = blocking(&state, |state| {
        let version = state.postgres.version()?;
        if !version.success {
            return Err(OperationError::CommandFailed(version));
        }

        let ready = state.postgres.is_ready()?;
        if !ready.success {
            return Err(OperationError::CommandFailed(ready));
        }

        Ok(format!(
            "OK\npg_dump version: {}pg_isready: {}",
            version.stdout, ready.stdout
        ))
    })
    .await?;

    Ok((StatusCode::OK, body).into_response())
}

pub async fn not_found() -> Response {
    response::error(StatusCode::NOT_FOUND, "Unknown endpoint")
}
