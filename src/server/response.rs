//! Plain-text responses with a leading `SUCCESS`/`ERROR` marker line.

use std::io;
use std::path::PathBuf;

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error, From};
use tokio::task::JoinError;

use crate::dumps::InvalidDumpName;
use crate::process::{ExecError, Outcome};

/// Marker of a successful operation.
pub const SUCCESS: &str = "SUCCESS";
/// Marker of a failed operation.
pub const ERROR: &str = "ERROR";

/// `200 OK` starting with the [SUCCESS] marker, followed by `message` if any.
pub fn success(message: &str) -> Response {
    let mut body = format!("{SUCCESS}\n");
    if !message.is_empty() {
        log::info!(target: "server", "{message}");
        body.push_str(message);
        body.push('\n');
    }

    (StatusCode::OK, body).into_response()
}

/// `status` with a body starting with the [ERROR] marker followed by `message`.
pub fn error(status: StatusCode, message: &str) -> Response {
    if status.is_server_error() {
        log::error!(target: "server", "{message}");
    } else {
        log::warn!(target: "server", "{message}");
    }

    (status, format!("{ERROR}\n{message}\n")).into_response()
}

/// Responds to a command that ran to completion.
pub fn outcome(outcome: Outcome) -> Result<Response, OperationError> {
    if outcome.success {
        Ok(success(&outcome.message()))
    } else {
        Err(OperationError::CommandFailed(outcome))
    }
}

/// Errors of a single operation.
#[derive(Debug, Display, Error, From)]
pub enum OperationError {
    /// Query string can't be parsed.
    #[display("Invalid query string: {_0}")]
    #[from]
    InvalidQuery(QueryRejection),
    /// Required query parameter is absent or empty.
    #[display("No value provided for query parameter '{_0}'")]
    MissingParameter(#[error(ignore)] &'static str),
    /// Dump name could be interpreted as path.
    #[from]
    InvalidName(InvalidDumpName),
    /// The dump doesn't exist.
    #[display("Dump not found: {}", _0.display())]
    NotFound(#[error(ignore)] PathBuf),
    /// Command ran but reported failure.
    #[display("{}", _0.message())]
    CommandFailed(#[error(ignore)] Outcome),
    /// Command couldn't be run.
    #[from]
    Exec(ExecError),
    /// File system operation failed.
    #[display("{context} {source}")]
    Io {
        context: String,
        source: io::Error,
    },
    /// Blocking part of the operation panicked or was cancelled.
    #[display("Operation aborted: {_0}")]
    #[from]
    Aborted(JoinError),
}

impl OperationError {
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_) | Self::MissingParameter(_) | Self::InvalidName(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CommandFailed(_) | Self::Exec(_) | Self::Io { .. } | Self::Aborted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        error(self.status(), &self.to_string())
    }
}
