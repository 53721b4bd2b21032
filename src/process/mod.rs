//! Execution of external programs.
//!
//! Operations describe a program run as [Invocation] and hand it to an
//! [Executor]. The [Outcome] carries the exit status and the captured output.

use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use derive_more::{Display, Error};

/// Program and arguments to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Whether stdout is kept in the [Outcome]. Otherwise it's discarded.
    pub capture_stdout: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture_stdout: false,
        }
    }

    /// Keep stdout of the program, e.g. to report a version.
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn args_display(&self) -> String {
        format!("[{}]", self.args.join(" "))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args_display())
    }
}

/// Result of a program that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub invocation: Invocation,
    /// Whether the program exited successfully.
    pub success: bool,
    /// Exit code, [None] if the program was terminated by a signal.
    pub code: Option<i32>,
    /// Empty unless [`Invocation::capture_stdout`] is set.
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    /// Human readable description including the captured diagnostics.
    ///
    /// Programs like `pg_dump` log to stderr even on success, so the
    /// diagnostics are part of the message either way.
    pub fn message(&self) -> String {
        let Invocation { program, .. } = &self.invocation;
        let args = self.invocation.args_display();

        if self.success {
            format!(
                "Successfully executed {program} with arguments: {args}:\n{}",
                self.stderr.trim_end()
            )
        } else {
            let status = match self.code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            format!(
                "Error executing {program} with arguments: {args} ({status}):\n{}",
                self.stderr.trim_end()
            )
        }
    }
}

/// Program couldn't be run at all.
#[derive(Debug, Display, Error)]
#[display("Failed to execute {}: {source}", invocation.program)]
pub struct ExecError {
    pub invocation: Invocation,
    pub source: io::Error,
}

/// Runs [Invocation]s.
pub trait Executor: Send + Sync {
    /// Runs the program and blocks until it terminated.
    fn execute(&self, invocation: &Invocation) -> Result<Outcome, ExecError>;
}

/// [Executor] spawning processes on the local system.
///
/// The environment is inherited by the spawned processes, which is how the
/// PostgreSQL tools pick up their connection parameters (`PGHOST`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<Outcome, ExecError> {
        log::debug!(target: "process", "Running: {invocation}");

        let stdout = if invocation.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .output()
            .map_err(|source| ExecError {
                invocation: invocation.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // relay stderr
        for line in stderr.lines() {
            log::info!(target: "process", "{}: {line}", invocation.program);
        }
        log::trace!(target: "process", "{} exited with {}", invocation.program, output.status);

        Ok(Outcome {
            invocation: invocation.clone(),
            success: output.status.success(),
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn sh(script: &str) -> Invocation {
        Invocation::new("sh").arg("-c").arg(script)
    }

    #[cfg(unix)]
    #[test]
    fn success_captures_stderr() {
        let outcome = SystemExecutor
            .execute(&sh("echo dumping >&2; echo data").capture_stdout())
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.code, Some(0));
        assert_eq!(outcome.stderr, "dumping\n");
        assert_eq!(outcome.stdout, "data\n");
        assert!(outcome.message().starts_with("Successfully executed sh"));
        assert!(outcome.message().ends_with("dumping"));
    }

    #[cfg(unix)]
    #[test]
    fn failure_reports_code_and_stderr() {
        let outcome = SystemExecutor
            .execute(&sh("echo 'connection refused' >&2; exit 3"))
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(3));

        let message = outcome.message();
        assert!(message.starts_with("Error executing sh with arguments: [-c "), "{message}");
        assert!(message.contains("(exit code 3)"), "{message}");
        assert!(message.ends_with("connection refused"), "{message}");
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_discarded_unless_captured() {
        // pg_restore without a database writes the whole script to stdout
        let outcome = SystemExecutor
            .execute(&sh("yes 'CREATE TABLE t ();' | head -n 100000; echo restored >&2"))
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.stderr, "restored\n");
    }

    #[test]
    fn missing_program_is_an_error() {
        let invocation = Invocation::new("pg_dumper-does-not-exist").arg("--version");
        let err = SystemExecutor.execute(&invocation).unwrap_err();

        assert_eq!(err.invocation, invocation);
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Failed to execute pg_dumper-does-not-exist"));
    }

    #[test]
    fn invocation_display() {
        let invocation = Invocation::new("pg_dump")
            .args(["--clean", "--format=plain"])
            .arg("-f")
            .arg("/tmp/a.dump.sql");

        assert_eq!(
            invocation.to_string(),
            "pg_dump [--clean --format=plain -f /tmp/a.dump.sql]"
        );
    }
}
