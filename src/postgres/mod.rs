//! Invocations of the PostgreSQL client tools.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::process::{ExecError, Executor, Invocation, Outcome};

const PG_DUMP: &str = "pg_dump";
const PG_RESTORE: &str = "pg_restore";
const PG_ISREADY: &str = "pg_isready";
const PSQL: &str = "psql";

/// Interaction with the database using the PostgreSQL client tools.
///
/// The tools connect using the libpq environment (`PGHOST`, `PGUSER`, ...)
/// of this process.
#[derive(Clone)]
pub struct Postgres {
    executor: Arc<dyn Executor>,
    dump_args: Vec<String>,
    restore_args: Vec<String>,
}

impl Postgres {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            dump_args: config.dump_args.clone(),
            restore_args: config.restore_args.clone(),
        }
    }

    /// `pg_dump` writing the dump to `path`.
    pub fn dump_invocation(&self, path: &Path) -> Invocation {
        Invocation::new(PG_DUMP)
            .args(self.dump_args.iter().cloned())
            .arg("-f")
            .arg(path.display().to_string())
    }

    /// Invocation restoring the dump at `path`.
    ///
    /// Plain-text dumps (`.sql`) are SQL scripts and fed to `psql`.
    /// Archives are restored by `pg_restore` using the configured restore
    /// arguments.
    pub fn restore_invocation(&self, path: &Path) -> Invocation {
        let path = path.display().to_string();

        if path.ends_with(".sql") {
            Invocation::new(PSQL).arg("-f").arg(path)
        } else {
            Invocation::new(PG_RESTORE)
                .args(self.restore_args.iter().cloned())
                .arg(path)
        }
    }

    pub fn dump(&self, path: &Path) -> Result<Outcome, ExecError> {
        log::info!(target: "postgres", "Create database dump: {}", path.display());
        self.executor.execute(&self.dump_invocation(path))
    }

    pub fn restore(&self, path: &Path) -> Result<Outcome, ExecError> {
        log::info!(target: "postgres", "Restore database dump: {}", path.display());
        self.executor.execute(&self.restore_invocation(path))
    }

    /// Version of `pg_dump`.
    pub fn version(&self) -> Result<Outcome, ExecError> {
        let invocation = Invocation::new(PG_DUMP).arg("--version").capture_stdout();
        self.executor.execute(&invocation)
    }

    /// Whether the database accepts connections, using `pg_isready`.
    pub fn is_ready(&self) -> Result<Outcome, ExecError> {
        self.executor
            .execute(&Invocation::new(PG_ISREADY).capture_stdout())
    }
}
