use clap::{Args, Parser};
use log::LevelFilter;

#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    #[command(flatten)]
    pub settings: Settings,
}

/// Raw settings of the server.
///
/// Every setting can be given as flag or environment variable.
/// Unset settings are resolved to their defaults by [`Config::resolve`].
///
/// [`Config::resolve`]: crate::config::Config::resolve
#[derive(Args, Debug, Default, Clone)]
pub struct Settings {
    /// Host to bind to. All interfaces when empty.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to bind to. [default: 8090]
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Folder the dumps are stored in. [default: temp dir]
    #[arg(long, env = "DIR")]
    pub dir: Option<String>,

    /// Arguments passed to `pg_dump`. Must contain the output format.
    /// [default: "--clean --format=plain"]
    #[arg(long = "dump-args", env = "PG_DUMP_DATA_ARGS", allow_hyphen_values = true)]
    pub dump_args: Option<String>,

    /// Arguments passed to `pg_restore`.
    #[arg(long = "restore-args", env = "PG_RESTORE_ARGS", allow_hyphen_values = true)]
    pub restore_args: Option<String>,
}
