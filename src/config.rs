//! Resolution of the [Config] from the raw [Settings].

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::sync::LazyLock;

use derive_more::{Display, Error};
use regex::Regex;

use crate::cli::Settings;

const DEFAULT_PORT: u16 = 8090;
const DEFAULT_DUMP_ARGS: &str = "--clean --format=plain";

static FORMAT_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--format=(.*)$").expect("format pattern should be valid"));

/// Output format of `pg_dump`, determining the extension of dump files.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum DumpFormat {
    /// Plain-text SQL script, restored with `psql`.
    #[display("plain")]
    Plain,
    /// Custom-format archive, restored with `pg_restore`.
    #[display("custom")]
    Custom,
    /// Tar-format archive, restored with `pg_restore`.
    #[display("tar")]
    Tar,
}

impl DumpFormat {
    /// Extension of dump files in this format (without leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Plain => "dump.sql",
            Self::Custom => "dump.custom",
            Self::Tar => "dump.tar",
        }
    }
}

/// Output format passed to `pg_dump` is not supported.
#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("Output format is unknown: {_0}")]
pub struct UnknownDumpFormat(#[error(ignore)] String);

impl FromStr for DumpFormat {
    type Err = UnknownDumpFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "custom" => Ok(Self::Custom),
            "tar" => Ok(Self::Tar),
            other => Err(UnknownDumpFormat(other.to_string())),
        }
    }
}

/// Fatal errors on resolving the [Config].
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No `--format=` argument in the dump arguments.
    #[display("No output format specified for dumping. Please provide '--format=plain', '--format=custom' or '--format=tar'")]
    MissingFormat,
    /// The `--format=` argument names an unsupported format.
    #[display("{_0}. Please provide '--format=plain', '--format=custom' or '--format=tar'")]
    UnknownFormat(UnknownDumpFormat),
}

/// Configuration of the server, resolved once on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Folder the dumps are stored in.
    pub dir: String,
    /// Output format of the dumps, taken from [`dump_args`](Self::dump_args).
    pub format: DumpFormat,
    pub dump_args: Vec<String>,
    pub restore_args: Vec<String>,
}

impl Config {
    /// Resolve the [Config] from raw [Settings], filling in defaults.
    ///
    /// Every defaulted setting is logged. The dump directory isn't checked;
    /// an unusable directory only surfaces once an operation touches it.
    pub fn resolve(settings: Settings) -> Result<Self, ConfigError> {
        let Settings {
            host,
            port,
            dir,
            dump_args,
            restore_args,
        } = settings;

        let host = or_default("HOST", host.filter(|h| !h.is_empty()), String::new);
        let port = or_default("PORT", port, || DEFAULT_PORT);
        let dir = or_default("DIR", dir.filter(|d| !d.is_empty()), || {
            std::env::temp_dir().display().to_string()
        });
        let dump_args = or_default(
            "PG_DUMP_DATA_ARGS",
            dump_args.filter(|a| !a.trim().is_empty()),
            || DEFAULT_DUMP_ARGS.to_string(),
        );
        let restore_args = or_default(
            "PG_RESTORE_ARGS",
            restore_args.filter(|a| !a.trim().is_empty()),
            String::new,
        );

        let dump_args = split_args(&dump_args);
        let restore_args = split_args(&restore_args);
        let format = dump_format(&dump_args)?;

        Ok(Self {
            host,
            port,
            dir,
            format,
            dump_args,
            restore_args,
        })
    }

    /// Wildcard addresses tried in order when no host is configured.
    ///
    /// `::` accepts IPv4 connections as well on dual-stack systems;
    /// `0.0.0.0` is the fallback on hosts without IPv6.
    pub fn unspecified_addrs(&self) -> [SocketAddr; 2] {
        [
            (Ipv6Addr::UNSPECIFIED, self.port).into(),
            (Ipv4Addr::UNSPECIFIED, self.port).into(),
        ]
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dir", &self.dir)
            .field("dumpfile_ext", &self.format.extension())
            .field("dump_args", &self.dump_args)
            .field("restore_args", &self.restore_args)
            .finish()
    }
}

fn or_default<T: fmt::Debug>(name: &str, value: Option<T>, default: impl FnOnce() -> T) -> T {
    value.unwrap_or_else(|| {
        let default = default();
        log::info!(target: "config", "No value for setting '{name}' using default value {default:?}");
        default
    })
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

/// Determine the output format from the first `--format=` argument.
fn dump_format(dump_args: &[String]) -> Result<DumpFormat, ConfigError> {
    let format = dump_args
        .iter()
        .find_map(|arg| FORMAT_ARG.captures(arg))
        .and_then(|captures| captures.get(1))
        .ok_or(ConfigError::MissingFormat)?;

    format
        .as_str()
        .parse()
        .map_err(ConfigError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dump_args: &str) -> Settings {
        Settings {
            dir: Some("/srv/dumps/".into()),
            dump_args: Some(dump_args.into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(Settings::default()).unwrap();

        assert_eq!(config.host, "");
        assert_eq!(config.port, 8090);
        assert_eq!(config.dir, std::env::temp_dir().display().to_string());
        assert_eq!(config.dump_args, ["--clean", "--format=plain"]);
        assert!(config.restore_args.is_empty());
        assert_eq!(config.format, DumpFormat::Plain);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = Config::resolve(Settings {
            host: Some(String::new()),
            dir: Some(String::new()),
            dump_args: Some("  ".into()),
            restore_args: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.host, "");
        assert_eq!(config.dir, std::env::temp_dir().display().to_string());
        assert_eq!(config.format, DumpFormat::Plain);
        assert!(config.restore_args.is_empty());
    }

    #[test]
    fn all_interfaces_without_host() {
        let config = Config::resolve(Settings {
            port: Some(9000),
            ..Default::default()
        })
        .unwrap();

        let [v6, v4] = config.unspecified_addrs();
        assert_eq!(v6, "[::]:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(v4, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn extension_follows_format() {
        let extension = |args| Config::resolve(settings(args)).unwrap().format.extension();

        assert_eq!(extension("--clean --format=plain"), "dump.sql");
        assert_eq!(extension("--format=custom --no-owner"), "dump.custom");
        assert_eq!(extension("--format=tar"), "dump.tar");
    }

    #[test]
    fn first_format_wins() {
        let config = Config::resolve(settings("--format=tar --format=plain")).unwrap();
        assert_eq!(config.format, DumpFormat::Tar);
    }

    #[test]
    fn missing_format_is_fatal() {
        assert_eq!(
            Config::resolve(settings("--clean --no-owner")),
            Err(ConfigError::MissingFormat)
        );
        // short options aren't recognised
        assert_eq!(
            Config::resolve(settings("-Fc")),
            Err(ConfigError::MissingFormat)
        );
    }

    #[test]
    fn unknown_format_is_fatal() {
        assert_eq!(
            Config::resolve(settings("--format=directory")),
            Err(ConfigError::UnknownFormat(UnknownDumpFormat(
                "directory".into()
            )))
        );
        assert!(Config::resolve(settings("--format=")).is_err());
    }

    #[test]
    fn args_are_split_on_whitespace() {
        let config = Config::resolve(Settings {
            dump_args: Some(" --clean\t--format=custom   --no-acl ".into()),
            restore_args: Some("--clean  --if-exists".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.dump_args, ["--clean", "--format=custom", "--no-acl"]);
        assert_eq!(config.restore_args, ["--clean", "--if-exists"]);
    }
}
