//! Naming and storage of dump files.
//!
//! A dump is identified by a logical name given by the caller.
//! The file of a dump is located at `<dir><name>.<extension>` where the
//! extension is determined by the [DumpFormat] of the dumps.

mod listing;

use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::{fs, io};

use derive_more::{Display, Error};

use crate::config::{Config, DumpFormat};

pub use listing::{DumpEntries, DumpEntry};

/// Name of a dump that could escape the dump directory.
#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("Invalid dump name '{_0}': must not contain path separators or '..'")]
pub struct InvalidDumpName(#[error(ignore)] String);

/// Checks that a dump name can't be interpreted as a path.
pub fn validate_name(name: &str) -> Result<&str, InvalidDumpName> {
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(InvalidDumpName(name.to_string()));
    }

    Ok(name)
}

/// Mapping of dump names to files in the dump directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dumps {
    dir: String,
    extension: &'static str,
}

impl Dumps {
    /// Create a new [Dumps] instance storing dumps of `format` in `dir`.
    pub fn new(dir: impl Into<String>, format: DumpFormat) -> Self {
        let mut dir = dir.into();
        if !dir.is_empty() && !dir.ends_with(['/', MAIN_SEPARATOR]) {
            dir.push(MAIN_SEPARATOR);
        }
        if Path::new(&dir).is_relative() {
            log::warn!(target: "dumps", "dump directory is relative: {dir}");
        }

        Self {
            dir,
            extension: format.extension(),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self::new(config.dir.clone(), config.format)
    }

    /// Directory of the dumps, always ending with a separator.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Suffix of every dump file: `.<extension>`.
    pub fn extension_suffix(&self) -> String {
        format!(".{}", self.extension)
    }

    /// Absolute path of the dump file for `name`.
    ///
    /// Pure mapping without any file system access.
    pub fn path_for(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{name}.{}", self.dir, self.extension))
    }

    /// Logical name of a dump file, [None] if it isn't a dump file.
    pub fn name_of<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name.strip_suffix(&self.extension_suffix())
    }

    /// Lists the dumps currently stored in the directory.
    ///
    /// The directory is read anew on every call.
    pub fn list(&self) -> io::Result<DumpEntries<'_>> {
        let read_dir = fs::read_dir(&self.dir)?;
        Ok(DumpEntries::new(self, read_dir))
    }

    /// Deletes the dump file of `name`.
    ///
    /// Deleting a non-existent dump is an error.
    pub fn delete(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.path_for(name);
        log::debug!(target: "dumps", "Delete dump file: {}", path.display());
        fs::remove_file(&path)?;
        log::info!(target: "dumps", "Deleted dump '{name}'");

        Ok(path)
    }
}
