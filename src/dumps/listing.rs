use std::fmt;
use std::fs::{DirEntry, ReadDir};

use chrono::{DateTime, Local};

use super::Dumps;

/// A dump file found in the dump directory.
#[derive(Debug, Clone)]
pub struct DumpEntry {
    /// Logical name of the dump.
    pub name: String,
    pub dir: String,
    pub file_name: String,
    /// Last modification of the dump file.
    pub modified: DateTime<Local>,
}

impl fmt::Display for DumpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}{} @ {})",
            self.name,
            self.dir,
            self.file_name,
            self.modified.format("%Y-%m-%d %H:%M:%S%.f %z")
        )
    }
}

/// Lazy iterator over the dumps of a directory in file system order.
///
/// Created by [`Dumps::list`].
pub struct DumpEntries<'a> {
    dumps: &'a Dumps,
    read_dir: ReadDir,
}

impl<'a> DumpEntries<'a> {
    pub(super) fn new(dumps: &'a Dumps, read_dir: ReadDir) -> Self {
        Self { dumps, read_dir }
    }

    fn entry(&self, dir_entry: DirEntry) -> Option<DumpEntry> {
        let file_name = dir_entry.file_name().into_string().ok()?;
        let name = self.dumps.name_of(&file_name)?.to_string();

        let metadata = match dir_entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!(target: "dumps", "Skipping {file_name}, reading metadata failed: {e}");
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified.into(),
            Err(e) => {
                log::warn!(target: "dumps", "Skipping {file_name}, no modification time: {e}");
                return None;
            }
        };

        Some(DumpEntry {
            name,
            dir: self.dumps.dir().to_string(),
            file_name,
            modified,
        })
    }
}

impl Iterator for DumpEntries<'_> {
    type Item = DumpEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let dir_entry = match self.read_dir.next()? {
                Ok(dir_entry) => dir_entry,
                Err(e) => {
                    log::warn!(target: "dumps", "Skipping unreadable directory entry: {e}");
                    continue;
                }
            };

            if let Some(entry) = self.entry(dir_entry) {
                return Some(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::TimeZone;

    use super::*;
    use crate::config::DumpFormat;

    #[test]
    fn only_dump_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = Dumps::new(dir.path().display().to_string(), DumpFormat::Plain);
        fs::write(dumps.path_for("a"), "").unwrap();
        fs::write(dumps.path_for("b"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();
        fs::write(dir.path().join("d.dump.custom"), "").unwrap();
        fs::create_dir(dir.path().join("e.dump.sql")).unwrap();

        let mut names: Vec<_> = dumps.list().unwrap().map(|entry| entry.name).collect();
        names.sort();

        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn listing_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = Dumps::new(dir.path().display().to_string(), DumpFormat::Tar);

        assert_eq!(dumps.list().unwrap().count(), 0);
        fs::write(dumps.path_for("new"), "").unwrap();
        assert_eq!(dumps.list().unwrap().count(), 1);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dumps = Dumps::new(
            dir.path().join("missing").display().to_string(),
            DumpFormat::Plain,
        );

        assert!(dumps.list().is_err());
    }

    #[test]
    fn line_contains_name_path_and_time() {
        let modified = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let entry = DumpEntry {
            name: "nightly".into(),
            dir: "/srv/dumps/".into(),
            file_name: "nightly.dump.sql".into(),
            modified,
        };

        let line = entry.to_string();
        assert!(
            line.starts_with("nightly (/srv/dumps/nightly.dump.sql @ 2024-03-01 12:30:00"),
            "{line}"
        );
        assert!(line.ends_with(')'));
    }
}
