//! Append-only line writer with a size cap and a single backup.
//!
//! When the file grows past the cap it is renamed to `<file>.1`, replacing any
//! previous backup, and writing continues in a fresh file. Disk usage is
//! therefore bounded by roughly twice the cap.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Default size cap (5 MB).
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Thread-safe capped line writer.
///
/// The file is opened lazily on the first write, so construction never fails.
pub struct FileWriter {
    file_path: PathBuf,
    max_bytes: u64,
    writer: Mutex<Option<fs::File>>,
}

impl FileWriter {
    #[must_use]
    pub const fn new(file_path: PathBuf) -> Self {
        Self::with_limit(file_path, DEFAULT_MAX_BYTES)
    }

    #[must_use]
    pub const fn with_limit(file_path: PathBuf, max_bytes: u64) -> Self {
        Self {
            file_path,
            max_bytes,
            writer: Mutex::new(None),
        }
    }

    /// Path of the rotated backup, `<file>.1`.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.file_path.clone().into_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Appends `line` plus a newline, rotating first if the file is over the cap.
    ///
    /// # Errors
    ///
    /// Fails on filesystem errors or when a previous writer panicked while
    /// holding the lock.
    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| std::io::Error::other(format!("writer lock poisoned: {e}")))?;

        if fs::metadata(&self.file_path).is_ok_and(|m| m.len() > self.max_bytes) {
            *writer = None;
            fs::rename(&self.file_path, self.backup_path())?;
        }

        if writer.is_none() {
            *writer = Some(OpenOptions::new().create(true).append(true).open(&self.file_path)?);
        }
        let file = writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("trace file not open"))?;

        writeln!(file, "{line}")?;
        file.flush()
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("file_path", &self.file_path)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_into_single_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("spans.jsonl");
        let writer = FileWriter::with_limit(path.clone(), 16);

        writer.write_line("{\"n\":1,\"pad\":\"xxxx\"}").expect("write");
        assert!(!writer.backup_path().exists());

        writer.write_line("{\"n\":2}").expect("write");
        let backup = fs::read_to_string(writer.backup_path()).expect("backup exists");
        assert!(backup.contains("\"n\":1"));
        let current = fs::read_to_string(&path).expect("current exists");
        assert_eq!(current, "{\"n\":2}\n");

        writer.write_line("{\"n\":3}").expect("write");
        writer.write_line("{\"n\":4}").expect("write");
        writer.write_line("{\"n\":5}").expect("write");
        let backup = fs::read_to_string(writer.backup_path()).expect("backup exists");
        assert!(!backup.contains("\"n\":1"), "older backups are replaced");
    }
}
