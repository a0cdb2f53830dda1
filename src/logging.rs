use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run-scoped log of sheet failures.
///
/// The file is only created once the first failure is recorded, so clean
/// runs leave no empty log behind. Every entry is mirrored to `tracing`.
pub struct ErrorLog {
    path: PathBuf,
    file: Option<File>,
    count: usize,
}

impl ErrorLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: None, count: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of failures recorded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn record(&mut self, message: &str) {
        tracing::error!("{message}");
        self.count += 1;

        let line = format!(
            "{} - ERROR - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        if let Err(e) = self.append(&line) {
            tracing::warn!("Cannot write error log {:?}: {e}", self.path);
        }
    }

    fn append(&mut self, line: &str) -> std::io::Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            self.file = Some(file);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_is_created_lazily() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("errors.log");
        let mut log = ErrorLog::new(path.clone());
        assert!(!path.exists());

        log.record("first failure");
        log.record("second failure");
        assert_eq!(log.count(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - ERROR - first failure"));
        // "YYYY-MM-DD HH:MM:SS" prefix
        assert_eq!(lines[1].find(" - ERROR - "), Some(19));
    }
}
