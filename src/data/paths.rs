use std::io;
use std::path::{Path, PathBuf};

/// Create a fresh output directory under `parent`: `base`, or `base1`,
/// `base2`, ... when earlier runs already took the name.
pub fn unique_dir(parent: &Path, base: &str) -> io::Result<PathBuf> {
    let mut candidate = parent.join(base);
    let mut version = 0usize;
    while candidate.exists() {
        version += 1;
        candidate = parent.join(format!("{base}{version}"));
    }
    std::fs::create_dir_all(&candidate)?;
    Ok(candidate)
}

/// Pick an unused error log path under `parent`: `errors.log`, then
/// `errors_1.log`, `errors_2.log`, ... The file is not created.
pub fn unique_log_path(parent: &Path, stem: &str) -> PathBuf {
    let mut candidate = parent.join(format!("{stem}.log"));
    let mut version = 0usize;
    while candidate.exists() {
        version += 1;
        candidate = parent.join(format!("{stem}_{version}.log"));
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirs_are_numbered_after_the_first() {
        let tmp = tempfile::tempdir().unwrap();
        let first = unique_dir(tmp.path(), "Graphics").unwrap();
        let second = unique_dir(tmp.path(), "Graphics").unwrap();
        let third = unique_dir(tmp.path(), "Graphics").unwrap();
        assert_eq!(first, tmp.path().join("Graphics"));
        assert_eq!(second, tmp.path().join("Graphics1"));
        assert_eq!(third, tmp.path().join("Graphics2"));
        assert!(third.is_dir());
    }

    #[test]
    fn log_paths_skip_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let first = unique_log_path(tmp.path(), "errors");
        assert_eq!(first, tmp.path().join("errors.log"));
        assert!(!first.exists());
        std::fs::write(&first, "").unwrap();
        assert_eq!(unique_log_path(tmp.path(), "errors"), tmp.path().join("errors_1.log"));
    }
}
