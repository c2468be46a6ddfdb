use crate::error::{ChangeSpecError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting the project file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Run `f` while holding an exclusive advisory lock on `lock_path`.
///
/// Blocks until any other holder (typically a background workflow updating
/// the same project file) releases it.
pub fn with_exclusive_lock<T>(lock_path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?;
    fs2::FileExt::lock_exclusive(&file).map_err(|source| ChangeSpecError::Lock {
        path: lock_path.display().to_string(),
        source,
    })?;
    // Released when `file` drops.
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        atomic_write(&path, b"hello: world").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello: world");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/test.yaml");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn lock_is_reentrant_across_calls() {
        let dir = TempDir::new().unwrap();
        let lock = dir.path().join("nested/p.yaml.lock");
        let first = with_exclusive_lock(&lock, || Ok(1)).unwrap();
        let second = with_exclusive_lock(&lock, || Ok(first + 1)).unwrap();
        assert_eq!(second, 2);
        assert!(lock.exists());
    }

    #[test]
    fn lock_propagates_closure_error() {
        let dir = TempDir::new().unwrap();
        let lock = dir.path().join("p.yaml.lock");
        let result: Result<()> = with_exclusive_lock(&lock, || {
            Err(ChangeSpecError::NotFound("x".to_string()))
        });
        assert!(matches!(result, Err(ChangeSpecError::NotFound(_))));
    }
}
