//! File system helpers.
//!
//! Writes go through an atomic write-then-rename so a crash mid-run never
//! leaves a half-written tenant file: the destination either has the old
//! content or the new content. Every failure names the offending path.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensure a directory exists, creating it and all parents if necessary.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or if
/// creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!(
            "Path exists but is not a directory: {}",
            path.display()
        ));
    }
    Ok(())
}

/// Atomically write bytes to a file using a write-then-rename strategy.
///
/// Writes to a sibling `.tmp` file, syncs it to disk, then renames it over
/// the target. Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error naming the path if any step fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().context("Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Atomically write a string to a file.
///
/// Convenience wrapper around [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Read a file to a string, naming the path on failure.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("occupied");
        fs::write(&file, "x").unwrap();
        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("models/acme/acme_orders.sql");
        atomic_write(&target, b"select 1").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "select 1");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("file.sql");
        safe_write(&target, "old").unwrap();
        safe_write(&target, "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("file.sql");
        safe_write(&target, "content").unwrap();
        assert!(!temp.path().join("file.tmp").exists());
    }

    #[test]
    fn test_read_text_names_path() {
        let err = read_text(Path::new("/no/such/file.sql")).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/file.sql"));
    }
}
