//! Filesystem operations
//!
//! Explicit-result file helpers. Nothing here swallows errors: an
//! operation either succeeds or reports a specific failure, and callers
//! decide which failures are tolerable (a file already absent is fine
//! for [`rm`], never for a required copy).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn mkdir_p(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a file, tolerating one that never existed
///
/// Errors other than "not found" propagate.
pub fn rm(path: &Path) -> Result<(), FilesystemError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("rm {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

/// Remove a directory and all its contents
pub fn rm_rf(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        tracing::debug!("rm -rf {}", path.display());
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Copy a file, creating the target's parent directories
pub fn cp(source: &Path, target: &Path) -> Result<(), FilesystemError> {
    let copy_err = |e: std::io::Error| FilesystemError::CopyFile {
        from: source.to_path_buf(),
        target: target.to_path_buf(),
        error: e.to_string(),
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(copy_err)?;
    }
    std::fs::copy(source, target).map_err(copy_err)?;
    tracing::debug!("cp {} -> {}", source.display(), target.display());
    Ok(())
}

/// Move a file, falling back to copy+remove across filesystems
pub fn mv(source: &Path, target: &Path) -> Result<(), FilesystemError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FilesystemError::MoveFile {
            from: source.to_path_buf(),
            target: target.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    if std::fs::rename(source, target).is_err() {
        std::fs::copy(source, target)
            .and_then(|_| std::fs::remove_file(source))
            .map_err(|e| FilesystemError::MoveFile {
                from: source.to_path_buf(),
                target: target.to_path_buf(),
                error: e.to_string(),
            })?;
    }
    tracing::debug!("mv {} -> {}", source.display(), target.display());
    Ok(())
}

/// Recursively copy a directory tree, returning the copied file paths
pub fn copy_tree(source: &Path, target: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
    let mut copied = Vec::new();
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: source.to_path_buf(),
            error: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            mkdir_p(&dest)?;
        } else {
            cp(entry.path(), &dest)?;
            copied.push(dest);
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rm_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(rm(&dir.path().join("never-existed")).is_ok());
    }

    #[test]
    fn test_rm_removes_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        rm(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_mv_creates_parents() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a");
        let target = dir.path().join("nested/dir/b");
        std::fs::write(&source, "payload").unwrap();
        mv(&source, &target).unwrap();
        assert!(!source.exists());
        assert_eq!(std::fs::read_to_string(target).unwrap(), "payload");
    }

    #[test]
    fn test_mv_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let err = mv(&dir.path().join("missing"), &dir.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_copy_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("top"), "1").unwrap();
        std::fs::write(src.join("sub/inner"), "2").unwrap();

        let dest = dir.path().join("dest");
        let copied = copy_tree(&src, &dest).unwrap();
        assert_eq!(copied.len(), 2);
        assert_eq!(std::fs::read_to_string(dest.join("top")).unwrap(), "1");
        assert_eq!(std::fs::read_to_string(dest.join("sub/inner")).unwrap(), "2");
    }
}
