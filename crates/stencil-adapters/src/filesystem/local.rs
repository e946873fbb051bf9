//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use stencil_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{StencilError, StencilResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> StencilResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> StencilResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_file(&self, path: &Path) -> StencilResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, dir: &Path) -> StencilResult<Vec<String>> {
        let entries = std::fs::read_dir(dir).map_err(|e| map_io_error(dir, e, "read directory"))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(dir, e, "read directory entry"))?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StencilError {
    if e.kind() == io::ErrorKind::NotFound {
        return ApplicationError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into();
    }

    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let path = temp.path().join("config/application.rb");

        fs.create_dir_all(path.parent().unwrap()).unwrap();
        fs.write_file(&path, "module Blog\nend\n").unwrap();

        assert!(fs.exists(&path));
        assert_eq!(fs.read_file(&path).unwrap(), "module Blog\nend\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .read_file(&temp.path().join("Gemfile"))
            .unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::FileNotFound { .. })
        ));
    }

    #[test]
    fn list_files_skips_directories() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("20240101_enable_pgcrypto.rb"), "").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        let mut names = LocalFilesystem::new().list_files(temp.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["20240101_enable_pgcrypto.rb".to_string()]);
    }
}
