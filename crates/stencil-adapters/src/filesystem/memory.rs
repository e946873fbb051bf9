//! In-memory filesystem adapter for testing.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use stencil_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StencilResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same tree, so a test can hand one clone to the executor
/// and inspect the result through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MemoryFilesystemInner {
    fn add_dirs(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                inner.add_dirs(parent);
            }
            inner.files.insert(path.to_path_buf(), content.to_string());
        }
        self
    }

    /// A file's content, if it exists (testing helper).
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path.as_ref()).cloned()
    }

    /// Every file path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self
            .inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    fn read(&self) -> StencilResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .read()
            .map_err(|_| ApplicationError::LockPoisoned)?)
    }

    fn write(&self) -> StencilResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .write()
            .map_err(|_| ApplicationError::LockPoisoned)?)
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StencilResult<()> {
        self.write()?.add_dirs(path);
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> StencilResult<()> {
        let mut inner = self.write()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> StencilResult<String> {
        self.read()?
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ApplicationError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into()
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .is_ok_and(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
    }

    fn list_files(&self, dir: &Path) -> StencilResult<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_file_creates_parents() {
        let fs = MemoryFilesystem::new().with_file("/app/config/application.rb", "x");
        assert!(fs.exists(Path::new("/app/config")));
        assert_eq!(fs.file("/app/config/application.rb").as_deref(), Some("x"));
    }

    #[test]
    fn write_requires_parent() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/app/Procfile.dev"), "").is_err());

        fs.create_dir_all(Path::new("/app")).unwrap();
        fs.write_file(Path::new("/app/Procfile.dev"), "web: x\n").unwrap();
        assert_eq!(fs.file("/app/Procfile.dev").as_deref(), Some("web: x\n"));
    }

    #[test]
    fn list_files_is_not_recursive() {
        let fs = MemoryFilesystem::new()
            .with_file("/app/db/migrate/1_a.rb", "")
            .with_file("/app/db/migrate/old/2_b.rb", "");
        assert_eq!(
            fs.list_files(Path::new("/app/db/migrate")).unwrap(),
            vec!["1_a.rb".to_string()]
        );
    }

    #[test]
    fn clones_share_state() {
        let fs = MemoryFilesystem::new().with_file("/a", "1");
        let other = fs.clone();
        other.write_file(Path::new("/a"), "2").unwrap();
        assert_eq!(fs.file("/a").as_deref(), Some("2"));
    }
}
