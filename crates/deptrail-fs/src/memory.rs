//! In-memory filesystem implementation.

use crate::{FileMetadata, FileSystem};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// In-memory filesystem.
///
/// Files are kept in an `Arc<RwLock<HashMap>>`; cloning the filesystem shares
/// the same storage. Directories are implicit.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory filesystem rooted at `project_root`.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            project_root: Self::normalize(project_root.as_ref())?,
            files: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Add a file, relative paths are resolved against the root.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> io::Result<()> {
        let normalized = self.validate_path(path.as_ref())?;
        self.files.write().insert(normalized, contents.into());
        Ok(())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether no file is stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn normalize(path: &Path) -> io::Result<PathBuf> {
        let mut components = Vec::new();
        let mut is_absolute = false;

        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {
                    is_absolute = true;
                    components.clear();
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if components.pop().is_none() {
                        return Err(io::Error::new(
                            io::ErrorKind::PermissionDenied,
                            "Path attempts to escape root using ..",
                        ));
                    }
                }
                Component::Normal(name) => components.push(name),
            }
        }

        let mut result = PathBuf::new();
        if is_absolute {
            result.push("/");
        }
        for component in components {
            result.push(component);
        }
        Ok(result)
    }

    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let normalized = Self::normalize(&absolute)?;

        if !normalized.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside {}",
                    normalized.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(normalized)
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let normalized = self.validate_path(path)?;
        Ok(self.files.read().contains_key(&normalized))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let normalized = self.validate_path(path)?;
        self.files.read().get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", normalized.display()),
            )
        })
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let normalized = self.validate_path(path)?;
        let files = self.files.read();

        Ok(match files.get(&normalized) {
            Some(contents) => FileMetadata {
                exists: true,
                is_file: true,
                is_dir: false,
                size: contents.len() as u64,
            },
            None => FileMetadata::missing(),
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.files
            .write()
            .insert(normalized, contents.as_bytes().to_vec());
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_normalized = self.validate_path(from)?;
        let to_normalized = self.validate_path(to)?;

        let mut files = self.files.write();
        let contents = files
            .remove(&from_normalized)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Source file not found"))?;
        files.insert(to_normalized, contents);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        // Directories are implicit
        self.validate_path(path).map(|_| ())
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
