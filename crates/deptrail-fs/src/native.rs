//! Native filesystem implementation using std::fs + tokio.

use crate::{FileMetadata, FileSystem};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// Blocking std::fs calls are wrapped in `tokio::task::spawn_blocking` so the
/// async runtime is never blocked by disk I/O.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
    canonical_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a new native filesystem scoped to a root directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the root nor its parent can be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = project_root.as_ref();
        let project_root = root.canonicalize().or_else(|_| {
            // Root may not exist yet (e.g. a fresh cache directory)
            let parent = root.parent().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Root does not exist: {}", root.display()),
                )
            })?;
            let name = root.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid root path")
            })?;
            Ok::<_, io::Error>(parent.canonicalize()?.join(name))
        })?;

        let canonical_root = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.clone());

        Ok(Self {
            project_root,
            canonical_root,
        })
    }

    /// Create the root directory (and parents) if needed, then scope to it.
    pub fn create(project_root: impl AsRef<Path>) -> io::Result<Self> {
        std::fs::create_dir_all(project_root.as_ref())?;
        Self::new(project_root)
    }

    /// Validate that a path is within the root.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let candidate = match absolute.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => match (absolute.parent(), absolute.file_name()) {
                (Some(parent), Some(file_name)) => match parent.canonicalize() {
                    Ok(canonical_parent) => canonical_parent.join(file_name),
                    Err(_) => normalize_lexically(&absolute),
                },
                _ => normalize_lexically(&absolute),
            },
        };

        if !candidate.starts_with(&self.canonical_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside root {}",
                    candidate.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(candidate)
    }
}

/// Syntactic normalization for paths that do not exist yet.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                components.clear();
                components.push(component.as_os_str().to_owned());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if components.len() > 1 {
                    components.pop();
                }
            }
            Component::Normal(name) => components.push(name.to_owned()),
        }
    }
    components.into_iter().collect()
}

fn join_error(e: task::JoinError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || Ok(validated.exists()))
            .await
            .map_err(join_error)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(join_error)?
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read(&validated))
            .await
            .map_err(join_error)?
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || match std::fs::metadata(&validated) {
            Ok(meta) => Ok(FileMetadata {
                exists: true,
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileMetadata::missing()),
            Err(e) => Err(e),
        })
        .await
        .map_err(join_error)?
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        let contents = contents.to_string();
        task::spawn_blocking(move || std::fs::write(&validated, contents))
            .await
            .map_err(join_error)?
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_validated = self.validate_path(from)?;
        let to_validated = self.validate_path(to)?;
        task::spawn_blocking(move || std::fs::rename(&from_validated, &to_validated))
            .await
            .map_err(join_error)?
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::create_dir_all(&validated))
            .await
            .map_err(join_error)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
