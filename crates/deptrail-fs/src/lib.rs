//! Filesystem abstraction for deptrail.
//!
//! Manifests, lockfiles and registry cache entries are all read through the
//! [`FileSystem`] trait so the dependency engine can run against the real disk
//! ([`NativeFileSystem`]) or against an in-memory tree ([`MemoryFileSystem`]).
//!
//! # Example
//!
//! ```no_run
//! use deptrail_fs::{FileSystem, NativeFileSystem};
//! use std::sync::Arc;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = Arc::new(NativeFileSystem::new(".")?);
//! let manifest = fs.read_to_string(Path::new("package.json")).await?;
//! println!("{}", manifest);
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::{FileMetadata, FileSystem};

pub mod memory;
pub use memory::MemoryFileSystem;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeFileSystem;

