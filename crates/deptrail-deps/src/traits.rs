//! Core traits for manifest and lockfile parsing

use crate::lockfile::LockfileData;
use crate::types::ManifestEntry;

/// Reads the direct dependency declarations of a manifest
///
/// Implementations are total: malformed input yields an empty (or partial)
/// list, never an error.
pub trait ManifestParser: Send + Sync {
    /// File name this parser understands (e.g. `package.json`)
    fn file_name(&self) -> &'static str;

    /// Parse manifest text into declarations in file order
    fn parse_manifest(&self, text: &str) -> Vec<ManifestEntry>;
}

/// Reads the resolved package graph of a lockfile
///
/// Implementations are total: malformed input yields empty lockfile data,
/// never an error.
pub trait LockfileParser: Send + Sync {
    /// File name this parser understands (e.g. `package-lock.json`)
    fn file_name(&self) -> &'static str;

    /// Parse lockfile text into locked packages and their edges
    fn parse_lockfile(&self, text: &str) -> LockfileData;
}
