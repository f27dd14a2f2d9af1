//! Package managers: the closed set of supported manifest/lockfile pairs

use crate::deno::{DenoJsonParser, DenoLockfileParser};
use crate::npm::{NpmLockfileParser, PackageJsonParser, PnpmLockfileParser};
use crate::python::{PyprojectParser, UvLockParser};
use crate::ruby::{GemfileLockParser, GemfileParser};
use crate::traits::{LockfileParser, ManifestParser};
use crate::types::Ecosystem;
use deptrail_fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// A package manager and the files it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// npm: package.json + package-lock.json
    Npm,
    /// pnpm: package.json + pnpm-lock.yaml
    Pnpm,
    /// Deno: deno.json(c) + deno.lock
    Deno,
    /// Bundler: Gemfile + Gemfile.lock
    Bundler,
    /// uv: pyproject.toml + uv.lock
    Uv,
}

impl PackageManager {
    /// Every supported manager, in detection order
    pub fn all() -> [PackageManager; 5] {
        [
            PackageManager::Npm,
            PackageManager::Pnpm,
            PackageManager::Deno,
            PackageManager::Bundler,
            PackageManager::Uv,
        ]
    }

    /// Name of the tool, also used for the synthesized `system` dependency
    pub fn system_name(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Deno => "deno",
            PackageManager::Bundler => "bundler",
            PackageManager::Uv => "uv",
        }
    }

    /// Candidate manifest file names, most preferred first
    pub fn manifest_files(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm | PackageManager::Pnpm => &["package.json"],
            PackageManager::Deno => &["deno.json", "deno.jsonc"],
            PackageManager::Bundler => &["Gemfile"],
            PackageManager::Uv => &["pyproject.toml"],
        }
    }

    /// Lockfile file name
    pub fn lockfile_name(&self) -> &'static str {
        self.lockfile_parser().file_name()
    }

    /// Parser for this manager's manifest
    pub fn manifest_parser(&self) -> &'static dyn ManifestParser {
        match self {
            PackageManager::Npm | PackageManager::Pnpm => &PackageJsonParser,
            PackageManager::Deno => &DenoJsonParser,
            PackageManager::Bundler => &GemfileParser,
            PackageManager::Uv => &PyprojectParser,
        }
    }

    /// Parser for this manager's lockfile
    pub fn lockfile_parser(&self) -> &'static dyn LockfileParser {
        match self {
            PackageManager::Npm => &NpmLockfileParser,
            PackageManager::Pnpm => &PnpmLockfileParser,
            PackageManager::Deno => &DenoLockfileParser,
            PackageManager::Bundler => &GemfileLockParser,
            PackageManager::Uv => &UvLockParser,
        }
    }

    /// Ecosystems this manager's dependencies can belong to
    pub fn ecosystems(&self) -> &'static [Ecosystem] {
        match self {
            PackageManager::Npm | PackageManager::Pnpm => &[Ecosystem::Npm],
            PackageManager::Deno => &[Ecosystem::Npm, Ecosystem::Jsr],
            PackageManager::Bundler => &[Ecosystem::Rubygems],
            PackageManager::Uv => &[Ecosystem::Pypi],
        }
    }

    /// Managers used by the project in `dir`.
    ///
    /// A lockfile decides; a manifest without any lockfile falls back to the
    /// default manager for that manifest (`package.json` means npm).
    pub async fn detect<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Vec<PackageManager> {
        let mut found = Vec::new();
        for manager in Self::all() {
            if file_exists(fs, &dir.join(manager.lockfile_name())).await {
                found.push(manager);
            }
        }

        for manager in [
            PackageManager::Npm,
            PackageManager::Deno,
            PackageManager::Bundler,
            PackageManager::Uv,
        ] {
            let owns_manifest = |m: &PackageManager| m.manifest_files() == manager.manifest_files();
            if found.iter().any(owns_manifest) {
                continue;
            }
            for file in manager.manifest_files() {
                if file_exists(fs, &dir.join(file)).await {
                    debug!(manager = %manager, file, "no lockfile, inferring manager from manifest");
                    found.push(manager);
                    break;
                }
            }
        }

        found.sort();
        found
    }
}

async fn file_exists<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> bool {
    fs.metadata(path).await.is_ok_and(|m| m.is_file)
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.system_name())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|m| m.system_name() == s)
            .ok_or_else(|| format!("unknown package manager: {s}"))
    }
}
