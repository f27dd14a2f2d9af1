//! # deptrail-deps
//!
//! Dependency inventory for npm, pnpm, Deno, Bundler and uv projects.
//!
//! This crate provides functionality to:
//! - Parse manifests (package.json, deno.json, Gemfile, pyproject.toml)
//! - Parse lockfiles (package-lock.json, pnpm-lock.yaml, deno.lock, Gemfile.lock, uv.lock)
//! - Compare and match versions with semver, RubyGems and PEP 440 rules
//! - Merge both into one normalized dependency set (direct and transitive)
//! - Find outdated direct dependencies using `deptrail-info` registry lookups
//! - Build dependency trees and reverse "why is this installed" chains
//!
//! ## Architecture
//!
//! - Parser traits (`ManifestParser`, `LockfileParser`) with one
//!   implementation per file format; parsers never fail, bad input is empty input
//! - [`PackageManager`] binds a manifest parser, a lockfile parser and the
//!   ecosystems they produce
//! - [`Inventory`] reads a project directory through `deptrail-fs` and runs
//!   the graph builder, outdated checker, tree builder and chain tracer
//!
//! ## Example
//!
//! ```rust,no_run
//! use deptrail_deps::{Inventory, PackageManager};
//!
//! # async fn example() -> deptrail_deps::Result<()> {
//! let inventory = Inventory::native(".").await?;
//!
//! for manager in inventory.detect().await {
//!     for outdated in inventory.outdated(manager, true).await {
//!         println!(
//!             "{}: wanted {}, latest {}",
//!             outdated.dependency.name, outdated.wanted, outdated.latest
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod chain;
pub mod deno;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod lockfile;
pub mod manager;
pub mod npm;
pub mod outdated;
pub mod python;
pub mod ruby;
pub mod toml_subset;
pub mod traits;
pub mod tree;
pub mod types;
pub mod version;

// Re-export main types and traits
pub use error::{Error, Result};
pub use lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
pub use traits::{LockfileParser, ManifestParser};
pub use types::{
    Dependency, DependencyGroup, DependencyTreeEntry, Ecosystem, ManifestEntry,
    OutdatedDependency, VersionEntry, VersionSource,
};

// Re-export ecosystem-specific parsers
pub use deno::{DenoJsonParser, DenoLockfileParser};
pub use npm::{NpmLockfileParser, PackageJsonParser, PnpmLockfileParser};
pub use python::{PyprojectParser, UvLockParser};
pub use ruby::{GemfileLockParser, GemfileParser};

// Re-export the analysis entry points
pub use chain::{trace_chain, ChainLink};
pub use graph::build_dependencies;
pub use inventory::{Inventory, ProjectFiles};
pub use manager::PackageManager;
pub use outdated::check_outdated;
pub use tree::build_tree;
pub use version::VersionGrammar;
