//! Core domain types for registry lookups

use serde::{Deserialize, Serialize};

/// Package registries deptrail knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// npm registry
    Npm,
    /// JSR (JavaScript Registry)
    Jsr,
    /// rubygems.org
    RubyGems,
    /// Python Package Index
    PyPi,
}

impl Registry {
    /// Get the registry name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Npm => "npm",
            Registry::Jsr => "jsr",
            Registry::RubyGems => "rubygems",
            Registry::PyPi => "pypi",
        }
    }
}

impl std::fmt::Display for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Published versions of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersions {
    /// Registry source
    pub registry: Registry,
    /// Package name as queried
    pub name: String,
    /// Every published (non-yanked) version, in registry order
    pub versions: Vec<String>,
    /// Registry-reported latest stable version, when the registry has one
    pub latest: Option<String>,
}
