//! Gemfile.lock parser

use crate::lockfile::{LockEdge, LockedPackage, LockfileData, RootPackage};
use crate::traits::LockfileParser;
use crate::types::Ecosystem;
use tracing::trace;

/// Gemfile.lock parser
#[derive(Debug, Clone, Copy, Default)]
pub struct GemfileLockParser;

impl GemfileLockParser {
    /// Create a new Gemfile.lock parser
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// `GEM`, `GIT` or `PATH`: package specs
    Source,
    /// `DEPENDENCIES`: the root set
    Dependencies,
    /// `PLATFORMS`, `BUNDLED WITH`, `RUBY VERSION`, ...
    Other,
}

impl LockfileParser for GemfileLockParser {
    fn file_name(&self) -> &'static str {
        "Gemfile.lock"
    }

    fn parse_lockfile(&self, text: &str) -> LockfileData {
        let mut data = LockfileData::new(self.file_name());
        let mut section = Section::Other;
        let mut in_specs = false;
        let mut root_edges = Vec::new();
        let mut saw_dependencies = false;
        // Package the current 6-space edge lines belong to; None when its
        // platform variant was coalesced into an earlier one
        let mut current: Option<LockedPackage> = None;

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start().len();

            if indent == 0 {
                flush(&mut data, current.take());
                in_specs = false;
                section = match line {
                    "GEM" | "GIT" | "PATH" => Section::Source,
                    "DEPENDENCIES" => {
                        saw_dependencies = true;
                        Section::Dependencies
                    }
                    _ => Section::Other,
                };
                continue;
            }

            match section {
                Section::Source => match indent {
                    2 => {
                        flush(&mut data, current.take());
                        in_specs = line.trim() == "specs:";
                    }
                    4 if in_specs => {
                        flush(&mut data, current.take());
                        current = spec_line(line.trim()).and_then(|(name, version)| {
                            let version = strip_platform(&version);
                            if data.find(Ecosystem::Rubygems, &name, version).is_some() {
                                trace!(name = %name, version, "coalescing platform variant");
                                return None;
                            }
                            Some(LockedPackage::new(Ecosystem::Rubygems, name, version))
                        });
                    }
                    6 if in_specs => {
                        if let (Some(package), Some(edge)) = (current.as_mut(), edge_line(line.trim())) {
                            package.dependencies.push(edge);
                        }
                    }
                    _ => {}
                },
                Section::Dependencies if indent == 2 => {
                    if let Some(edge) = edge_line(line.trim().trim_end_matches('!')) {
                        root_edges.push(edge);
                    }
                }
                _ => {}
            }
        }
        flush(&mut data, current.take());

        if saw_dependencies {
            data.root = Some(RootPackage {
                name: None,
                dependencies: root_edges,
            });
        }
        data
    }
}

fn flush(data: &mut LockfileData, package: Option<LockedPackage>) {
    if let Some(package) = package {
        data.insert(package);
    }
}

/// `name (version)`
fn spec_line(line: &str) -> Option<(String, String)> {
    let (name, rest) = line.split_once(" (")?;
    let version = rest.strip_suffix(')')?.trim();
    (!name.is_empty() && !version.is_empty()).then(|| (name.to_string(), version.to_string()))
}

/// `name` or `name (requirement, ...)`
fn edge_line(line: &str) -> Option<LockEdge> {
    let line = line.trim_end_matches('!');
    match line.split_once(" (") {
        Some((name, rest)) => {
            let requirement = rest.strip_suffix(')').unwrap_or(rest).trim();
            let edge = LockEdge::new(Ecosystem::Rubygems, name.trim());
            Some(if requirement.is_empty() {
                edge
            } else {
                edge.with_requirement(requirement)
            })
        }
        None if !line.trim().is_empty() => Some(LockEdge::new(Ecosystem::Rubygems, line.trim())),
        None => None,
    }
}

/// `1.16.0-x86_64-linux` → `1.16.0`
fn strip_platform(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}
