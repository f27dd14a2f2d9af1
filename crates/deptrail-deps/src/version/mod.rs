//! Version parsing, comparison and range matching per ecosystem
//!
//! Three grammars are supported:
//! - [`semantic`]: npm / JSR ranges (`^`, `~`, comparators, `||` unions)
//! - [`rubygems`]: Bundler requirements (`~>`, comma-separated clauses)
//! - [`pep440`]: Python specifiers (`~=`, `==1.2.*`, `===`)
//!
//! Every operation is total: unparseable input never panics and never errors.
//! Comparing an invalid version yields `Ordering::Equal`, and an unreadable
//! specifier matches nothing.

pub mod pep440;
pub mod rubygems;
pub mod semantic;

use std::cmp::Ordering;

/// Version grammar of an ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionGrammar {
    /// Semantic versioning with npm range syntax
    Semantic,
    /// RubyGems segment versions
    RubyGems,
    /// PEP 440 subset
    Pep440,
}

/// A version parsed by one of the grammars
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedVersion {
    /// Semantic version
    Semantic(semver::Version),
    /// RubyGems version
    RubyGems(rubygems::GemVersion),
    /// PEP 440 version
    Pep440(pep440::Pep440Version),
}

impl VersionGrammar {
    /// Parse a version string
    pub fn parse(&self, version: &str) -> Option<ParsedVersion> {
        match self {
            VersionGrammar::Semantic => semantic::parse(version).map(ParsedVersion::Semantic),
            VersionGrammar::RubyGems => rubygems::GemVersion::parse(version).map(ParsedVersion::RubyGems),
            VersionGrammar::Pep440 => pep440::Pep440Version::parse(version).map(ParsedVersion::Pep440),
        }
    }

    /// Whether the string is a version in this grammar
    pub fn is_valid(&self, version: &str) -> bool {
        self.parse(version).is_some()
    }

    /// Total order on versions; `Equal` when either side is invalid
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            VersionGrammar::Semantic => match (semantic::parse(a), semantic::parse(b)) {
                (Some(a), Some(b)) => a.cmp_precedence(&b),
                _ => Ordering::Equal,
            },
            VersionGrammar::RubyGems => {
                match (rubygems::GemVersion::parse(a), rubygems::GemVersion::parse(b)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => Ordering::Equal,
                }
            }
            VersionGrammar::Pep440 => {
                match (pep440::Pep440Version::parse(a), pep440::Pep440Version::parse(b)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => Ordering::Equal,
                }
            }
        }
    }

    /// Whether `version` satisfies `specifier`
    pub fn satisfies(&self, version: &str, specifier: &str) -> bool {
        match self {
            VersionGrammar::Semantic => semantic::satisfies(version, specifier),
            VersionGrammar::RubyGems => rubygems::satisfies(version, specifier),
            VersionGrammar::Pep440 => pep440::satisfies(version, specifier),
        }
    }

    /// Whether the version is a prerelease in this grammar
    pub fn is_prerelease(&self, version: &str) -> bool {
        match self {
            VersionGrammar::Semantic => semantic::is_prerelease(version),
            // Any letter marks a prerelease ("1.0.0.rc1", "2.0b1", "1.0.post1")
            VersionGrammar::RubyGems | VersionGrammar::Pep440 => {
                version.chars().any(|c| c.is_ascii_alphabetic())
            }
        }
    }

    /// Highest of the given versions; invalid versions are ignored
    pub fn max_version<'a, I>(&self, versions: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        versions
            .into_iter()
            .filter(|v| self.is_valid(v))
            .fold(None, |best, v| match best {
                Some(b) if self.compare(v, b) != Ordering::Greater => Some(b),
                _ => Some(v),
            })
    }

    /// Highest stable version satisfying `specifier`, or `current` when none does
    pub fn wanted(&self, current: &str, specifier: &str, available: &[String]) -> String {
        self.max_version(
            available
                .iter()
                .map(String::as_str)
                .filter(|v| !self.is_prerelease(v) && self.satisfies(v, specifier)),
        )
        .unwrap_or(current)
        .to_string()
    }

    /// Registry latest tag when it is a stable version, else the highest stable version
    pub fn latest(&self, tag: Option<&str>, available: &[String]) -> Option<String> {
        if let Some(tag) = tag {
            if self.is_valid(tag) && !self.is_prerelease(tag) {
                return Some(tag.to_string());
            }
        }
        self.max_version(
            available
                .iter()
                .map(String::as_str)
                .filter(|v| !self.is_prerelease(v)),
        )
        .map(str::to_string)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn grammar() -> impl Strategy<Value = VersionGrammar> {
        prop_oneof![
            Just(VersionGrammar::Semantic),
            Just(VersionGrammar::RubyGems),
            Just(VersionGrammar::Pep440),
        ]
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(
            g in grammar(),
            a in r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}",
            b in r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}"
        ) {
            prop_assert_eq!(g.compare(&a, &b), g.compare(&b, &a).reverse());
        }

        #[test]
        fn compare_is_reflexive(
            g in grammar(),
            version in r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}"
        ) {
            prop_assert_eq!(g.compare(&version, &version), Ordering::Equal);
        }

        #[test]
        fn compare_is_transitive(
            g in grammar(),
            a in r"[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2}",
            b in r"[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2}",
            c in r"[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2}"
        ) {
            if g.compare(&a, &b) == Ordering::Less && g.compare(&b, &c) == Ordering::Less {
                prop_assert_eq!(g.compare(&a, &c), Ordering::Less);
            }
        }

        #[test]
        fn caret_keeps_major_and_floor(
            major in 1u64..50,
            minor in 0u64..50,
            patch in 0u64..50,
            v_major in 0u64..60,
            v_minor in 0u64..60,
            v_patch in 0u64..60
        ) {
            let base = format!("{major}.{minor}.{patch}");
            let version = format!("{v_major}.{v_minor}.{v_patch}");
            let expected = v_major == major
                && (v_minor, v_patch) >= (minor, patch);
            prop_assert_eq!(
                VersionGrammar::Semantic.satisfies(&version, &format!("^{base}")),
                expected
            );
        }

        #[test]
        fn wanted_never_below_satisfying_current(
            versions in proptest::collection::vec(r"[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2}", 1..8)
        ) {
            let g = VersionGrammar::Semantic;
            let current = versions[0].clone();
            let wanted = g.wanted(&current, "*", &versions);
            prop_assert_ne!(g.compare(&wanted, &current), Ordering::Less);
        }
    }
}
