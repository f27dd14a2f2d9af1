//! Semantic versions with npm range syntax
//!
//! Versions go through the `semver` crate after light normalization. Ranges
//! are evaluated by a small comparator engine so that caret ranges on `0.x`
//! follow the inventory rule (same minor, patch at or above the base);
//! anything the engine cannot read is handed to `node-semver`.

use semver::{Prerelease, Version};
use std::cmp::Ordering;

/// Parse a version, tolerating a leading `v`/`=` and missing minor/patch
pub fn parse(version: &str) -> Option<Version> {
    let cleaned = clean(version);
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(v) = Version::parse(cleaned) {
        return Some(v);
    }
    let partial = Partial::parse(cleaned)?;
    // A wildcard is a range, not a version
    if partial.wildcard || partial.major.is_none() {
        return None;
    }
    Some(partial.floor())
}

/// Whether the version carries a prerelease tag
pub fn is_prerelease(version: &str) -> bool {
    parse(version).is_some_and(|v| !v.pre.is_empty())
}

/// Whether `version` satisfies the npm-style `specifier`
pub fn satisfies(version: &str, specifier: &str) -> bool {
    let Some(v) = parse(version) else {
        return false;
    };
    // Prereleases never satisfy a range
    if !v.pre.is_empty() {
        return false;
    }
    let Some(spec) = normalize_specifier(specifier) else {
        return false;
    };
    match Range::parse(&spec) {
        Some(range) => range.matches(&v),
        None => match (
            node_semver::Range::parse(&spec),
            node_semver::Version::parse(clean(version)),
        ) {
            (Ok(range), Ok(v)) => range.satisfies(&v),
            _ => false,
        },
    }
}

/// Strip protocol prefixes and reduce a specifier to a plain range.
///
/// Returns `None` for specifiers that do not name a registry range
/// (git URLs, tarballs, local paths, unknown dist-tags).
pub fn normalize_specifier(specifier: &str) -> Option<String> {
    let spec = specifier.trim();

    for protocol in ["npm:", "jsr:"] {
        if let Some(rest) = spec.strip_prefix(protocol) {
            return Some(range_after_package_name(rest).to_string());
        }
    }

    if let Some(rest) = spec.strip_prefix("workspace:") {
        return Some(match rest {
            "" | "*" | "^" | "~" => "*".to_string(),
            other => other.to_string(),
        });
    }

    if spec.is_empty() || spec == "latest" {
        return Some("*".to_string());
    }

    let non_registry = spec.contains(':') || spec.contains('/');
    let dist_tag = spec.starts_with(|c: char| c.is_ascii_alphabetic())
        && !matches!(spec.chars().next(), Some('x' | 'X' | 'v' | 'V'));
    if non_registry || dist_tag {
        return None;
    }
    Some(spec.to_string())
}

/// Range part of `name@range[/subpath]`; `"*"` when no range is present
fn range_after_package_name(rest: &str) -> &str {
    let search_from = usize::from(rest.starts_with('@'));
    match rest[search_from..].find('@') {
        Some(idx) => {
            let range = &rest[search_from + idx + 1..];
            let range = range.split('/').next().unwrap_or(range);
            if range.is_empty() {
                "*"
            } else {
                range
            }
        }
        None => "*",
    }
}

fn clean(version: &str) -> &str {
    let v = version.trim();
    let v = v.strip_prefix('=').unwrap_or(v).trim_start();
    v.strip_prefix(|c: char| c == 'v' || c == 'V').unwrap_or(v)
}

/// Possibly incomplete version used as a comparator base (`1`, `1.2`, `1.2.x`)
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    wildcard: bool,
    pre: Prerelease,
}

impl Partial {
    fn parse(input: &str) -> Option<Self> {
        let input = clean(input);
        let input = input.split('+').next().unwrap_or(input);
        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, pre),
            None => (input, ""),
        };
        if core.is_empty() {
            return None;
        }

        let mut numbers = [None; 3];
        let mut wildcard = false;
        for (idx, part) in core.split('.').enumerate() {
            if idx >= 3 {
                return None;
            }
            match part {
                "x" | "X" | "*" => wildcard = true,
                digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    if !wildcard {
                        numbers[idx] = Some(digits.parse().ok()?);
                    }
                }
                _ => return None,
            }
        }

        let pre = if pre.is_empty() {
            Prerelease::EMPTY
        } else {
            Prerelease::new(pre).ok()?
        };

        Some(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            wildcard,
            pre,
        })
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    fn floor(&self) -> Version {
        let mut v = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        v.pre = self.pre.clone();
        v
    }

    /// Compare only the components this partial specifies
    fn cmp_prefix(&self, v: &Version) -> Ordering {
        let given = [
            (self.major, v.major),
            (self.minor, v.minor),
            (self.patch, v.patch),
        ];
        for (base, actual) in given {
            match base {
                Some(base) => match actual.cmp(&base) {
                    Ordering::Equal => continue,
                    other => return other,
                },
                None => break,
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Caret,
    Tilde,
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

#[derive(Debug, Clone)]
struct Comparator {
    op: Op,
    base: Partial,
}

impl Comparator {
    fn parse(token: &str) -> Option<Self> {
        const OPS: [(&str, Op); 8] = [
            (">=", Op::Gte),
            ("<=", Op::Lte),
            ("~>", Op::Tilde),
            (">", Op::Gt),
            ("<", Op::Lt),
            ("=", Op::Eq),
            ("^", Op::Caret),
            ("~", Op::Tilde),
        ];
        let (op, rest) = OPS
            .iter()
            .find_map(|(prefix, op)| token.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((Op::Eq, token));
        Some(Self {
            op,
            base: Partial::parse(rest.trim())?,
        })
    }

    fn matches(&self, v: &Version) -> bool {
        let base = &self.base;
        let Some(major) = base.major else {
            return !matches!(self.op, Op::Gt | Op::Lt);
        };
        let floor = base.floor();
        let at_least_floor = v.cmp_precedence(&floor) != Ordering::Less;

        match self.op {
            Op::Caret => match base.minor {
                Some(minor) if major == 0 => v.major == 0 && v.minor == minor && at_least_floor,
                _ => v.major == major && at_least_floor,
            },
            Op::Tilde => match base.minor {
                Some(minor) => v.major == major && v.minor == minor && at_least_floor,
                None => v.major == major,
            },
            Op::Gte => at_least_floor,
            Op::Lt => v.cmp_precedence(&floor) == Ordering::Less,
            Op::Gt if base.is_full() => v.cmp_precedence(&floor) == Ordering::Greater,
            Op::Gt => base.cmp_prefix(v) == Ordering::Greater,
            Op::Lte if base.is_full() => v.cmp_precedence(&floor) != Ordering::Greater,
            Op::Lte => base.cmp_prefix(v) != Ordering::Greater,
            Op::Eq if base.is_full() => v.cmp_precedence(&floor) == Ordering::Equal,
            Op::Eq => base.cmp_prefix(v) == Ordering::Equal,
        }
    }

}

/// `||`-separated alternatives of AND-ed comparators
#[derive(Debug, Clone)]
struct Range {
    sets: Vec<Vec<Comparator>>,
}

impl Range {
    fn parse(spec: &str) -> Option<Self> {
        let mut sets = Vec::new();
        for alternative in spec.split("||") {
            let alternative = alternative.trim();
            if let Some((low, high)) = alternative.split_once(" - ") {
                let low = Partial::parse(low.trim())?;
                let high = Partial::parse(high.trim())?;
                sets.push(vec![
                    Comparator {
                        op: Op::Gte,
                        base: low,
                    },
                    Comparator {
                        op: Op::Lte,
                        base: high,
                    },
                ]);
                continue;
            }

            let mut comparators = Vec::new();
            let mut pending_op: Option<&str> = None;
            for token in alternative.split_whitespace() {
                if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
                    pending_op = Some(token);
                    continue;
                }
                let comparator = match pending_op.take() {
                    Some(op) => Comparator::parse(&format!("{op}{token}"))?,
                    None => Comparator::parse(token)?,
                };
                comparators.push(comparator);
            }
            if pending_op.is_some() {
                return None;
            }
            sets.push(comparators);
        }
        Some(Self { sets })
    }

    fn matches(&self, v: &Version) -> bool {
        self.sets.iter().any(|set| set.iter().all(|c| c.matches(v)))
    }
}
