//! RubyGems versions and Bundler requirements

use std::cmp::Ordering;

/// One dot-separated piece of a gem version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Numeric segment, compared numerically
    Number(u64),
    /// Alphabetic segment (marks a prerelease)
    Text(String),
}

/// A parsed gem version such as `8.0.1` or `1.0.0.rc1`
#[derive(Debug, Clone)]
pub struct GemVersion {
    segments: Vec<Segment>,
}

impl GemVersion {
    /// Parse a gem version; `-` is treated like `.`
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if !s.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return None;
        }

        let mut segments = Vec::new();
        for piece in s.split(['.', '-']) {
            if piece.is_empty() {
                return None;
            }
            // "rc1" splits into "rc" and 1
            let mut rest = piece;
            while !rest.is_empty() {
                let digits = rest.starts_with(|c: char| c.is_ascii_digit());
                let end = rest
                    .find(|c: char| c.is_ascii_digit() != digits)
                    .unwrap_or(rest.len());
                let (run, tail) = rest.split_at(end);
                segments.push(if digits {
                    Segment::Number(run.parse().ok()?)
                } else {
                    Segment::Text(run.to_ascii_lowercase())
                });
                rest = tail;
            }
        }
        Some(Self { segments })
    }

    /// All segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment is alphabetic
    pub fn is_prerelease(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Text(_)))
    }

    /// Number of leading numeric segments
    fn release_len(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| matches!(s, Segment::Number(_)))
            .count()
    }

    /// Numeric value at `idx`, zero when missing or alphabetic
    fn number_at(&self, idx: usize) -> u64 {
        match self.segments.get(idx) {
            Some(Segment::Number(n)) => *n,
            _ => 0,
        }
    }
}

impl Ord for GemVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = Segment::Number(0);
        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let a = self.segments.get(idx).unwrap_or(&zero);
            let b = other.segments.get(idx).unwrap_or(&zero);
            let ord = match (a, b) {
                (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
                (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
                (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
                (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for GemVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GemVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GemVersion {}

/// Whether `version` satisfies a comma-separated Bundler requirement
pub fn satisfies(version: &str, specifier: &str) -> bool {
    let Some(v) = GemVersion::parse(version) else {
        return false;
    };
    if v.is_prerelease() {
        return false;
    }
    let spec = specifier.trim();
    if spec.is_empty() || spec == "*" {
        return true;
    }
    spec.split(',').all(|clause| clause_matches(&v, clause.trim()))
}

fn clause_matches(v: &GemVersion, clause: &str) -> bool {
    const OPS: [&str; 7] = ["~>", ">=", "<=", "!=", ">", "<", "="];
    let (op, rest) = OPS
        .iter()
        .find_map(|op| clause.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("=", clause));
    let Some(base) = GemVersion::parse(rest) else {
        return false;
    };

    match op {
        "~>" => {
            let same_major = v.number_at(0) == base.number_at(0);
            let same_minor = v.number_at(1) == base.number_at(1);
            let pinned = if base.release_len() >= 3 {
                same_major && same_minor
            } else {
                same_major
            };
            pinned && *v >= base
        }
        ">=" => *v >= base,
        "<=" => *v <= base,
        "!=" => *v != base,
        ">" => *v > base,
        "<" => *v < base,
        _ => *v == base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GemVersion {
        GemVersion::parse(s).unwrap()
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.0.0.rc1") < v("1.0.0"));
        assert!(v("1.0.0.beta") < v("1.0.0.rc"));
        assert!(v("1.10") > v("1.9"));
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("8.0.1") > v("8.0.0.1"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(GemVersion::parse("").is_none());
        assert!(GemVersion::parse("abc").is_none());
        assert!(GemVersion::parse("1..2").is_none());
        assert!(GemVersion::parse("1.0 beta").is_none());
    }

    #[test]
    fn test_pessimistic_operator() {
        assert!(satisfies("8.0.3", "~> 8.0.1"));
        assert!(!satisfies("8.1.0", "~> 8.0.1"));
        assert!(!satisfies("8.0.0", "~> 8.0.1"));
        assert!(satisfies("3.9.0", "~> 3.2"));
        assert!(!satisfies("4.0.0", "~> 3.2"));
        assert!(!satisfies("3.1.0", "~> 3.2"));
    }

    #[test]
    fn test_compound_requirements() {
        assert!(satisfies("2.5.0", ">= 2.0, < 3"));
        assert!(!satisfies("3.0.0", ">= 2.0, < 3"));
        assert!(satisfies("1.2.4", "!= 1.2.3"));
        assert!(satisfies("1.2.3", "1.2.3"));
        assert!(satisfies("1.2.3", "= 1.2.3"));
        assert!(satisfies("0.0.1", ""));
        assert!(!satisfies("1.0", "~> banana"));
    }

    #[test]
    fn test_prereleases_never_satisfy() {
        assert!(!satisfies("8.0.0.rc1", ">= 1.0"));
        assert!(!satisfies("8.0.0.rc1", "8.0.0.rc1"));
        assert!(!satisfies("2.0.0.beta", ""));
    }
}
