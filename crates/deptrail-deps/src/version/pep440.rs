//! PEP 440 versions and specifiers (the subset found in `pyproject.toml`)

use std::cmp::Ordering;

/// Prerelease phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreKind {
    /// `a`, `alpha`
    Alpha,
    /// `b`, `beta`
    Beta,
    /// `rc`, `c`, `pre`, `preview`
    Rc,
}

/// A parsed PEP 440 version
#[derive(Debug, Clone)]
pub struct Pep440Version {
    /// `N!` prefix, 0 when absent
    pub epoch: u64,
    /// Release numbers
    pub release: Vec<u64>,
    /// Prerelease phase and number
    pub pre: Option<(PreKind, u64)>,
    /// Post-release number
    pub post: Option<u64>,
    /// Development release number
    pub dev: Option<u64>,
    /// Local version label after `+`
    pub local: Option<String>,
}

impl Pep440Version {
    /// Parse a version such as `1.2.3`, `2.0rc1`, `1!1.0.post2.dev3+local`
    pub fn parse(input: &str) -> Option<Self> {
        let lowered = input.trim().to_ascii_lowercase();
        let s = lowered.strip_prefix('v').unwrap_or(&lowered);
        let (s, local) = match s.split_once('+') {
            Some((public, local)) if !local.is_empty() => (public, Some(local.to_string())),
            Some(_) => return None,
            None => (s, None),
        };

        let (epoch, s) = match s.split_once('!') {
            Some((epoch, rest)) => (epoch.parse().ok()?, rest),
            None => (0, s),
        };

        let release_end = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let release_str = s[..release_end].trim_end_matches('.');
        if release_str.is_empty() {
            return None;
        }
        let release = release_str
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        // A trailing '.' belongs to the suffix ("1.0.post1")
        let mut rest = &s[release_str.len()..];

        let mut version = Self {
            epoch,
            release,
            pre: None,
            post: None,
            dev: None,
            local,
        };

        if let Some((kind, after)) = take_pre_kind(strip_separator(rest)) {
            let (n, after) = take_number(strip_separator(after));
            version.pre = Some((kind, n));
            rest = after;
        }

        let implicit_post = rest
            .strip_prefix('-')
            .filter(|after| after.starts_with(|c: char| c.is_ascii_digit()));
        if let Some(after) = implicit_post {
            // "1.0-1" is shorthand for "1.0.post1"
            let (n, after) = take_number(after);
            version.post = Some(n);
            rest = after;
        } else {
            let candidate = strip_separator(rest);
            if let Some(after) = ["post", "rev", "r"]
                .iter()
                .find_map(|p| candidate.strip_prefix(p))
            {
                let (n, after) = take_number(strip_separator(after));
                version.post = Some(n);
                rest = after;
            }
        }

        if let Some(after) = strip_separator(rest).strip_prefix("dev") {
            let (n, after) = take_number(strip_separator(after));
            version.dev = Some(n);
            rest = after;
        }

        if !rest.is_empty() {
            return None;
        }
        Some(version)
    }

    /// Release number at `idx`, zero when missing
    fn release_at(&self, idx: usize) -> u64 {
        self.release.get(idx).copied().unwrap_or(0)
    }

    fn cmp_release(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.release_at(i).cmp(&other.release_at(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Sort key for the pre/post/dev suffixes
    fn suffix_key(&self) -> (PreKey, Option<u64>, DevKey) {
        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((kind, n)), _, _) => PreKey::Pre(kind, n),
            _ => PreKey::Final,
        };
        let dev = match self.dev {
            Some(n) => DevKey::Dev(n),
            None => DevKey::None,
        };
        (pre, self.post, dev)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreKind, u64),
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    None,
}

impl Ord for Pep440Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.cmp_release(other))
            .then_with(|| self.suffix_key().cmp(&other.suffix_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Pep440Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pep440Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pep440Version {}

fn strip_separator(s: &str) -> &str {
    s.strip_prefix(['.', '_', '-']).unwrap_or(s)
}

fn take_pre_kind(s: &str) -> Option<(PreKind, &str)> {
    const KINDS: [(&str, PreKind); 7] = [
        ("alpha", PreKind::Alpha),
        ("beta", PreKind::Beta),
        ("preview", PreKind::Rc),
        ("pre", PreKind::Rc),
        ("rc", PreKind::Rc),
        ("a", PreKind::Alpha),
        ("b", PreKind::Beta),
    ];
    KINDS
        .iter()
        .find_map(|(prefix, kind)| s.strip_prefix(prefix).map(|rest| (*kind, rest)))
        .or_else(|| s.strip_prefix('c').map(|rest| (PreKind::Rc, rest)))
}

fn take_number(s: &str) -> (u64, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (s[..end].parse().unwrap_or(0), &s[end..])
}

/// Whether `version` satisfies a comma-separated PEP 440 specifier
pub fn satisfies(version: &str, specifier: &str) -> bool {
    // Any letter (a, b, rc, dev, post, local) excludes the version
    if version.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let spec = specifier.trim();
    if spec.is_empty() || spec == "*" {
        return Pep440Version::parse(version).is_some();
    }
    spec.split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .all(|clause| clause_matches(version, clause))
}

fn clause_matches(raw: &str, clause: &str) -> bool {
    const OPS: [&str; 8] = ["===", "~=", "==", "!=", "<=", ">=", "<", ">"];
    let (op, rest) = OPS
        .iter()
        .find_map(|op| clause.strip_prefix(op).map(|rest| (*op, rest.trim())))
        .unwrap_or(("==", clause));

    if op == "===" {
        return raw.trim() == rest;
    }

    if let Some(prefix) = rest.strip_suffix(".*") {
        // Prefix match on the raw release string
        let raw = raw.trim();
        let matched = raw == prefix || raw.starts_with(&format!("{prefix}."));
        return match op {
            "==" => matched,
            "!=" => !matched,
            _ => false,
        };
    }

    let (Some(v), Some(base)) = (Pep440Version::parse(raw), Pep440Version::parse(rest)) else {
        return false;
    };

    match op {
        "~=" => {
            let pinned = if base.release.len() >= 3 {
                v.release_at(0) == base.release_at(0) && v.release_at(1) == base.release_at(1)
            } else {
                v.release_at(0) == base.release_at(0)
            };
            pinned && v >= base
        }
        "==" => v == base,
        "!=" => v != base,
        "<=" => v <= base,
        ">=" => v >= base,
        "<" => v < base,
        ">" => v > base,
        _ => false,
    }
}
