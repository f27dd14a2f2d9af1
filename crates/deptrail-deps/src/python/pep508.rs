//! PEP 508 dependency strings (`name[extra] (>=1.0,<2) ; marker`)

/// A requirement reduced to what the inventory needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Requirement {
    /// Distribution name as written, extras removed
    pub name: String,
    /// Version specifier, `"*"` when absent or for URL references
    pub specifier: String,
}

/// Parse one dependency string. Returns `None` when no name can be read.
pub(crate) fn parse_requirement(input: &str) -> Option<Requirement> {
    // Environment markers never affect the declared range
    let without_marker = input.split(';').next().unwrap_or_default().trim();

    let name_end = without_marker
        .find(|c: char| matches!(c, '[' | '(' | ';' | '<' | '>' | '=' | '!' | '~' | '@') || c.is_whitespace())
        .unwrap_or(without_marker.len());
    let name = &without_marker[..name_end];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return None;
    }

    let mut rest = without_marker[name_end..].trim_start();
    if rest.starts_with('[') {
        rest = match rest.find(']') {
            Some(close) => rest[close + 1..].trim_start(),
            None => return None,
        };
    }

    let specifier = if rest.starts_with('@') {
        // Direct URL reference: no version range to speak of
        String::new()
    } else {
        rest.trim_start_matches('(')
            .trim_end_matches(')')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("")
    };

    Some(Requirement {
        name: name.to_string(),
        specifier: if specifier.is_empty() {
            "*".to_string()
        } else {
            specifier
        },
    })
}
