//! A forgiving reader for the TOML subset used by `pyproject.toml` and `uv.lock`
//!
//! Supported: `[table]` and `[[array.of.tables]]` headers, dotted and quoted
//! keys, basic and literal strings, integers, floats, booleans, bare
//! date-times (kept as strings), arrays (possibly spanning several lines) and
//! inline tables. Malformed lines are skipped and the rest of the document is
//! still returned, so callers always get a (possibly partial) table.

use serde_json::{Map, Number, Value};
use tracing::trace;

/// Parse a document into a JSON object. Never fails.
pub fn parse(text: &str) -> Value {
    let mut root = Map::new();
    let mut current: Vec<String> = Vec::new();

    for line in logical_lines(text) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(inner) = line.strip_prefix("[[").and_then(|l| l.strip_suffix("]]")) {
            match parse_key_path(inner) {
                Some(path) if push_array_table(&mut root, &path) => current = path,
                _ => trace!(line, "skipping malformed array-of-tables header"),
            }
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            match parse_key_path(inner) {
                Some(path) if table_at(&mut root, &path).is_some() => current = path,
                _ => trace!(line, "skipping malformed table header"),
            }
            continue;
        }

        let Some((key, value)) = split_key_value(line) else {
            trace!(line, "skipping line without key/value pair");
            continue;
        };
        let (Some(key_path), Some(value)) = (parse_key_path(key), parse_value_str(value)) else {
            trace!(line, "skipping unreadable key/value pair");
            continue;
        };
        if !insert_value(&mut root, &current, &key_path, value) {
            trace!(line, "skipping conflicting key");
        }
    }

    Value::Object(root)
}

/// Join physical lines so that multi-line arrays and inline tables form one logical line.
/// Comments are removed along the way.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    let mut depth: i64 = 0;
    let mut open_multiline: Option<&str> = None;

    for raw in text.lines() {
        if let Some(delim) = open_multiline {
            buffer.push('\n');
            buffer.push_str(raw);
            if raw.contains(delim) {
                open_multiline = None;
                if depth <= 0 {
                    lines.push(std::mem::take(&mut buffer));
                    depth = 0;
                }
            }
            continue;
        }

        let (stripped, delta) = strip_comment(raw);
        if buffer.is_empty() && depth == 0 {
            let trimmed = stripped.trim_start();
            // Headers balance their own brackets on a single line
            if trimmed.starts_with('[') {
                lines.push(stripped);
                continue;
            }
        } else {
            buffer.push('\n');
        }
        buffer.push_str(&stripped);
        depth += delta;

        open_multiline = ["\"\"\"", "\'\'\'"]
            .into_iter()
            .find(|delim| stripped.matches(delim).count() % 2 == 1);
        if open_multiline.is_none() && depth <= 0 {
            lines.push(std::mem::take(&mut buffer));
            depth = 0;
        }
    }
    if !buffer.is_empty() {
        lines.push(buffer);
    }
    lines
}

/// Remove a trailing `#` comment, returning the net bracket depth change outside strings.
fn strip_comment(line: &str) -> (String, i64) {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0;
    let mut in_basic = false;
    let mut in_literal = false;
    let mut escaped = false;

    for c in line.chars() {
        if in_basic {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_basic = false;
            }
        } else if in_literal {
            if c == '\'' {
                in_literal = false;
            }
        } else {
            match c {
                '#' => break,
                '"' => in_basic = true,
                '\'' => in_literal = true,
                '[' | '{' => depth += 1,
                ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        out.push(c);
    }
    (out, depth)
}

/// Split `key = value` at the first `=` outside quotes
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let mut in_basic = false;
    let mut in_literal = false;
    for (idx, c) in line.char_indices() {
        match c {
            '"' if !in_literal => in_basic = !in_basic,
            '\'' if !in_basic => in_literal = !in_literal,
            '=' if !in_basic && !in_literal => return Some((&line[..idx], &line[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// Parse `a.b."c.d"` into its segments
fn parse_key_path(input: &str) -> Option<Vec<String>> {
    let mut cursor = Cursor::new(input);
    let mut path = Vec::new();
    loop {
        cursor.skip_inline_ws();
        path.push(cursor.parse_key()?);
        cursor.skip_inline_ws();
        match cursor.peek() {
            Some('.') => cursor.bump(),
            None => return Some(path),
            Some(_) => return None,
        }
    }
}

fn parse_value_str(input: &str) -> Option<Value> {
    let mut cursor = Cursor::new(input);
    let value = cursor.parse_value()?;
    cursor.skip_ws();
    cursor.at_end().then_some(value)
}

/// Walk to (creating as needed) the table at `path`, descending into the
/// last element of any array of tables on the way.
fn table_at<'a>(root: &'a mut Map<String, Value>, path: &[String]) -> Option<&'a mut Map<String, Value>> {
    let mut table = root;
    for key in path {
        let slot = table
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let slot = match slot {
            Value::Array(items) => items.last_mut()?,
            other => other,
        };
        table = slot.as_object_mut()?;
    }
    Some(table)
}

fn push_array_table(root: &mut Map<String, Value>, path: &[String]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let Some(parent) = table_at(root, parents) else {
        return false;
    };
    match parent
        .entry(last.clone())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => {
            items.push(Value::Object(Map::new()));
            true
        }
        _ => false,
    }
}

fn insert_value(
    root: &mut Map<String, Value>,
    current: &[String],
    key_path: &[String],
    value: Value,
) -> bool {
    let Some((last, parents)) = key_path.split_last() else {
        return false;
    };
    let Some(table) = table_at(root, current) else {
        return false;
    };
    let Some(table) = table_at(table, parents) else {
        return false;
    };
    if table.contains_key(last) {
        return false;
    }
    table.insert(last.clone(), value);
    true
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn skip_inline_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_key(&mut self) -> Option<String> {
        match self.peek()? {
            '"' => self.parse_basic_string(),
            '\'' => self.parse_literal_string(),
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                    self.bump();
                }
                (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
            }
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '"' => self.parse_basic_string().map(Value::String),
            '\'' => self.parse_literal_string().map(Value::String),
            '[' => self.parse_array(),
            '{' => self.parse_inline_table(),
            _ => self.parse_scalar(),
        }
    }

    fn parse_basic_string(&mut self) -> Option<String> {
        if self.starts_with("\"\"\"") {
            self.pos += 3;
            let mut out = String::new();
            while !self.starts_with("\"\"\"") {
                out.push(self.peek()?);
                self.bump();
            }
            self.pos += 3;
            return Some(out.strip_prefix('\n').map(str::to_string).unwrap_or(out));
        }

        self.bump();
        let mut out = String::new();
        loop {
            let c = self.peek()?;
            self.bump();
            match c {
                '"' => return Some(out),
                '\\' => {
                    let escaped = self.peek()?;
                    self.bump();
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        'u' => {
                            let hex: String = self.chars.get(self.pos..self.pos + 4)?.iter().collect();
                            self.pos += 4;
                            out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn parse_literal_string(&mut self) -> Option<String> {
        if self.starts_with("'''") {
            self.pos += 3;
            let mut out = String::new();
            while !self.starts_with("'''") {
                out.push(self.peek()?);
                self.bump();
            }
            self.pos += 3;
            return Some(out.strip_prefix('\n').map(str::to_string).unwrap_or(out));
        }

        self.bump();
        let mut out = String::new();
        loop {
            let c = self.peek()?;
            self.bump();
            if c == '\'' {
                return Some(out);
            }
            out.push(c);
        }
    }

    fn parse_array(&mut self) -> Option<Value> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek()? == ']' {
                self.bump();
                return Some(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek()? {
                ',' => self.bump(),
                ']' => {}
                _ => return None,
            }
        }
    }

    fn parse_inline_table(&mut self) -> Option<Value> {
        self.bump();
        let mut table = Map::new();
        loop {
            self.skip_ws();
            if self.peek()? == '}' {
                self.bump();
                return Some(Value::Object(table));
            }

            let mut path = Vec::new();
            loop {
                self.skip_inline_ws();
                path.push(self.parse_key()?);
                self.skip_inline_ws();
                if self.peek()? == '.' {
                    self.bump();
                } else {
                    break;
                }
            }
            if self.peek()? != '=' {
                return None;
            }
            self.bump();
            let value = self.parse_value()?;
            let (last, parents) = path.split_last()?;
            let target = table_at(&mut table, parents)?;
            target.insert(last.clone(), value);

            self.skip_ws();
            match self.peek()? {
                ',' => self.bump(),
                '}' => {}
                _ => return None,
            }
        }
    }

    fn parse_scalar(&mut self) -> Option<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !matches!(c, ',' | ']' | '}') && !c.is_whitespace()) {
            self.bump();
        }
        // Date-times may contain one space between date and time
        if self.peek() == Some(' ')
            && self.chars.get(self.pos + 1).is_some_and(char::is_ascii_digit)
            && self.chars[start..self.pos].contains(&'-')
        {
            self.bump();
            while matches!(self.peek(), Some(c) if !matches!(c, ',' | ']' | '}') && !c.is_whitespace()) {
                self.bump();
            }
        }
        let token: String = self.chars[start..self.pos].iter().collect();

        match token.as_str() {
            "" => None,
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => {
                let digits = token.replace('_', "");
                if let Ok(n) = digits.parse::<i64>() {
                    return Some(Value::Number(n.into()));
                }
                if let Some(n) = digits.parse::<f64>().ok().and_then(Number::from_f64) {
                    return Some(Value::Number(n));
                }
                // Offset/local date-times are kept verbatim
                token
                    .starts_with(|c: char| c.is_ascii_digit())
                    .then(|| Value::String(token.clone()))
            }
        }
    }
}
