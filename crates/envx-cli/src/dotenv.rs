//! Line-preserving `.env` documents.
//!
//! Only the value text of `KEY=VALUE` lines is ever rewritten. Comments,
//! blank lines, `export ` prefixes, spacing and quote style survive a
//! parse/render cycle byte for byte.
//!
//! Values are taken literally: surrounding quotes are stripped, nothing is
//! unescaped, and a `#` after the `=` is part of the value.
//!
//! Single quotes are stripped as well as double quotes. Older envx releases
//! only stripped double quotes and read `KEY='v'` as `'v'`, quotes included;
//! such values need re-setting if the quotes were meant to be kept.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;

/// Quote style of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    None,
    Single,
    Double,
}

impl Quote {
    fn as_char(self) -> Option<char> {
        match self {
            Quote::None => None,
            Quote::Single => Some('\''),
            Quote::Double => Some('"'),
        }
    }
}

/// A `KEY=VALUE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Everything before the value: indentation, `export `, key, `=`, spacing.
    head: String,
    key: String,
    value: String,
    quote: Quote,
    /// Whitespace after the value (including a trailing `\r`).
    tail: String,
}

impl Entry {
    fn new(key: &str, value: &str) -> Self {
        let mut entry = Self {
            head: format!("{key}="),
            key: key.to_string(),
            value: String::new(),
            quote: Quote::None,
            tail: String::new(),
        };
        entry.set_value(value);
        entry
    }

    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let eq = line.find('=')?;
        let (left, right) = (&line[..eq], &line[eq + 1..]);

        let key = left.trim();
        let key = key.strip_prefix("export ").map(str::trim_start).unwrap_or(key);
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }

        let body = right.trim_start();
        let head = &line[..line.len() - body.len()];
        let value = body.trim_end();
        let tail = &body[value.len()..];

        let quote = match value.chars().next() {
            Some('"') => Quote::Double,
            Some('\'') => Quote::Single,
            _ => Quote::None,
        };
        let value = match quote.as_char() {
            Some(q) if value.len() >= 2 && value.ends_with(q) => &value[1..value.len() - 1],
            _ => value,
        };
        let quote = if value.len() == body.trim_end().len() {
            Quote::None
        } else {
            quote
        };

        Some(Self {
            head: head.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            quote,
            tail: tail.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value with surrounding quotes removed.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn quote(&self) -> Quote {
        self.quote
    }

    /// Replace the value, keeping the existing quote style where possible.
    ///
    /// An unquoted value that would not survive re-parsing unquoted is
    /// switched to double quotes.
    pub fn set_value(&mut self, value: &str) {
        if self.quote == Quote::None && needs_quotes(value) {
            self.quote = Quote::Double;
        }
        self.value = value.to_string();
    }

    fn render(&self) -> String {
        match self.quote.as_char() {
            Some(q) => format!("{}{q}{}{q}{}", self.head, self.value, self.tail),
            None => format!("{}{}{}", self.head, self.value, self.tail),
        }
    }
}

fn needs_quotes(value: &str) -> bool {
    value.trim() != value || value.starts_with(['"', '\''])
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry(Entry),
    /// Comment, blank or unparseable line, kept verbatim.
    Raw(String),
}

/// A parsed `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    trailing_newline: bool,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        let (body, trailing_newline) = match content.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (content, false),
        };
        if content.is_empty() {
            return Self::default();
        }

        let lines = body
            .split('\n')
            .map(|line| match Entry::parse(line) {
                Some(entry) => Line::Entry(entry),
                None => Line::Raw(line.to_string()),
            })
            .collect();

        Self {
            lines,
            trailing_newline,
        }
    }

    /// Read and parse `path`. A missing file is an empty document.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|line| match line {
                Line::Entry(entry) => entry.render(),
                Line::Raw(raw) => raw.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            Line::Raw(_) => None,
        })
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.lines.iter_mut().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            Line::Raw(_) => None,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().any(|e| e.key == key)
    }

    /// Value of `key`. With duplicates the last assignment wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .filter(|e| e.key == key)
            .last()
            .map(Entry::value)
    }

    /// Effective variables in file order, later duplicates replacing earlier.
    pub fn vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = Vec::new();
        for entry in self.entries() {
            match vars.iter_mut().find(|(k, _)| *k == entry.key) {
                Some(slot) => slot.1 = entry.value.clone(),
                None => vars.push((entry.key.clone(), entry.value.clone())),
            }
        }
        vars
    }

    /// Update every assignment of `key`, or append a new line.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        validate_key(key)?;
        if value.contains(['\n', '\r']) {
            anyhow::bail!("value for {key} must be a single line");
        }

        let mut found = false;
        for entry in self.entries_mut().filter(|e| e.key == key) {
            entry.set_value(value);
            found = true;
        }
        if !found {
            self.lines.push(Line::Entry(Entry::new(key, value)));
            self.trailing_newline = true;
        }
        Ok(())
    }
}

/// Check that `key` can be written as a variable name.
pub fn validate_key(key: &str) -> anyhow::Result<()> {
    if key.is_empty() {
        anyhow::bail!("variable name must not be empty");
    }
    if key.starts_with('#') || key.contains(|c: char| c == '=' || c.is_whitespace()) {
        anyhow::bail!("invalid variable name: {key:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# database settings
DB_HOST=localhost
export DB_USER = admin
DB_PASS=\"s3cret value\"
  TOKEN='abc'

not a variable line
EMPTY=
";

    #[test]
    fn test_round_trip_preserves_bytes() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_round_trip_without_trailing_newline() {
        let content = "A=1\nB=2";
        assert_eq!(Document::parse(content).render(), content);
        assert_eq!(Document::parse("").render(), "");
    }

    #[test]
    fn test_crlf_preserved() {
        let content = "A=1\r\n# c\r\nB=\"two\"\r\n";
        let doc = Document::parse(content);
        assert_eq!(doc.get("A"), Some("1"));
        assert_eq!(doc.get("B"), Some("two"));
        assert_eq!(doc.render(), content);
    }

    #[test]
    fn test_values() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.get("DB_HOST"), Some("localhost"));
        assert_eq!(doc.get("DB_USER"), Some("admin"));
        assert_eq!(doc.get("DB_PASS"), Some("s3cret value"));
        assert_eq!(doc.get("TOKEN"), Some("abc"));
        assert_eq!(doc.get("EMPTY"), Some(""));
        assert_eq!(doc.get("not"), None);

        let keys: Vec<_> = doc.entries().map(Entry::key).collect();
        assert_eq!(keys, ["DB_HOST", "DB_USER", "DB_PASS", "TOKEN", "EMPTY"]);
    }

    #[test]
    fn test_quote_detection() {
        let doc = Document::parse("A=\"x\"\nB='y'\nC=z\nD=\"unterminated\nE=\"\n");
        let quotes: Vec<_> = doc.entries().map(Entry::quote).collect();
        assert_eq!(
            quotes,
            [Quote::Double, Quote::Single, Quote::None, Quote::None, Quote::None]
        );
        assert_eq!(doc.get("D"), Some("\"unterminated"));
        assert_eq!(doc.get("E"), Some("\""));
    }

    #[test]
    fn test_single_quotes_are_stripped() {
        let doc = Document::parse("A='quoted value'\nB=\"it's\"\nC='a\"b'\n");
        assert_eq!(doc.get("A"), Some("quoted value"));
        assert_eq!(doc.get("B"), Some("it's"));
        assert_eq!(doc.get("C"), Some("a\"b"));
    }

    #[test]
    fn test_set_existing_keeps_layout() {
        let mut doc = Document::parse(SAMPLE);
        doc.set("DB_USER", "root").unwrap();
        doc.set("DB_PASS", "ZW52eA").unwrap();
        doc.set("TOKEN", "xyz").unwrap();

        let rendered = doc.render();
        assert!(rendered.contains("export DB_USER = root\n"));
        assert!(rendered.contains("DB_PASS=\"ZW52eA\"\n"));
        assert!(rendered.contains("  TOKEN='xyz'\n"));
        assert!(rendered.starts_with("# database settings\n"));
        assert!(rendered.contains("\nnot a variable line\n"));
    }

    #[test]
    fn test_set_appends_new_key() {
        let mut doc = Document::parse("A=1");
        doc.set("B", "2").unwrap();
        assert_eq!(doc.render(), "A=1\nB=2\n");

        let mut empty = Document::default();
        empty.set("A", "with space ").unwrap();
        assert_eq!(empty.render(), "A=\"with space \"\n");
        assert_eq!(Document::parse(&empty.render()).get("A"), Some("with space "));
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut doc = Document::default();
        assert!(doc.set("", "v").is_err());
        assert!(doc.set("HAS SPACE", "v").is_err());
        assert!(doc.set("#COMMENT", "v").is_err());
        assert!(doc.set("A", "two\nlines").is_err());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_duplicates_last_wins() {
        let mut doc = Document::parse("A=1\nB=x\nA=2\n");
        assert_eq!(doc.get("A"), Some("2"));
        assert_eq!(
            doc.vars(),
            vec![
                ("A".to_string(), "2".to_string()),
                ("B".to_string(), "x".to_string())
            ]
        );

        doc.set("A", "3").unwrap();
        assert_eq!(doc.render(), "A=3\nB=x\nA=3\n");
    }

    #[test]
    fn test_value_with_hash_and_equals() {
        let doc = Document::parse("URL=postgres://u:p@h/db?x=1#frag\n");
        assert_eq!(doc.get("URL"), Some("postgres://u:p@h/db?x=1#frag"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let doc = Document::load(&tmp.path().join(".env")).unwrap();
        assert!(doc.is_empty());
    }
}
