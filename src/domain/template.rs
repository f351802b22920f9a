//! Message template with `{name}` placeholders.

use std::fmt;

use super::variables::VariableRow;

/// Failure to render a template for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// One or more placeholders have no key in the row.
    MissingVariable { names: Vec<String> },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MissingVariable { names } => {
                write!(f, "missing variables: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed message template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parse a template.
    ///
    /// A placeholder is `{` followed by one or more `[A-Za-z0-9_-]` characters
    /// and a closing `}`. Any other brace text is kept literally.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse_segments(&source);
        Self { source, segments }
    }

    /// Unique placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder with the row's value.
    pub fn render(&self, row: &VariableRow) -> Result<String, TemplateError> {
        let missing: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| row.get(name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingVariable { names: missing });
        }

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(row.get(name).unwrap_or_default()),
            }
        }
        Ok(out)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn parse_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with('}') {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(after[..name_len].to_string()));
            rest = &after[name_len + 1..];
        } else {
            literal.push('{');
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Whether `text` still contains placeholder syntax.
pub fn contains_placeholder(text: &str) -> bool {
    parse_segments(text).iter().any(|s| matches!(s, Segment::Placeholder(_)))
}
