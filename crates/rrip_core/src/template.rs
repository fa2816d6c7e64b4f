use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Rendered values treated as "false" by template filters.
const FALSY: &[&str] = &["", "nil", "false", "0"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
    #[error("empty placeholder at byte {0}")]
    EmptyField(usize),
    #[error("unsupported placeholder `{{{{{action}}}}}` at byte {at}: only {{{{field}}}} is allowed")]
    Unsupported { at: usize, action: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A line template with `{{field}}` placeholders (`{{.field}}` is accepted too).
///
/// Any other action is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with `lookup` supplying field values; unknown fields render empty.
    pub fn render<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => out.push_str(&lookup(name).unwrap_or_default()),
            }
        }
        out
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let action = after_open[..end].trim();
            let name = action.strip_prefix('.').unwrap_or(action);
            if action.is_empty() {
                return Err(TemplateError::EmptyField(offset + start));
            }
            if !is_field_name(name) {
                return Err(TemplateError::Unsupported {
                    at: offset + start,
                    action: action.to_string(),
                });
            }
            segments.push(Segment::Field(name.to_string()));
            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Control words of Go-style templates; never field names here.
const KEYWORDS: &[&str] = &[
    "if", "else", "end", "range", "with", "define", "template", "block", "break", "continue",
];

/// `score`, `over_18`: what a post record can be looked up by.
fn is_field_name(name: &str) -> bool {
    if KEYWORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_falsy(rendered: &str) -> bool {
    FALSY.contains(&rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(field: &str) -> Option<String> {
        match field {
            "id" => Some("abc".into()),
            "score" => Some("12".into()),
            _ => None,
        }
    }

    #[test]
    fn renders_fields_and_literals() {
        let template: Template = "[{{id}}] {{ .score }} pts {{missing}}!".parse().unwrap();
        assert_eq!(template.render(lookup), "[abc] 12 pts !");
        assert_eq!(template.to_string(), "[{{id}}] {{ .score }} pts {{missing}}!");
    }

    #[test]
    fn rejects_broken_placeholders() {
        assert_eq!("a {{id".parse::<Template>(), Err(TemplateError::Unterminated(2)));
        assert_eq!("{{ }}".parse::<Template>(), Err(TemplateError::EmptyField(0)));
    }

    #[test]
    fn rejects_actions_other_than_fields() {
        assert_eq!(
            "{{if gt .score 100}}yes{{end}}".parse::<Template>(),
            Err(TemplateError::Unsupported {
                at: 0,
                action: "if gt .score 100".into()
            })
        );
        for source in ["x {{.data.score}}", "{{ . }}", "{{score | printf}}", "{{1abc}}"] {
            assert!(
                matches!(source.parse::<Template>(), Err(TemplateError::Unsupported { .. })),
                "{source}"
            );
        }
        assert!(matches!(
            "{{end}}".parse::<Template>(),
            Err(TemplateError::Unsupported { .. })
        ));
        let err = "{{id}}{{ .a b }}".parse::<Template>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported placeholder `{{.a b}}` at byte 6: only {{field}} is allowed"
        );
    }

    #[test]
    fn falsy_values() {
        for value in ["", "nil", "false", "0"] {
            assert!(is_falsy(value));
        }
        assert!(!is_falsy("true"));
        assert!(!is_falsy(" "));
    }
}
