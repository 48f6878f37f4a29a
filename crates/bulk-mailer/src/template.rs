//! Message body templates
//!
//! Bodies use `{name}` placeholders with `{{` and `}}` as literal braces.
//! Templates are checked once when parsed, so a typo in a placeholder fails
//! before the first message is composed.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Escaped braces, a `{field}`, or a stray brace
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").unwrap();
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder {{{name}}} at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    #[error("Unbalanced brace at byte {offset}")]
    UnbalancedBrace { offset: usize },
}

/// Fields a body template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Row's `Mentor_Name`
    MentorName,
    /// Row's `Division`
    Division,
    SenderName,
    SenderTitle,
    /// Sender's organisation, not the row's
    Organisation,
}

impl Placeholder {
    pub const ALL: [Placeholder; 5] = [
        Placeholder::MentorName,
        Placeholder::Division,
        Placeholder::SenderName,
        Placeholder::SenderTitle,
        Placeholder::Organisation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::MentorName => "mentor_name",
            Placeholder::Division => "division",
            Placeholder::SenderName => "sender_name",
            Placeholder::SenderTitle => "sender_title",
            Placeholder::Organisation => "organisation",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Values substituted into a template for one message
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateValues<'a> {
    pub mentor_name: &'a str,
    pub division: &'a str,
    pub sender_name: &'a str,
    pub sender_title: &'a str,
    pub organisation: &'a str,
}

impl<'a> TemplateValues<'a> {
    fn get(&self, placeholder: Placeholder) -> &'a str {
        match placeholder {
            Placeholder::MentorName => self.mentor_name,
            Placeholder::Division => self.division,
            Placeholder::SenderName => self.sender_name,
            Placeholder::SenderTitle => self.sender_title,
            Placeholder::Organisation => self.organisation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN_PATTERN.captures_iter(source) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            literal.push_str(&source[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => {
                    return Err(TemplateError::UnbalancedBrace {
                        offset: token.start(),
                    })
                }
                _ => {
                    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let placeholder = Placeholder::from_name(name).ok_or_else(|| {
                        TemplateError::UnknownPlaceholder {
                            name: name.to_string(),
                            offset: token.start(),
                        }
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(placeholder));
                }
            }
        }

        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template text as given
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholders in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(p) => out.push_str(values.get(*p)),
            }
        }
        out
    }
}

impl std::str::FromStr for MessageTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
