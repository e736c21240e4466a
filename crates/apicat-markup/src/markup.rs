use std::fmt;

use apicat_core::{CatalogId, IdHasher};
use serde::{Deserialize, Serialize};

use crate::token::MarkupTokenKind;

/// Kind of a markup fragment.
///
/// The discriminants are persisted in the catalog's markup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MarkupPartKind {
    Whitespace = 0,
    LiteralNumber = 1,
    LiteralString = 2,
    Punctuation = 3,
    Keyword = 4,
    Reference = 5,
    Identifier = 6,
}

impl MarkupPartKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => MarkupPartKind::Whitespace,
            1 => MarkupPartKind::LiteralNumber,
            2 => MarkupPartKind::LiteralString,
            3 => MarkupPartKind::Punctuation,
            4 => MarkupPartKind::Keyword,
            5 => MarkupPartKind::Reference,
            6 => MarkupPartKind::Identifier,
            _ => return None,
        })
    }

    pub(crate) fn element_name(self) -> Option<&'static str> {
        match self {
            MarkupPartKind::Punctuation => Some("p"),
            MarkupPartKind::Keyword => Some("k"),
            MarkupPartKind::LiteralNumber => Some("n"),
            MarkupPartKind::LiteralString => Some("s"),
            MarkupPartKind::Reference => Some("r"),
            MarkupPartKind::Whitespace | MarkupPartKind::Identifier => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkupPart {
    pub kind: MarkupPartKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<CatalogId>,
}

impl MarkupPart {
    pub fn new(kind: MarkupPartKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            reference: None,
        }
    }

    pub fn reference(text: impl Into<String>, target: Option<CatalogId>) -> Self {
        Self {
            kind: MarkupPartKind::Reference,
            text: text.into(),
            reference: target,
        }
    }

    pub fn space() -> Self {
        Self::new(MarkupPartKind::Whitespace, " ")
    }

    pub fn line_break() -> Self {
        Self::new(MarkupPartKind::Whitespace, "\n")
    }

    pub fn is_line_break(&self) -> bool {
        self.kind == MarkupPartKind::Whitespace && self.text == "\n"
    }

    /// Fine-grained token classification of this fragment.
    pub fn token_kind(&self) -> MarkupTokenKind {
        match self.kind {
            MarkupPartKind::Whitespace if self.is_line_break() => MarkupTokenKind::LineBreak,
            MarkupPartKind::Whitespace => MarkupTokenKind::Space,
            MarkupPartKind::LiteralString => MarkupTokenKind::LiteralString,
            MarkupPartKind::LiteralNumber => MarkupTokenKind::LiteralNumber,
            MarkupPartKind::Reference | MarkupPartKind::Identifier => {
                MarkupTokenKind::ReferenceToken
            }
            MarkupPartKind::Punctuation => {
                MarkupTokenKind::punctuation(&self.text).unwrap_or(MarkupTokenKind::None)
            }
            MarkupPartKind::Keyword => {
                MarkupTokenKind::keyword(&self.text).unwrap_or(MarkupTokenKind::None)
            }
        }
    }
}

/// An ordered sequence of markup fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup {
    parts: Vec<MarkupPart>,
}

impl Markup {
    pub fn new(parts: Vec<MarkupPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[MarkupPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<MarkupPart> {
        self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Content fingerprint over the ordered (kind, text, reference) tuples.
    ///
    /// Each part contributes its kind tag, the length-prefixed UTF-8 text and a
    /// presence byte followed by the 16 raw reference bytes when a target is
    /// set, so no two distinct part sequences share an encoding.
    pub fn fingerprint(&self) -> CatalogId {
        let mut hasher = IdHasher::new();
        for part in &self.parts {
            hasher.update(&[part.kind as u8]);
            hasher.update(&(part.text.len() as u32).to_le_bytes());
            hasher.update(part.text.as_bytes());
            match &part.reference {
                Some(id) => {
                    hasher.update(&[1]);
                    hasher.update(id.as_bytes());
                }
                None => hasher.update(&[0]),
            }
        }
        hasher.finish()
    }

    /// Serializes back into the markup source dialect accepted by [`Markup::parse`].
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part.kind.element_name() {
                None => escape_into(&mut out, &part.text),
                Some(name) => {
                    out.push('<');
                    out.push_str(name);
                    if let Some(id) = &part.reference {
                        out.push_str(" i=\"");
                        out.push_str(&id.to_string());
                        out.push('"');
                    }
                    out.push('>');
                    escape_into(&mut out, &part.text);
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
        out
    }
}

impl From<Vec<MarkupPart>> for Markup {
    fn from(parts: Vec<MarkupPart>) -> Self {
        Self::new(parts)
    }
}

/// Plain text of the markup, fragments concatenated.
impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            f.write_str(&part.text)?;
        }
        Ok(())
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}
