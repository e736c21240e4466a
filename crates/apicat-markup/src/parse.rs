use apicat_core::{CatalogId, IdParseError};
use thiserror::Error;

use crate::markup::{Markup, MarkupPart, MarkupPartKind};

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("unknown markup element <{0}>")]
    UnknownElement(String),
    #[error("markup element <{0}> must not contain other elements")]
    NestedElement(String),
    #[error("invalid reference id {value:?}: {source}")]
    InvalidReference {
        value: String,
        #[source]
        source: IdParseError,
    },
}

const ROOT: &str = "markup";

impl Markup {
    /// Parses markup source text.
    ///
    /// Text inside `p`/`k`/`n`/`s`/`r` elements becomes one fragment of the
    /// matching kind. Character data between elements is split into
    /// identifier runs and whitespace; each line break (CR, LF or CRLF) turns
    /// into a single `"\n"` fragment and every other whitespace character into
    /// its own fragment.
    pub fn parse(text: &str) -> Result<Markup, MarkupError> {
        let wrapped = format!("<{ROOT}>{text}</{ROOT}>");
        let doc = roxmltree::Document::parse(&wrapped)?;

        let mut parts = Vec::new();
        for node in doc.root_element().children() {
            if node.is_element() {
                parts.push(parse_element(node)?);
            } else if node.is_text() {
                tokenize_character_data(node.text().unwrap_or_default(), &mut parts);
            }
        }

        Ok(Markup::new(parts))
    }
}

fn parse_element(node: roxmltree::Node<'_, '_>) -> Result<MarkupPart, MarkupError> {
    let name = node.tag_name().name();
    let kind = match name {
        "p" => MarkupPartKind::Punctuation,
        "k" => MarkupPartKind::Keyword,
        "n" => MarkupPartKind::LiteralNumber,
        "s" => MarkupPartKind::LiteralString,
        "r" => MarkupPartKind::Reference,
        other => return Err(MarkupError::UnknownElement(other.to_string())),
    };

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            return Err(MarkupError::NestedElement(name.to_string()));
        }
        if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let reference = match (kind, node.attribute("i")) {
        (MarkupPartKind::Reference, Some(value)) => {
            Some(CatalogId::parse(value).map_err(|source| MarkupError::InvalidReference {
                value: value.to_string(),
                source,
            })?)
        }
        _ => None,
    };

    Ok(MarkupPart {
        kind,
        text,
        reference,
    })
}

fn tokenize_character_data(text: &str, parts: &mut Vec<MarkupPart>) {
    let mut chars = text.char_indices().peekable();
    let mut run_start: Option<usize> = None;

    while let Some((index, c)) = chars.next() {
        if !c.is_whitespace() {
            run_start.get_or_insert(index);
            continue;
        }

        if let Some(start) = run_start.take() {
            parts.push(MarkupPart::new(MarkupPartKind::Identifier, &text[start..index]));
        }

        match c {
            '\r' => {
                chars.next_if(|&(_, next)| next == '\n');
                parts.push(MarkupPart::line_break());
            }
            '\n' => parts.push(MarkupPart::line_break()),
            c => parts.push(MarkupPart::new(MarkupPartKind::Whitespace, c.to_string())),
        }
    }

    if let Some(start) = run_start {
        parts.push(MarkupPart::new(MarkupPartKind::Identifier, &text[start..]));
    }
}
