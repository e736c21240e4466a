//! Structured declaration markup.
//!
//! A [`Markup`] is the tokenized, source-like rendering of one API's
//! declaration (`public static string Trim(this string s)`), stored as an
//! ordered list of typed fragments. Fragments carry enough structure for
//! consumers to colorize, hyperlink (cross-references carry the target API id)
//! and re-indent without re-parsing text.
//!
//! The textual source form is a tiny XML dialect:
//!
//! | element | fragment kind |
//! |---|---|
//! | `<p>` | punctuation |
//! | `<k>` | keyword |
//! | `<n>` | number literal |
//! | `<s>` | string literal |
//! | `<r i="id">` | cross-reference (optional target id) |
//! | character data | identifiers and whitespace |

mod markup;
mod nest;
mod parse;
mod token;

pub use markup::{Markup, MarkupPart, MarkupPartKind};
pub use nest::nest;
pub use parse::MarkupError;
pub use token::MarkupTokenKind;

/// Indentation injected per nesting level by [`nest`].
pub const INDENT_WIDTH: usize = 4;
