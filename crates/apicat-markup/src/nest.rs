use crate::markup::{Markup, MarkupPart, MarkupPartKind};
use crate::INDENT_WIDTH;

/// Composes a chain of declarations, outermost first, into one block.
///
/// Every level after the first is wrapped in braces opened by its parent and
/// indented by [`INDENT_WIDTH`] spaces per level, including lines that follow
/// a line break inside a multi-line declaration. The result ends with a line
/// break after the last closing brace (or after the only declaration).
///
/// Each indentation is one whitespace fragment, while [`Markup::parse`] yields
/// one fragment per whitespace character, so reparsing the rendered source
/// only reproduces the fragments of an unindented (single-level) rendering.
pub fn nest<'a, I>(levels: I) -> Markup
where
    I: IntoIterator<Item = &'a Markup>,
{
    let mut parts = Vec::new();
    let mut depth = 0usize;

    for markup in levels {
        if depth > 0 {
            push_indent(&mut parts, depth - 1);
            parts.push(MarkupPart::new(MarkupPartKind::Punctuation, "{"));
            parts.push(MarkupPart::line_break());
        }

        let mut needs_indent = true;
        for part in markup.parts() {
            if needs_indent {
                push_indent(&mut parts, depth);
                needs_indent = false;
            }
            needs_indent = part.is_line_break();
            parts.push(part.clone());
        }
        parts.push(MarkupPart::line_break());

        depth += 1;
    }

    for level in (0..depth.saturating_sub(1)).rev() {
        push_indent(&mut parts, level);
        parts.push(MarkupPart::new(MarkupPartKind::Punctuation, "}"));
        parts.push(MarkupPart::line_break());
    }

    Markup::new(parts)
}

fn push_indent(parts: &mut Vec<MarkupPart>, depth: usize) {
    if depth > 0 {
        parts.push(MarkupPart::new(
            MarkupPartKind::Whitespace,
            " ".repeat(INDENT_WIDTH * depth),
        ));
    }
}
