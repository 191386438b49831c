//! Input sanitizing for free text and email fields.
//!
//! # Responsibilities
//! - Trim surrounding whitespace
//! - Escape HTML-significant characters so stored or echoed text cannot inject markup
//! - Strip characters that could split an email header (CR, LF, TAB, other controls)
//!
//! Syntax checks are not done here; see `submissions::validation`.

/// Characters removed from both ends of every field: ASCII space, tab,
/// newline, carriage return, NUL and vertical tab. Unicode spaces are kept.
fn is_trimmed(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#039;"),
        _ => out.push(c),
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` as HTML entities.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Trim and HTML-escape a free-text field.
pub fn sanitize_text(input: &str) -> String {
    escape_html(input.trim_matches(is_trimmed))
}

/// Trim an email field, drop CR/LF/TAB and every other control character,
/// then HTML-escape what is left.
pub fn sanitize_email(input: &str) -> String {
    let trimmed = input.trim_matches(is_trimmed);
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        // U+0000..=U+001F and U+007F; covers \r \n \t as well.
        if c.is_ascii_control() {
            continue;
        }
        push_escaped(&mut out, c);
    }
    out
}
