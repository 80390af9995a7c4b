//! Backslash-escape handling for wire-format string operands.
//!
//! The recognized escapes are `\\ \' \" \a \b \f \n \r \t \v \0` and
//! `\uXXXX`. Escapes are purely a load-time concern: the metacompiler copies
//! escape sequences through from grammar source to emitted text verbatim, and
//! they collapse to the characters they denote only when the emitted program
//! is loaded for execution.

use crate::errors::ParseErrorKind;

/// Unescapes the raw body of a quoted string (quotes already stripped).
///
/// # Errors
/// Returns an error for an unknown escape tag, a truncated escape, or a
/// `\uXXXX` sequence that is malformed or names an invalid scalar value.
pub(crate) fn unescape(raw: &str) -> Result<String, ParseErrorKind> {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        let tag = chars
            .next()
            .ok_or(ParseErrorKind::UnexpectedEof { expected: "an escape character" })?;
        match tag {
            '\\' => text.push('\\'),
            '\'' => text.push('\''),
            '"' => text.push('"'),
            'a' => text.push('\u{0007}'),
            'b' => text.push('\u{0008}'),
            'f' => text.push('\u{000c}'),
            'n' => text.push('\n'),
            'r' => text.push('\r'),
            't' => text.push('\t'),
            'v' => text.push('\u{000b}'),
            '0' => text.push('\0'),
            'u' => text.push(unescape_unicode(&mut chars)?),
            other => return Err(ParseErrorKind::UnknownEscape(other)),
        }
    }
    Ok(text)
}

fn unescape_unicode(chars: &mut core::str::Chars<'_>) -> Result<char, ParseErrorKind> {
    let mut digits = String::with_capacity(4);
    for _ in 0..4 {
        match chars.next() {
            Some(ch) => digits.push(ch),
            None => return Err(ParseErrorKind::InvalidUnicodeEscape(digits)),
        }
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or(ParseErrorKind::InvalidUnicodeEscape(digits))
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::unescape;
    use crate::errors::ParseErrorKind;

    #[rstest]
    #[case("plain", "plain")]
    #[case(r"a\tb", "a\tb")]
    #[case(r#"\\\'\""#, "\\'\"")]
    #[case(r"\a\b\f\n\r\v\0", "\u{7}\u{8}\u{c}\n\r\u{b}\0")]
    #[case(r" \t\n\r\u000b\u000c", " \t\n\r\u{b}\u{c}")]
    #[case(r"\u0041\u00e9", "A\u{e9}")]
    fn recognized_escapes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(unescape(raw).unwrap(), expected);
    }

    #[test]
    fn unknown_escape_is_rejected() {
        assert!(matches!(unescape(r"\q").unwrap_err(), ParseErrorKind::UnknownEscape('q')));
    }

    #[test]
    fn truncated_unicode_escape_is_rejected() {
        assert!(matches!(
            unescape(r"\u00").unwrap_err(),
            ParseErrorKind::InvalidUnicodeEscape(_)
        ));
        assert!(matches!(
            unescape(r"\uzzzz").unwrap_err(),
            ParseErrorKind::InvalidUnicodeEscape(_)
        ));
    }

    #[test]
    fn surrogate_scalar_is_rejected() {
        assert!(matches!(
            unescape(r"\ud800").unwrap_err(),
            ParseErrorKind::InvalidUnicodeEscape(_)
        ));
    }
}
