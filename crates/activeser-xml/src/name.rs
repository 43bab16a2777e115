// SPDX-License-Identifier: MIT OR Apache-2.0
//! XML 1.0 name validity and the five reserved-character entities.
//!
//! Name-start/name-char rules are the ASCII subset of XML 1.0 plus any
//! Unicode alphabetic character, rather than the full combining/extender
//! range tables — close enough for well-formed documents in practice,
//! and far smaller than reproducing the XML 1.0 annex verbatim.

use activeser_error::{Code, ParseError, Result};

fn is_name_start(c: char) -> bool {
    c == '_' || c == ':' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || c == '\u{B7}'
}

/// Validate `name` against XML 1.0 name-start/name-char rules.
///
/// # Errors
///
/// Returns [`Code::BadName`] if `name` is empty or contains an invalid
/// character.
pub fn validate(name: &str) -> Result<()> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => {}
        _ => return Err(ParseError::new(Code::BadName, format!("\"{name}\" is not a valid XML name"))),
    }
    if chars.any(|c| !is_name_char(c)) {
        return Err(ParseError::new(Code::BadName, format!("\"{name}\" contains an invalid character")));
    }
    Ok(())
}

/// Split `prefix:local` into an optional namespace prefix and the local
/// name.
#[must_use]
pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Join a namespace prefix and local name back into `prefix:local`.
#[must_use]
pub fn join_prefix(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Escape the five reserved characters with their named entities. The
/// writer always uses the named forms, never numeric character
/// references, per spec.md §4.5.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolve an entity body (the text between `&` and `;`, exclusive) to
/// its character.
///
/// # Errors
///
/// Returns [`Code::UnknownEscapeChar`] for an unrecognised entity name or
/// an unparseable character reference, and [`Code::BadEncoding`] when a
/// reference decodes to a value outside valid Unicode.
pub fn resolve_entity(body: &str) -> Result<char> {
    match body {
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "amp" => Ok('&'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        s if s.starts_with("#x") || s.starts_with("#X") => {
            let code = u32::from_str_radix(&s[2..], 16)
                .map_err(|_| ParseError::new(Code::UnknownEscapeChar, format!("bad hex character reference &{s};")))?;
            char::from_u32(code)
                .ok_or_else(|| ParseError::new(Code::BadEncoding, format!("character reference &{s}; is not valid Unicode")))
        }
        s if s.starts_with('#') => {
            let code: u32 = s[1..]
                .parse()
                .map_err(|_| ParseError::new(Code::UnknownEscapeChar, format!("bad decimal character reference &{s};")))?;
            char::from_u32(code)
                .ok_or_else(|| ParseError::new(Code::BadEncoding, format!("character reference &{s}; is not valid Unicode")))
        }
        other => Err(ParseError::new(Code::UnknownEscapeChar, format!("unknown entity &{other};"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_accepted() {
        assert!(validate("shape").is_ok());
        assert!(validate("_private").is_ok());
        assert!(validate("ns:local").is_ok());
        assert!(validate("a-b.c1").is_ok());
    }

    #[test]
    fn names_starting_with_digit_rejected() {
        assert!(validate("1abc").is_err());
        assert!(validate("").is_err());
    }

    #[test]
    fn split_and_join_prefix_round_trip() {
        assert_eq!(split_prefix("ns:tag"), (Some("ns"), "tag"));
        assert_eq!(split_prefix("tag"), (None, "tag"));
        assert_eq!(join_prefix(Some("ns"), "tag"), "ns:tag");
        assert_eq!(join_prefix(None, "tag"), "tag");
    }

    #[test]
    fn escape_text_covers_all_five_reserved_characters() {
        assert_eq!(escape_text("a<b>c&d\"e'f"), "a&lt;b&gt;c&amp;d&quot;e&apos;f");
    }

    #[test]
    fn resolve_entity_handles_named_and_numeric_forms() {
        assert_eq!(resolve_entity("amp").unwrap(), '&');
        assert_eq!(resolve_entity("#65").unwrap(), 'A');
        assert_eq!(resolve_entity("#x41").unwrap(), 'A');
        assert!(resolve_entity("bogus").is_err());
    }
}
