// SPDX-License-Identifier: MIT OR Apache-2.0
//! Low-level token scanning shared by the reader: names, attributes,
//! text content, comments, processing instructions and CDATA sections.

use activeser_buffer::{BufferIn, FoundPolicy, Source};
use activeser_error::{Code, ParseError, Result};

use crate::name::{resolve_entity, validate};

const NAME_CHARS: &str = ":_.-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn skip_ws<S: Source>(buf: &mut BufferIn<S>) -> Result<()> {
    buf.find_if(char::is_whitespace)?;
    Ok(())
}

pub fn expect_char<S: Source>(buf: &mut BufferIn<S>, expected: char) -> Result<()> {
    match buf.get()? {
        Some(c) if c == expected => Ok(()),
        Some(c) => Err(ParseError::new(Code::ParsingError, format!("expected '{expected}', found '{c}'")).at(buf.position())),
        None => Err(ParseError::new(Code::IncompleteContext, format!("expected '{expected}', found end of input")).at(buf.position())),
    }
}

/// Read a run of name characters (caller has already checked the first
/// is name-start via [`crate::name::validate`] once the full name is
/// collected).
pub fn read_name<S: Source>(buf: &mut BufferIn<S>) -> Result<String> {
    let name = buf.find_if(|c| c.is_alphanumeric() || NAME_CHARS.contains(c))?;
    if name.is_empty() {
        return Err(ParseError::new(Code::MissingTagName, "expected a name").at(buf.position()));
    }
    validate(&name).map_err(|e| ParseError::new(e.code, e.message).at(buf.position()))?;
    Ok(name)
}

/// Consume raw character data up to (not including) the next structural
/// `<` (a start/end/PI tag), resolving entity references and absorbing
/// comments and CDATA sections transparently as they're encountered.
pub fn read_text_content<S: Source>(buf: &mut BufferIn<S>) -> Result<String> {
    let mut out = String::new();
    loop {
        match buf.peek()? {
            None => break,
            Some('<') => {
                buf.get()?;
                if buf.peek()? != Some('!') {
                    buf.rewind(1)?;
                    break;
                }
                buf.get()?;
                if consume_literal(buf, "--")? {
                    skip_until(buf, "-->")?;
                } else if consume_literal(buf, "[CDATA[")? {
                    out.push_str(&read_until_literal(buf, "]]>")?);
                } else {
                    return Err(ParseError::new(Code::UnknownSection, "unrecognised \"<!\" section").at(buf.position()));
                }
            }
            Some('&') => {
                buf.get()?;
                let body = buf.find(';', FoundPolicy::Consumed)?;
                out.push(resolve_entity(&body).map_err(|e| e.at(buf.position()))?);
            }
            Some(c) => {
                buf.get()?;
                out.push(c);
            }
        }
    }
    Ok(out)
}

/// Try to consume exactly `literal`, character by character. On a
/// mismatch, rewinds whatever prefix was already consumed so the buffer
/// is left exactly as found.
pub fn consume_literal<S: Source>(buf: &mut BufferIn<S>, literal: &str) -> Result<bool> {
    for (consumed, expected) in literal.chars().enumerate() {
        match buf.peek()? {
            Some(c) if c == expected => {
                buf.get()?;
            }
            _ => {
                buf.rewind(consumed)?;
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Skip forward until the literal `terminator` has been fully consumed
/// (used for `-->`, `?>`).
pub fn skip_until<S: Source>(buf: &mut BufferIn<S>, terminator: &str) -> Result<()> {
    read_until_literal(buf, terminator).map(|_| ())
}

/// Read forward, retaining everything seen, until the literal
/// `terminator` has been fully consumed (used for CDATA bodies, whose raw
/// text must be kept rather than discarded).
pub fn read_until_literal<S: Source>(buf: &mut BufferIn<S>, terminator: &str) -> Result<String> {
    let term: Vec<char> = terminator.chars().collect();
    let mut window: Vec<char> = Vec::with_capacity(term.len());
    let mut out = String::new();
    loop {
        let Some(c) = buf.get()? else {
            return Err(ParseError::new(Code::UnboundedTag, format!("unterminated section, expected \"{terminator}\""))
                .at(buf.position()));
        };
        window.push(c);
        if window.len() > term.len() {
            out.push(window.remove(0));
        }
        if window.len() == term.len() && window == term {
            return Ok(out);
        }
    }
}

/// One parsed start/empty tag: its name, its attributes in source order,
/// and whether it self-closed (`/>`).
#[derive(Debug, Clone)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Parse a start or empty tag, the opening `<` already consumed.
pub fn parse_start_tag<S: Source>(buf: &mut BufferIn<S>) -> Result<StartTag> {
    let name = read_name(buf)?;
    let mut attributes = Vec::new();
    loop {
        skip_ws(buf)?;
        match buf.peek()? {
            Some('/') => {
                buf.get()?;
                match buf.get()? {
                    Some('>') => return Ok(StartTag { name, attributes, self_closing: true }),
                    _ => return Err(ParseError::new(Code::UnboundedTag, "expected '>' after '/'").at(buf.position())),
                }
            }
            Some('>') => {
                buf.get()?;
                return Ok(StartTag { name, attributes, self_closing: false });
            }
            Some(_) => {
                let attr_name = read_name(buf)?;
                skip_ws(buf)?;
                match buf.get()? {
                    Some('=') => {}
                    _ => return Err(ParseError::new(Code::AttributeEqualMissing, format!("attribute \"{attr_name}\" has no value"))
                        .at(buf.position())),
                }
                skip_ws(buf)?;
                let quote = match buf.get()? {
                    Some(q @ ('"' | '\'')) => q,
                    _ => return Err(ParseError::new(Code::AttributeQuoteMissing, format!("attribute \"{attr_name}\" value is not quoted"))
                        .at(buf.position())),
                };
                let value = read_quoted_value(buf, quote)?;
                attributes.push((attr_name, value));
            }
            None => return Err(ParseError::new(Code::UnboundedTag, "tag never closed").at(buf.position())),
        }
    }
}

fn read_quoted_value<S: Source>(buf: &mut BufferIn<S>, quote: char) -> Result<String> {
    let mut out = String::new();
    loop {
        match buf.get()? {
            Some(c) if c == quote => return Ok(out),
            Some('&') => {
                let body = buf.find(';', FoundPolicy::Consumed)?;
                out.push(resolve_entity(&body).map_err(|e| e.at(buf.position()))?);
            }
            Some(c) => out.push(c),
            None => return Err(ParseError::new(Code::AttributeQuoteMissing, "attribute value never closed").at(buf.position())),
        }
    }
}

/// Parse an end tag, the opening `</` already consumed, returning its
/// name.
pub fn parse_end_tag<S: Source>(buf: &mut BufferIn<S>) -> Result<String> {
    let name = read_name(buf)?;
    skip_ws(buf)?;
    match buf.get()? {
        Some('>') => Ok(name),
        _ => Err(ParseError::new(Code::ClosingTagMissing, format!("end tag \"{name}\" never closed")).at(buf.position())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &str) -> BufferIn<&[u8]> {
        BufferIn::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn parses_simple_start_tag() {
        let mut b = buf("tag>");
        let tag = parse_start_tag(&mut b).unwrap();
        assert_eq!(tag.name, "tag");
        assert!(tag.attributes.is_empty());
        assert!(!tag.self_closing);
    }

    #[test]
    fn parses_attributes_and_self_close() {
        let mut b = buf(r#"tag id="7" label='hi' />"#);
        let tag = parse_start_tag(&mut b).unwrap();
        assert_eq!(tag.name, "tag");
        assert_eq!(tag.attributes, vec![("id".to_string(), "7".to_string()), ("label".to_string(), "hi".to_string())]);
        assert!(tag.self_closing);
    }

    #[test]
    fn reads_text_with_entities() {
        let mut b = buf("a &amp; b &lt;<");
        assert_eq!(read_text_content(&mut b).unwrap(), "a & b <");
    }

    #[test]
    fn skip_until_handles_overlapping_runs() {
        let mut b = buf("foo--->rest");
        skip_until(&mut b, "-->").unwrap();
        assert_eq!(buf_rest(&mut b), "rest");
    }

    fn buf_rest(b: &mut BufferIn<&[u8]>) -> String {
        b.find_if(|_| true).unwrap()
    }
}
