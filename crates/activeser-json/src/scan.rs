// SPDX-License-Identifier: MIT OR Apache-2.0
//! Low-level token scanning shared by the reader and the skip-unknown
//! path: whitespace, literals, strings, numbers.

use activeser_buffer::{BufferIn, Source};
use activeser_core::Value;
use activeser_error::{Code, ParseError, Result};

const WHITESPACE: &str = " \t\r\n";

pub fn skip_ws<S: Source>(buf: &mut BufferIn<S>) -> Result<()> {
    buf.find_if(|c| WHITESPACE.contains(c))?;
    Ok(())
}

pub fn peek<S: Source>(buf: &mut BufferIn<S>) -> Result<Option<char>> {
    buf.peek()
}

pub fn get<S: Source>(buf: &mut BufferIn<S>) -> Result<Option<char>> {
    buf.get()
}

pub fn expect_char<S: Source>(buf: &mut BufferIn<S>, expected: char) -> Result<()> {
    match buf.get()? {
        Some(c) if c == expected => Ok(()),
        Some(c) => Err(ParseError::new(
            Code::ParsingError,
            format!("expected '{expected}', found '{c}'"),
        )
        .at(buf.position())),
        None => Err(ParseError::new(
            Code::IncompleteContext,
            format!("expected '{expected}', found end of input"),
        )
        .at(buf.position())),
    }
}

/// Parse a JSON string body, the opening `"` already consumed.
pub fn parse_string_body<S: Source>(buf: &mut BufferIn<S>) -> Result<String> {
    let mut out = String::new();
    loop {
        let Some(c) = buf.get()? else {
            return Err(ParseError::new(Code::ClosingQuoteMissing, "unterminated string").at(buf.position()));
        };
        match c {
            '"' => return Ok(out),
            '\\' => {
                let Some(escape) = buf.get()? else {
                    return Err(ParseError::new(Code::ClosingQuoteMissing, "unterminated escape").at(buf.position()));
                };
                match escape {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '/' => out.push('/'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => out.push(parse_unicode_escape(buf)?),
                    other => {
                        return Err(ParseError::new(
                            Code::UnknownEscapeChar,
                            format!("unrecognised escape '\\{other}'"),
                        )
                        .at(buf.position()))
                    }
                }
            }
            _ => out.push(c),
        }
    }
}

/// Decode a `\uXXXX` escape into one UTF-16 code unit. The unit is *not*
/// paired with a following low surrogate even when one follows — the
/// reader treats each `\u` escape independently, per spec.md §4.4/§9(a).
/// A lone surrogate half has no valid Unicode scalar value, so — since a
/// Rust `String` cannot hold one — it is rendered as U+FFFD rather than
/// the original's ill-formed UTF-8 byte sequence.
fn parse_unicode_escape<S: Source>(buf: &mut BufferIn<S>) -> Result<char> {
    let mut digits = String::with_capacity(4);
    for _ in 0..4 {
        let Some(c) = buf.get()? else {
            return Err(ParseError::new(Code::UnknownEscapeChar, "truncated \\u escape").at(buf.position()));
        };
        digits.push(c);
    }
    let unit = u16::from_str_radix(&digits, 16)
        .map_err(|_| ParseError::new(Code::UnknownEscapeChar, format!("\"{digits}\" is not hex")).at(buf.position()))?;
    Ok(char::from_u32(unit as u32).unwrap_or('\u{FFFD}'))
}

/// Parse a bare (unquoted) value token: `true`, `false`, `null`, or a
/// number matching the integer/floating grammar.
pub fn parse_literal_or_number<S: Source>(buf: &mut BufferIn<S>) -> Result<Value> {
    let word = buf.find_if(|c| {
        c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | 't' | 'r' | 'u' | 'f' | 'a' | 'l' | 's' | 'n')
    })?;
    match word.as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        _ => parse_number(&word, buf),
    }
}

fn parse_number<S: Source>(word: &str, buf: &mut BufferIn<S>) -> Result<Value> {
    if word.is_empty() {
        return Err(ParseError::new(Code::ValueMissing, "expected a value").at(buf.position()));
    }
    let digits = word.strip_prefix('-').unwrap_or(word);
    let is_integer = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    if is_integer {
        if let Ok(n) = word.parse::<i64>() {
            return Ok(Value::Int(n));
        }
    }
    word.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ParseError::new(Code::BadValue, format!("\"{word}\" is not a number")).at(buf.position()))
}

/// Skip a complete JSON value of any shape, discarding its content. Used
/// when an incoming name has no matching inventory entry and the unknown
/// policy allows skipping.
pub fn skip_value<S: Source>(buf: &mut BufferIn<S>) -> Result<()> {
    skip_ws(buf)?;
    match peek(buf)? {
        Some('"') => {
            get(buf)?;
            parse_string_body(buf)?;
        }
        Some('{') => {
            get(buf)?;
            skip_ws(buf)?;
            if peek(buf)? == Some('}') {
                get(buf)?;
                return Ok(());
            }
            loop {
                skip_ws(buf)?;
                expect_char(buf, '"')?;
                parse_string_body(buf)?;
                skip_ws(buf)?;
                expect_char(buf, ':')?;
                skip_value(buf)?;
                skip_ws(buf)?;
                match get(buf)? {
                    Some(',') => continue,
                    Some('}') => break,
                    _ => {
                        return Err(ParseError::new(Code::UnbalancedScope, "expected ',' or '}'").at(buf.position()))
                    }
                }
            }
        }
        Some('[') => {
            get(buf)?;
            skip_ws(buf)?;
            if peek(buf)? == Some(']') {
                get(buf)?;
                return Ok(());
            }
            loop {
                skip_value(buf)?;
                skip_ws(buf)?;
                match get(buf)? {
                    Some(',') => continue,
                    Some(']') => break,
                    _ => {
                        return Err(ParseError::new(Code::UnbalancedScope, "expected ',' or ']'").at(buf.position()))
                    }
                }
            }
        }
        Some(_) => {
            parse_literal_or_number(buf)?;
        }
        None => {
            return Err(ParseError::new(Code::ValueMissing, "expected a value, found end of input").at(buf.position()))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &str) -> BufferIn<&[u8]> {
        BufferIn::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn parses_plain_string() {
        let mut b = buf("\"hi\"");
        expect_char(&mut b, '"').unwrap();
        assert_eq!(parse_string_body(&mut b).unwrap(), "hi");
    }

    #[test]
    fn parses_escapes() {
        let mut b = buf(r#""a\nb\tc\"d""#);
        expect_char(&mut b, '"').unwrap();
        assert_eq!(parse_string_body(&mut b).unwrap(), "a\nb\tc\"d");
    }

    #[test]
    fn lone_surrogate_escape_becomes_replacement_char() {
        let mut b = buf(r#""\ud800""#);
        expect_char(&mut b, '"').unwrap();
        assert_eq!(parse_string_body(&mut b).unwrap(), "\u{FFFD}");
    }

    #[test]
    fn parses_integer_and_float() {
        let mut b = buf("42");
        assert_eq!(parse_literal_or_number(&mut b).unwrap(), Value::Int(42));
        let mut b = buf("3.5");
        assert_eq!(parse_literal_or_number(&mut b).unwrap(), Value::Float(3.5));
        let mut b = buf("-7");
        assert_eq!(parse_literal_or_number(&mut b).unwrap(), Value::Int(-7));
    }

    #[test]
    fn skip_value_consumes_nested_object() {
        let mut b = buf(r#"{"a":[1,2,{"b":true}]} "#);
        skip_value(&mut b).unwrap();
        skip_ws(&mut b).unwrap();
        assert_eq!(peek(&mut b).unwrap(), None);
    }
}
