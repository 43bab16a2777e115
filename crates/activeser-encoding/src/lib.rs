// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text-encoding primitives shared by the streaming buffers.
//!
//! Covers BOM detection/emission and character-level encode/decode for the
//! five encodings the wire formats support: UTF-8, UTF-16, UTF-32, ASCII,
//! and ISO-8859-1.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use activeser_error::{Code, ParseError};

// ---------------------------------------------------------------------------
// Encoding / DataFormat
// ---------------------------------------------------------------------------

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8, the default for both JSON and XML wire formats.
    Utf8,
    /// UTF-16, big- or little-endian per [`DataFormat::is_big_endian`].
    Utf16,
    /// UTF-32, big- or little-endian per [`DataFormat::is_big_endian`].
    Utf32,
    /// 7-bit ASCII.
    Ascii,
    /// ISO-8859-1 (Latin-1): one byte per code point, 0x00-0xFF.
    Iso8859_1,
}

/// `{encoding, isBigEndian, hasBOM}` triple describing how to read/write a
/// byte stream as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    /// The text encoding.
    pub encoding: Encoding,
    /// Byte ordering for multi-byte encodings (UTF-16/32). Ignored for
    /// UTF-8/ASCII/ISO-8859-1.
    pub is_big_endian: bool,
    /// Whether the stream is (or should be) preceded by a byte-order mark.
    pub has_bom: bool,
}

impl Default for DataFormat {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            is_big_endian: cfg!(target_endian = "big"),
            has_bom: false,
        }
    }
}

impl DataFormat {
    /// Construct a format for a given encoding, explicit about BOM and
    /// endianness.
    #[must_use]
    pub fn new(encoding: Encoding, has_bom: bool, is_big_endian: bool) -> Self {
        Self {
            encoding,
            is_big_endian,
            has_bom,
        }
    }

    /// The BOM signature for this format, if one is defined. ASCII and
    /// ISO-8859-1 have no BOM.
    #[must_use]
    pub fn to_bom(&self) -> Option<&'static [u8]> {
        match (self.encoding, self.is_big_endian) {
            (Encoding::Utf8, _) => Some(&[0xEF, 0xBB, 0xBF]),
            (Encoding::Utf16, true) => Some(&[0xFE, 0xFF]),
            (Encoding::Utf16, false) => Some(&[0xFF, 0xFE]),
            (Encoding::Utf32, true) => Some(&[0x00, 0x00, 0xFE, 0xFF]),
            (Encoding::Utf32, false) => Some(&[0xFF, 0xFE, 0x00, 0x00]),
            (Encoding::Ascii | Encoding::Iso8859_1, _) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BOM detection
// ---------------------------------------------------------------------------

/// Detect a BOM at the start of `bytes`, returning the resulting format and
/// the number of bytes the BOM itself occupies.
///
/// Testing order follows spec.md §3: UTF-8, UTF-16 BE, UTF-32 BE, UTF-32 LE,
/// then UTF-16 LE. UTF-32 LE must be tested *before* UTF-16 LE because
/// `FF FE 00 00` is a superset of the two-byte `FF FE` UTF-16 LE signature —
/// testing the shorter prefix first would misread every UTF-32 LE BOM as
/// UTF-16 LE followed by two NUL characters.
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(DataFormat, usize)> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some((DataFormat::new(Encoding::Utf8, true, true), 3));
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Some((DataFormat::new(Encoding::Utf16, true, true), 2));
    }
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return Some((DataFormat::new(Encoding::Utf32, true, true), 4));
    }
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return Some((DataFormat::new(Encoding::Utf32, true, false), 4));
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Some((DataFormat::new(Encoding::Utf16, true, false), 2));
    }
    None
}

/// Trial-decode up to `sniff_len` bytes using the priority list from
/// spec.md §4.1 (UTF-8, UTF-32 BE, UTF-32 LE, UTF-16 native, UTF-16
/// reversed), falling back to ISO-8859-1 if every trial fails. Used only
/// when a `BufferIn` source declares no explicit format and carries no BOM.
#[must_use]
pub fn sniff_format(bytes: &[u8]) -> DataFormat {
    let sniff_len = bytes.len().min(1024);
    let sample = &bytes[..sniff_len];
    let native_big = cfg!(target_endian = "big");

    let trials = [
        DataFormat::new(Encoding::Utf8, false, true),
        DataFormat::new(Encoding::Utf32, false, true),
        DataFormat::new(Encoding::Utf32, false, false),
        DataFormat::new(Encoding::Utf16, false, native_big),
        DataFormat::new(Encoding::Utf16, false, !native_big),
    ];
    for format in trials {
        if decode_all(format, sample).is_ok() {
            return format;
        }
    }
    DataFormat::new(Encoding::Iso8859_1, false, true)
}

fn decode_all(format: DataFormat, bytes: &[u8]) -> Result<(), ParseError> {
    let mut offset = 0;
    while offset < bytes.len() {
        match decode_char(format.encoding, format.is_big_endian, &bytes[offset..])? {
            Some((_, width)) if width > 0 => offset += width,
            _ => break,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Character-level decode/encode
// ---------------------------------------------------------------------------

/// Decode a single character from the front of `bytes`.
///
/// Returns `Ok(None)` when `bytes` is empty (clean EOF) or too short to
/// contain a full unit of the encoding (caller should treat as "need more
/// bytes", not an error, unless at true EOF). Returns `Err` for a byte
/// sequence that cannot decode in the declared encoding.
pub fn decode_char(
    encoding: Encoding,
    big_endian: bool,
    bytes: &[u8],
) -> Result<Option<(char, usize)>, ParseError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    match encoding {
        Encoding::Ascii => {
            let b = bytes[0];
            if b < 0x80 {
                Ok(Some((b as char, 1)))
            } else {
                Err(ParseError::new(
                    Code::BadEncoding,
                    format!("byte 0x{b:02X} is not valid ASCII"),
                ))
            }
        }
        Encoding::Iso8859_1 => Ok(Some((bytes[0] as char, 1))),
        Encoding::Utf8 => decode_utf8_char(bytes),
        Encoding::Utf16 => decode_utf16_char(bytes, big_endian),
        Encoding::Utf32 => decode_utf32_char(bytes, big_endian),
    }
}

fn decode_utf8_char(bytes: &[u8]) -> Result<Option<(char, usize)>, ParseError> {
    let lead = bytes[0];
    let width = if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        return Err(ParseError::new(
            Code::BadEncoding,
            format!("byte 0x{lead:02X} is not a valid UTF-8 lead byte"),
        ));
    };
    if bytes.len() < width {
        return Ok(None);
    }
    match std::str::from_utf8(&bytes[..width]) {
        Ok(s) => Ok(Some((s.chars().next().expect("width>0"), width))),
        Err(e) => Err(ParseError::new(
            Code::BadEncoding,
            format!("invalid UTF-8 sequence: {e}"),
        )),
    }
}

fn read_u16(bytes: &[u8], big_endian: bool) -> u16 {
    if big_endian {
        u16::from_be_bytes([bytes[0], bytes[1]])
    } else {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }
}

fn decode_utf16_char(bytes: &[u8], big_endian: bool) -> Result<Option<(char, usize)>, ParseError> {
    if bytes.len() < 2 {
        return Ok(None);
    }
    let unit = read_u16(bytes, big_endian);
    if (0xD800..0xDC00).contains(&unit) {
        // High surrogate: need a low surrogate to follow.
        if bytes.len() < 4 {
            return Ok(None);
        }
        let low = read_u16(&bytes[2..], big_endian);
        if !(0xDC00..0xE000).contains(&low) {
            return Err(ParseError::new(
                Code::BadEncoding,
                "unpaired UTF-16 high surrogate",
            ));
        }
        let c = 0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
        let ch = char::from_u32(c).ok_or_else(|| {
            ParseError::new(Code::BadEncoding, "surrogate pair decodes outside Unicode")
        })?;
        Ok(Some((ch, 4)))
    } else if (0xDC00..0xE000).contains(&unit) {
        Err(ParseError::new(
            Code::BadEncoding,
            "unpaired UTF-16 low surrogate",
        ))
    } else {
        let ch = char::from_u32(unit as u32)
            .ok_or_else(|| ParseError::new(Code::BadEncoding, "invalid UTF-16 code unit"))?;
        Ok(Some((ch, 2)))
    }
}

fn decode_utf32_char(bytes: &[u8], big_endian: bool) -> Result<Option<(char, usize)>, ParseError> {
    if bytes.len() < 4 {
        return Ok(None);
    }
    let raw = if big_endian {
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    } else {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    };
    let ch = char::from_u32(raw)
        .ok_or_else(|| ParseError::new(Code::BadEncoding, format!("invalid UTF-32 value {raw:#x}")))?;
    Ok(Some((ch, 4)))
}

/// Encode a single character into `out` using the given encoding/endianness.
///
/// # Errors
///
/// Returns [`Code::BadEncoding`] if `ch` is outside the representable range
/// for `encoding` (e.g. a non-ASCII character under [`Encoding::Ascii`]).
pub fn encode_char(
    encoding: Encoding,
    big_endian: bool,
    ch: char,
    out: &mut Vec<u8>,
) -> Result<(), ParseError> {
    match encoding {
        Encoding::Ascii => {
            if ch.is_ascii() {
                out.push(ch as u8);
                Ok(())
            } else {
                Err(ParseError::new(
                    Code::BadEncoding,
                    format!("character {ch:?} is not representable in ASCII"),
                ))
            }
        }
        Encoding::Iso8859_1 => {
            let cp = ch as u32;
            if cp <= 0xFF {
                out.push(cp as u8);
                Ok(())
            } else {
                Err(ParseError::new(
                    Code::BadEncoding,
                    format!("character {ch:?} is not representable in ISO-8859-1"),
                ))
            }
        }
        Encoding::Utf8 => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            Ok(())
        }
        Encoding::Utf16 => {
            let mut buf = [0u16; 2];
            for unit in ch.encode_utf16(&mut buf) {
                out.extend_from_slice(&if big_endian {
                    unit.to_be_bytes()
                } else {
                    unit.to_le_bytes()
                });
            }
            Ok(())
        }
        Encoding::Utf32 => {
            let cp = ch as u32;
            out.extend_from_slice(&if big_endian {
                cp.to_be_bytes()
            } else {
                cp.to_le_bytes()
            });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_detection_for_all_five_signatures() {
        let cases: &[(&[u8], Encoding, bool, usize)] = &[
            (&[0xEF, 0xBB, 0xBF, b'x'], Encoding::Utf8, true, 3),
            (&[0xFE, 0xFF, 0, b'x'], Encoding::Utf16, true, 2),
            (&[0x00, 0x00, 0xFE, 0xFF], Encoding::Utf32, true, 4),
            (&[0xFF, 0xFE, 0x00, 0x00], Encoding::Utf32, false, 4),
            (&[0xFF, 0xFE, b'x', 0], Encoding::Utf16, false, 2),
        ];
        for (bytes, enc, big, len) in cases {
            let (fmt, n) = detect_bom(bytes).unwrap();
            assert_eq!(fmt.encoding, *enc);
            assert_eq!(fmt.is_big_endian, *big);
            assert_eq!(n, *len);
        }
    }

    #[test]
    fn utf32_le_bom_not_misread_as_utf16_le() {
        // The crux of the ordering requirement in spec.md §3.
        let bytes = [0xFF, 0xFE, 0x00, 0x00];
        let (fmt, len) = detect_bom(&bytes).unwrap();
        assert_eq!(fmt.encoding, Encoding::Utf32);
        assert_eq!(len, 4);
    }

    #[test]
    fn no_bom_returns_none() {
        assert!(detect_bom(b"hello").is_none());
    }

    #[test]
    fn utf8_decode_ascii_and_multibyte() {
        let (ch, w) = decode_char(Encoding::Utf8, true, b"A").unwrap().unwrap();
        assert_eq!((ch, w), ('A', 1));
        let bytes = "é".as_bytes();
        let (ch, w) = decode_char(Encoding::Utf8, true, bytes).unwrap().unwrap();
        assert_eq!((ch, w), ('é', 2));
    }

    #[test]
    fn utf8_truncated_multibyte_is_need_more_not_error() {
        let full = "é".as_bytes();
        let result = decode_char(Encoding::Utf8, true, &full[..1]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn utf16_surrogate_pair_joins_for_source_decode() {
        // U+1F600 GRINNING FACE -> surrogate pair D83D DE00 (BE).
        let bytes = [0xD8, 0x3D, 0xDE, 0x00];
        let (ch, w) = decode_char(Encoding::Utf16, true, &bytes).unwrap().unwrap();
        assert_eq!(ch, '\u{1F600}');
        assert_eq!(w, 4);
    }

    #[test]
    fn utf16_unpaired_high_surrogate_is_bad_encoding() {
        let bytes = [0xD8, 0x00, b'x', 0];
        let err = decode_char(Encoding::Utf16, true, &bytes).unwrap_err();
        assert_eq!(err.code, Code::BadEncoding);
    }

    #[test]
    fn iso_8859_1_passes_every_byte_through() {
        for b in 0u8..=255 {
            let (ch, w) = decode_char(Encoding::Iso8859_1, true, &[b]).unwrap().unwrap();
            assert_eq!(ch as u32, b as u32);
            assert_eq!(w, 1);
        }
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        let err = decode_char(Encoding::Ascii, true, &[0xFF]).unwrap_err();
        assert_eq!(err.code, Code::BadEncoding);
    }

    #[test]
    fn encode_then_decode_round_trips_utf16_and_utf32() {
        for &(enc, big) in &[
            (Encoding::Utf16, true),
            (Encoding::Utf16, false),
            (Encoding::Utf32, true),
            (Encoding::Utf32, false),
        ] {
            let mut out = Vec::new();
            encode_char(enc, big, '€', &mut out).unwrap();
            let (ch, _) = decode_char(enc, big, &out).unwrap().unwrap();
            assert_eq!(ch, '€');
        }
    }

    proptest::proptest! {
        #[test]
        fn utf8_round_trip_any_char(c in proptest::char::any()) {
            let mut out = Vec::new();
            encode_char(Encoding::Utf8, true, c, &mut out).unwrap();
            let (decoded, width) = decode_char(Encoding::Utf8, true, &out).unwrap().unwrap();
            proptest::prop_assert_eq!(decoded, c);
            proptest::prop_assert_eq!(width, out.len());
        }
    }
}
