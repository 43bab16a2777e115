// SPDX-License-Identifier: MIT OR Apache-2.0
//! Base64 transport: byte data as standard (RFC 4648) base64 text.

use activeser_error::{Code, ParseError, Result};

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_value(ch: char) -> Option<u8> {
    ALPHABET.iter().position(|&b| b as char == ch).map(|i| i as u8)
}

/// Encode `bytes` as standard base64 text, `=`-padded to a multiple of 4
/// characters.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        let n = (b0 as u32) << 16 | (b1.unwrap_or(0) as u32) << 8 | (b2.unwrap_or(0) as u32);
        out.push(ALPHABET[(n >> 18 & 0x3F) as usize] as char);
        out.push(ALPHABET[(n >> 12 & 0x3F) as usize] as char);
        out.push(if b1.is_some() {
            ALPHABET[(n >> 6 & 0x3F) as usize] as char
        } else {
            '='
        });
        out.push(if b2.is_some() {
            ALPHABET[(n & 0x3F) as usize] as char
        } else {
            '='
        });
    }
    out
}

/// Decode standard base64 text into bytes.
///
/// Input padded with `=` to a multiple of 4 characters decodes normally.
/// Unpadded input is only valid when its length is itself a multiple of
/// 4 — any other length cannot represent a whole number of bytes and is
/// rejected, matching the original transport's numeral lookup rejecting
/// anything that leaves fewer than 8 decoded bits for a final byte.
///
/// # Errors
///
/// Returns [`Code::BadValue`] for a character outside the base64 alphabet
/// (and not `=`), for data following a padding character, or for input
/// whose length is invalid as described above.
pub fn decode(source: &str) -> Result<Vec<u8>> {
    let chars: Vec<char> = source.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }
    let has_padding = chars.contains(&'=');
    if !has_padding && chars.len() % 4 != 0 {
        return Err(ParseError::new(
            Code::BadValue,
            "unpadded base64 length is not a multiple of 4",
        ));
    }
    if chars.len() % 4 != 0 {
        return Err(ParseError::new(
            Code::BadValue,
            "base64 length is not a multiple of 4",
        ));
    }

    let mut out = Vec::with_capacity(chars.len() / 4 * 3);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    let mut padding_started = false;
    for ch in chars {
        if ch == '=' {
            padding_started = true;
            continue;
        }
        if padding_started {
            return Err(ParseError::new(
                Code::BadValue,
                "base64 data follows a padding character",
            ));
        }
        let v = base64_value(ch)
            .ok_or_else(|| ParseError::new(Code::BadValue, format!("{ch:?} is not a base64 numeral")))?;
        buffer = (buffer << 6) | v as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xFF) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_vectors() {
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foob"), "Zm9vYg==");
    }

    #[test]
    fn decode_known_vectors() {
        assert_eq!(decode("Zg==").unwrap(), b"f");
        assert_eq!(decode("Zm8=").unwrap(), b"fo");
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
    }

    #[test]
    fn decode_unpadded_valid_when_length_multiple_of_four() {
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
    }

    #[test]
    fn decode_unpadded_invalid_length_is_bad_value() {
        let err = decode("Zg").unwrap_err();
        assert_eq!(err.code, Code::BadValue);
    }

    #[test]
    fn decode_rejects_invalid_numeral() {
        let err = decode("Zg!=").unwrap_err();
        assert_eq!(err.code, Code::BadValue);
    }

    #[test]
    fn decode_rejects_data_after_padding() {
        let err = decode("Z=g=").unwrap_err();
        assert_eq!(err.code, Code::BadValue);
    }

    #[test]
    fn empty_input_round_trips_to_empty() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    proptest::proptest! {
        #[test]
        fn round_trip_length_is_four_thirds_ceil(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let text = encode(&bytes);
            let expected_len = ((bytes.len() + 2) / 3) * 4;
            proptest::prop_assert_eq!(text.len(), expected_len);
            proptest::prop_assert_eq!(decode(&text).unwrap(), bytes);
        }
    }
}
