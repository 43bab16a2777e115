// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hex transport: byte data as upper-case, two-digit-per-byte hex text.

use activeser_error::{Code, ParseError, Result};

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `bytes` as upper-case hex, two digits per byte.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0F) as usize] as char);
    }
    out
}

fn hex_value(ch: char) -> Option<u8> {
    match ch {
        '0'..='9' => Some(ch as u8 - b'0'),
        'a'..='f' => Some(ch as u8 - b'a' + 10),
        'A'..='F' => Some(ch as u8 - b'A' + 10),
        _ => None,
    }
}

/// Decode hex text into bytes.
///
/// `fixed_len`, when given, is the exact number of output bytes required.
/// An odd count of hex digits is only valid under a `fixed_len` cap: when
/// the requested byte count is odd, the first output byte is read from a
/// single leading hex digit (value 0-15) rather than a pair, matching the
/// original transport's handling of a fixed-width but oddly-padded field.
///
/// With no `fixed_len`, decoding is best-effort: it consumes complete
/// two-digit pairs until the input is exhausted or an invalid/incomplete
/// pair is met, and returns whatever was decoded so far rather than
/// failing, mirroring unbounded reads from an open stream.
///
/// # Errors
///
/// Under a `fixed_len` cap, returns [`Code::BadValue`] if the input runs
/// out or contains a non-hex character before the requested byte count is
/// satisfied.
pub fn decode(source: &str, fixed_len: Option<usize>) -> Result<Vec<u8>> {
    let mut chars = source.chars();
    let mut out = Vec::new();
    match fixed_len {
        Some(0) => Ok(out),
        Some(n) => {
            let mut remaining = n;
            if remaining % 2 != 0 {
                let c = chars
                    .next()
                    .ok_or_else(|| ParseError::new(Code::BadValue, "hex stream ended early"))?;
                let v = hex_value(c)
                    .ok_or_else(|| ParseError::new(Code::BadValue, format!("{c:?} is not a hex digit")))?;
                out.push(v);
                remaining -= 1;
            }
            while remaining > 0 {
                let c1 = chars
                    .next()
                    .ok_or_else(|| ParseError::new(Code::BadValue, "hex stream ended early"))?;
                let c2 = chars
                    .next()
                    .ok_or_else(|| ParseError::new(Code::BadValue, "hex stream ended early"))?;
                let v1 = hex_value(c1)
                    .ok_or_else(|| ParseError::new(Code::BadValue, format!("{c1:?} is not a hex digit")))?;
                let v2 = hex_value(c2)
                    .ok_or_else(|| ParseError::new(Code::BadValue, format!("{c2:?} is not a hex digit")))?;
                out.push((v1 << 4) | v2);
                remaining -= 2;
            }
            Ok(out)
        }
        None => {
            loop {
                let Some(c1) = chars.next() else { break };
                let Some(v1) = hex_value(c1) else { break };
                let Some(c2) = chars.next() else { break };
                let Some(v2) = hex_value(c2) else { break };
                out.push((v1 << 4) | v2);
            }
            Ok(out)
        }
    }
}

/// Decode a fixed-width big-endian `u32` from hex text, right-padding the
/// input with `'0'` to eight digits first (so short values like `"2a"`
/// decode as if written `"0000002a"`).
///
/// # Errors
///
/// Returns [`Code::BadValue`] if the padded text contains a non-hex digit.
pub fn decode_u32(source: &str) -> Result<u32> {
    let mut padded = source.to_string();
    while padded.chars().count() < 8 {
        padded.push('0');
    }
    let bytes = decode(&padded, Some(4))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Encode a `u32` as an eight-digit big-endian hex string.
#[must_use]
pub fn encode_u32(value: u32) -> String {
    encode(&value.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_upper_case_pairs() {
        assert_eq!(encode(&[0x00, 0xFF, 0x2A]), "00FF2A");
    }

    #[test]
    fn decode_unbounded_round_trips_encode() {
        let bytes = [1u8, 2, 3, 255, 0];
        let text = encode(&bytes);
        assert_eq!(decode(&text, None).unwrap(), bytes);
    }

    #[test]
    fn decode_accepts_lower_case() {
        assert_eq!(decode("2a", None).unwrap(), vec![0x2A]);
    }

    #[test]
    fn decode_fixed_len_odd_count_reads_single_leading_nibble() {
        // 3 requested bytes -> 1 nibble then 2 full pairs (5 hex digits).
        let out = decode("aFF00", Some(3)).unwrap();
        assert_eq!(out, vec![0x0A, 0xFF, 0x00]);
    }

    #[test]
    fn decode_fixed_len_rejects_short_input() {
        assert!(decode("2a", Some(4)).is_err());
    }

    #[test]
    fn decode_unbounded_drops_trailing_odd_digit() {
        assert_eq!(decode("2a3", None).unwrap(), vec![0x2A]);
    }

    #[test]
    fn decode_u32_pads_short_input_on_the_right() {
        assert_eq!(decode_u32("2a").unwrap(), 0x2A00_0000);
    }

    #[test]
    fn encode_u32_round_trips_decode_u32() {
        let v = 0xDEAD_BEEFu32;
        assert_eq!(decode_u32(&encode_u32(v)).unwrap(), v);
    }

    proptest::proptest! {
        #[test]
        fn round_trip_length_is_twice_input(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let text = encode(&bytes);
            proptest::prop_assert_eq!(text.len(), bytes.len() * 2);
            proptest::prop_assert_eq!(decode(&text, None).unwrap(), bytes);
        }
    }
}
