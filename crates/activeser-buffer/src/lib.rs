// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streaming character buffers: [`BufferIn`] reads characters off a byte
//! source with row/column tracking, lookahead, and predicate-driven
//! scanning; [`BufferOut`] is the symmetric write side.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use activeser_encoding::{decode_char, detect_bom, encode_char, sniff_format, DataFormat};
use activeser_error::{Code, ParseError, Position, Result};

mod source;
pub use source::Source;

/// How a multi-character scan consumed (or didn't consume) its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundPolicy {
    /// The matched text is left in the buffer to be read again.
    Pooled,
    /// The matched text is consumed along with everything before it.
    Consumed,
}

/// A streaming, encoding-aware character reader over a [`Source`].
///
/// Tracks 1-based row/column of the last character returned, collapses
/// CRLF into a single logical newline, and buffers internally so callers
/// can `rewind` a bounded distance without re-reading the source.
pub struct BufferIn<S: Source> {
    source: S,
    pending: Vec<u8>,
    consumed: usize,
    format: DataFormat,
    format_known: bool,
    last_row: usize,
    last_column: usize,
    found_cr: bool,
    // Ring of recently-yielded chars, for `rewind`.
    history: Vec<(char, usize, usize)>,
    history_cursor: usize,
}

const REFILL_CHUNK: usize = 4096;
const HISTORY_CAP: usize = 256;

impl<S: Source> BufferIn<S> {
    /// Wrap `source`, discovering its text format from a BOM or, failing
    /// that, trial decoding, per spec.md §4.1.
    pub fn new(mut source: S) -> Result<Self> {
        let mut pending = Vec::new();
        fill_from(&mut source, &mut pending, REFILL_CHUNK.max(1024))?;
        let format = match detect_bom(&pending) {
            Some((fmt, bom_len)) => {
                pending.drain(..bom_len);
                fmt
            }
            None => sniff_format(&pending),
        };
        Ok(Self {
            source,
            pending,
            consumed: 0,
            format,
            format_known: true,
            last_row: 1,
            last_column: 0,
            found_cr: false,
            history: Vec::new(),
            history_cursor: 0,
        })
    }

    /// Wrap `source` with an explicitly declared format, bypassing BOM
    /// detection and sniffing entirely.
    pub fn with_format(mut source: S, format: DataFormat) -> Result<Self> {
        let mut pending = Vec::new();
        fill_from(&mut source, &mut pending, REFILL_CHUNK.max(1024))?;
        if format.has_bom {
            if let Some((_, bom_len)) = detect_bom(&pending) {
                pending.drain(..bom_len);
            }
        }
        Ok(Self {
            source,
            pending,
            consumed: 0,
            format,
            format_known: true,
            last_row: 1,
            last_column: 0,
            found_cr: false,
            history: Vec::new(),
            history_cursor: 0,
        })
    }

    /// The discovered or declared text format.
    #[must_use]
    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// 1-based row of the last character returned by [`Self::get`].
    #[must_use]
    pub fn last_row(&self) -> usize {
        self.last_row
    }

    /// 1-based column of the last character returned by [`Self::get`].
    #[must_use]
    pub fn last_column(&self) -> usize {
        self.last_column
    }

    /// Current row/column as a [`Position`], for attaching to a
    /// [`ParseError`].
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            row: self.last_row,
            column: self.last_column,
        }
    }

    fn ensure_buffered(&mut self, min_len: usize) -> Result<()> {
        while self.pending.len() - self.consumed < min_len {
            let before = self.pending.len();
            fill_from(&mut self.source, &mut self.pending, REFILL_CHUNK)?;
            if self.pending.len() == before {
                break; // source is exhausted
            }
        }
        Ok(())
    }

    /// The unconsumed bytes currently held in the internal buffer, without
    /// pulling more from the source. Mirrors `BufferIn::data()` /
    /// `dataSize()` in the original for callers that need raw access.
    #[must_use]
    pub fn remaining_slice(&self) -> &[u8] {
        &self.pending[self.consumed..]
    }

    fn update_position(&mut self, ch: char) {
        if ch == '\n' {
            if self.found_cr {
                self.found_cr = false;
            } else {
                self.last_row += 1;
                self.last_column = 0;
            }
        } else if ch == '\r' {
            self.last_row += 1;
            self.last_column = 0;
            self.found_cr = true;
        } else {
            self.found_cr = false;
            self.last_column += 1;
        }
    }

    /// Pull the next logical character, collapsing CRLF to a single `\n`.
    /// Returns `None` at clean end of source.
    pub fn get(&mut self) -> Result<Option<char>> {
        if self.history_cursor < self.history.len() {
            let (ch, row, col) = self.history[self.history_cursor];
            self.history_cursor += 1;
            self.last_row = row;
            self.last_column = col;
            return Ok(Some(ch));
        }
        let Some(ch) = self.decode_next()? else {
            return Ok(None);
        };
        let ch = if ch == '\r' {
            self.ensure_buffered(4)?;
            let slice = &self.pending[self.consumed..];
            if let Some((next_ch, width)) =
                decode_char(self.format.encoding, self.format.is_big_endian, slice)?
            {
                if next_ch == '\n' {
                    self.consumed += width;
                    self.compact();
                }
            }
            '\n'
        } else {
            ch
        };
        self.update_position(ch);
        self.push_history(ch);
        Ok(Some(ch))
    }

    fn push_history(&mut self, ch: char) {
        self.history.push((ch, self.last_row, self.last_column));
        if self.history.len() > HISTORY_CAP {
            self.history.remove(0);
            self.history_cursor = self.history_cursor.saturating_sub(1);
        }
        self.history_cursor = self.history.len();
    }

    fn decode_next(&mut self) -> Result<Option<char>> {
        self.ensure_buffered(4)?;
        let slice = &self.pending[self.consumed..];
        if slice.is_empty() {
            return Ok(None);
        }
        match decode_char(self.format.encoding, self.format.is_big_endian, slice)? {
            Some((ch, width)) => {
                self.consumed += width;
                self.compact();
                Ok(Some(ch))
            }
            None => Err(ParseError::new(
                Code::BadEncoding,
                "truncated multi-byte character at end of source",
            )
            .at(self.position())),
        }
    }

    fn compact(&mut self) {
        if self.consumed > REFILL_CHUNK * 2 {
            self.pending.drain(..self.consumed);
            self.consumed = 0;
        }
    }

    /// Look at the next character without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>> {
        let ch = self.get()?;
        if ch.is_some() {
            self.history_cursor -= 1;
        }
        Ok(ch)
    }

    /// Step back `how_many` characters already returned by [`Self::get`].
    /// Bounded by the retained history (at least [`HISTORY_CAP`]
    /// characters).
    ///
    /// # Errors
    ///
    /// Returns [`Code::InstanceMissing`] if `how_many` exceeds the
    /// available history.
    pub fn rewind(&mut self, how_many: usize) -> Result<()> {
        if how_many > self.history_cursor {
            return Err(ParseError::new(
                Code::InstanceMissing,
                "rewind distance exceeds retained history",
            )
            .at(self.position()));
        }
        self.history_cursor -= how_many;
        if self.history_cursor > 0 {
            let (_, row, col) = self.history[self.history_cursor - 1];
            self.last_row = row;
            self.last_column = col;
        } else {
            self.last_row = 1;
            self.last_column = 0;
        }
        Ok(())
    }

    /// Call `func` for every character up to and including the first one
    /// for which `func` returns `false`, or end of source.
    pub fn for_each(&mut self, mut func: impl FnMut(char) -> bool) -> Result<()> {
        while let Some(ch) = self.get()? {
            if !func(ch) {
                break;
            }
        }
        Ok(())
    }

    /// Read characters while `predicate` holds, returning the collected
    /// run. Stops (without consuming) at the first character for which
    /// `predicate` is `false`, or at end of source.
    pub fn find_if(&mut self, mut predicate: impl FnMut(char) -> bool) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.peek()? {
                Some(ch) if predicate(ch) => {
                    self.get()?;
                    out.push(ch);
                }
                _ => break,
            }
        }
        Ok(out)
    }

    /// Read characters until `needle` is found, returning everything
    /// before it. `policy` controls whether `needle` itself is consumed.
    pub fn find(&mut self, needle: char, policy: FoundPolicy) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.peek()? {
                Some(ch) if ch == needle => {
                    if policy == FoundPolicy::Consumed {
                        self.get()?;
                    }
                    break;
                }
                Some(ch) => {
                    self.get()?;
                    out.push(ch);
                }
                None => break,
            }
        }
        Ok(out)
    }

    /// Read characters up to (not including) the first character that
    /// appears in `set`, returning everything before it and, optionally,
    /// which member of `set` stopped the scan.
    pub fn find_first_of(&mut self, set: &str, policy: FoundPolicy) -> Result<(String, Option<char>)> {
        let mut out = String::new();
        loop {
            match self.peek()? {
                Some(ch) if set.contains(ch) => {
                    if policy == FoundPolicy::Consumed {
                        self.get()?;
                    }
                    return Ok((out, Some(ch)));
                }
                Some(ch) => {
                    self.get()?;
                    out.push(ch);
                }
                None => return Ok((out, None)),
            }
        }
    }

    /// Read characters that belong to `set`, stopping at (without
    /// consuming) the first character that is not a member.
    pub fn find_first_not_of(&mut self, set: &str) -> Result<String> {
        self.find_if(|ch| set.contains(ch))
    }

    /// Read a single "word": skip leading characters in `division`, then
    /// collect characters until the next member of `division` or end of
    /// source.
    pub fn read_word(&mut self, division: &str) -> Result<String> {
        self.find_if(|ch| division.contains(ch))?;
        self.find_if(|ch| !division.contains(ch))
    }

    /// Read up to `how_many` words, each separated by a run of `division`
    /// characters.
    pub fn read_words(&mut self, how_many: usize, division: &str) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(how_many);
        for _ in 0..how_many {
            let word = self.read_word(division)?;
            if word.is_empty() {
                break;
            }
            out.push(word);
        }
        Ok(out)
    }

    /// Skip `how_many` characters without returning them.
    pub fn skip(&mut self, how_many: usize) -> Result<()> {
        for _ in 0..how_many {
            if self.get()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}

fn fill_from(source: &mut impl Source, pending: &mut Vec<u8>, want: usize) -> Result<()> {
    let mut chunk = vec![0u8; want];
    let n = source
        .read(&mut chunk)
        .map_err(|e| ParseError::new(Code::BadSource, e.to_string()))?;
    pending.extend_from_slice(&chunk[..n]);
    Ok(())
}

/// A streaming, encoding-aware character writer. Buffers internally and
/// must be [`flush`](Self::flush)ed (or dropped) to guarantee delivery.
pub struct BufferOut<W: std::io::Write> {
    sink: W,
    format: DataFormat,
    buf: Vec<u8>,
    wrote_bom: bool,
}

const WRITE_FLUSH_THRESHOLD: usize = 8192;

impl<W: std::io::Write> BufferOut<W> {
    /// Wrap `sink`, writing a BOM first if `format.has_bom` is set.
    pub fn new(sink: W, format: DataFormat) -> Self {
        Self {
            sink,
            format,
            buf: Vec::new(),
            wrote_bom: false,
        }
    }

    fn ensure_bom(&mut self) {
        if !self.wrote_bom {
            if let Some(bom) = self.format.to_bom() {
                if self.format.has_bom {
                    self.buf.extend_from_slice(bom);
                }
            }
            self.wrote_bom = true;
        }
    }

    /// The text format this writer encodes to.
    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// Write a single character.
    pub fn put(&mut self, ch: char) -> Result<()> {
        self.ensure_bom();
        encode_char(self.format.encoding, self.format.is_big_endian, ch, &mut self.buf)?;
        if self.buf.len() >= WRITE_FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Write every character of `text` in order.
    pub fn put_str(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            self.put(ch)?;
        }
        Ok(())
    }

    /// Flush the internal buffer to the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_bom();
        self.sink
            .write_all(&self.buf)
            .map_err(|e| ParseError::new(Code::BadSource, e.to_string()))?;
        self.buf.clear();
        self.sink
            .flush()
            .map_err(|e| ParseError::new(Code::BadSource, e.to_string()))
    }
}

impl<W: std::io::Write> Drop for BufferOut<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activeser_encoding::Encoding;

    fn buffer_for(bytes: &[u8]) -> BufferIn<&[u8]> {
        BufferIn::new(bytes).unwrap()
    }

    #[test]
    fn reads_plain_ascii_and_tracks_column() {
        let mut buf = buffer_for(b"abc");
        assert_eq!(buf.get().unwrap(), Some('a'));
        assert_eq!(buf.last_row(), 1);
        assert_eq!(buf.last_column(), 1);
        assert_eq!(buf.get().unwrap(), Some('b'));
        assert_eq!(buf.last_column(), 2);
        assert_eq!(buf.get().unwrap(), Some('c'));
        assert_eq!(buf.get().unwrap(), None);
    }

    #[test]
    fn crlf_collapses_to_single_newline_and_bumps_row() {
        let mut buf = buffer_for(b"a\r\nb");
        assert_eq!(buf.get().unwrap(), Some('a'));
        assert_eq!(buf.get().unwrap(), Some('\n'));
        assert_eq!(buf.last_row(), 2);
        assert_eq!(buf.last_column(), 0);
        assert_eq!(buf.get().unwrap(), Some('b'));
        assert_eq!(buf.last_column(), 1);
    }

    #[test]
    fn bare_lf_also_bumps_row() {
        let mut buf = buffer_for(b"a\nb");
        buf.get().unwrap();
        assert_eq!(buf.get().unwrap(), Some('\n'));
        assert_eq!(buf.last_row(), 2);
        assert_eq!(buf.get().unwrap(), Some('b'));
    }

    #[test]
    fn rewind_restores_prior_position() {
        let mut buf = buffer_for(b"abc");
        buf.get().unwrap();
        buf.get().unwrap();
        buf.rewind(1).unwrap();
        assert_eq!(buf.last_column(), 1);
        assert_eq!(buf.get().unwrap(), Some('b'));
    }

    #[test]
    fn rewind_past_history_fails() {
        let mut buf = buffer_for(b"abc");
        buf.get().unwrap();
        assert!(buf.rewind(5).is_err());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut buf = buffer_for(b"ab");
        assert_eq!(buf.peek().unwrap(), Some('a'));
        assert_eq!(buf.get().unwrap(), Some('a'));
        assert_eq!(buf.get().unwrap(), Some('b'));
    }

    #[test]
    fn find_collects_up_to_delimiter_and_consumes_it() {
        let mut buf = buffer_for(b"key:value");
        let head = buf.find(':', FoundPolicy::Consumed).unwrap();
        assert_eq!(head, "key");
        let rest = buf.find_if(|_| true).unwrap();
        assert_eq!(rest, "value");
    }

    #[test]
    fn find_first_of_reports_which_member_stopped_the_scan() {
        let mut buf = buffer_for(b"1,2;3");
        let (head, stop) = buf.find_first_of(",;", FoundPolicy::Pooled).unwrap();
        assert_eq!(head, "1");
        assert_eq!(stop, Some(','));
    }

    #[test]
    fn read_word_skips_division_chars_between_words() {
        let mut buf = buffer_for(b"  foo   bar");
        assert_eq!(buf.read_word(" ").unwrap(), "foo");
        assert_eq!(buf.read_word(" ").unwrap(), "bar");
    }

    #[test]
    fn read_words_stops_at_count() {
        let mut buf = buffer_for(b"a b c d");
        let words = buf.read_words(2, " ").unwrap();
        assert_eq!(words, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn discovers_utf8_bom_and_skips_it() {
        let bytes = [0xEF, 0xBB, 0xBF, b'x'];
        let mut buf = buffer_for(&bytes);
        assert_eq!(buf.format().encoding, Encoding::Utf8);
        assert_eq!(buf.get().unwrap(), Some('x'));
    }

    #[test]
    fn buffer_out_writes_declared_bom() {
        let mut out = Vec::new();
        {
            let mut writer = BufferOut::new(
                &mut out,
                DataFormat::new(Encoding::Utf8, true, true),
            );
            writer.put_str("hi").unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(&out[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&out[3..], b"hi");
    }

    #[test]
    fn buffer_out_without_bom_flag_omits_signature() {
        let mut out = Vec::new();
        {
            let mut writer = BufferOut::new(
                &mut out,
                DataFormat::new(Encoding::Utf8, false, true),
            );
            writer.put_str("hi").unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(out, b"hi");
    }

    proptest::proptest! {
        #[test]
        fn row_column_are_monotonic_over_ascii_text(
            text in "[ -~]{0,64}",
        ) {
            let mut buf = buffer_for(text.as_bytes());
            let mut last = (1usize, 0usize);
            while let Some(_) = buf.get().unwrap() {
                let cur = (buf.last_row(), buf.last_column());
                proptest::prop_assert!(cur >= last);
                last = cur;
            }
        }
    }
}
