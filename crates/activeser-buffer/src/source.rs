// SPDX-License-Identifier: MIT OR Apache-2.0
//! The byte source a [`crate::BufferIn`] reads from.
//!
//! Any [`std::io::Read`] works: `&[u8]` and `std::io::Cursor<&str>` cover the
//! in-memory cases, `std::fs::File` the file case — mirroring the three
//! constructor families (`File`/`Memory`/`String`) the original buffer
//! offered, without needing a bespoke enum.

use std::io::Read;

/// A byte source for [`crate::BufferIn`].
///
/// Blanket-implemented for every [`std::io::Read`]; most callers never name
/// this trait directly.
pub trait Source {
    /// Read up to `buf.len()` bytes, returning how many were read. `0`
    /// signals end of source.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

impl<R: Read> Source for R {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Read::read(self, buf)
    }
}
