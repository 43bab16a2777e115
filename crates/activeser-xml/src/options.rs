// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transport-level option sets (spec.md §6).

/// Options controlling how [`crate::write::send`] formats its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Tab-indent nested elements. Implies `line_feeds`.
    pub tabbed: bool,
    /// Emit a line break after every element.
    pub line_feeds: bool,
    /// Emit namespace prefixes (`prefix:local`) when an identity carries
    /// a group.
    pub namespaces: bool,
    /// Write a `<?xml version="1.0" encoding="..."?>` prolog first.
    pub prolog: bool,
}

impl WriteOptions {
    /// Pretty-printed output: tab indentation, line feeds, and a prolog.
    #[must_use]
    pub fn pretty() -> Self {
        Self {
            tabbed: true,
            line_feeds: true,
            prolog: true,
            ..Self::default()
        }
    }
}

/// Options controlling how [`crate::read::receive`] reconciles incoming
/// tags/attributes against a package's inventory.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// A tag with no matching inventory entry is skipped (its subtree
    /// discarded) rather than raising `unknownTag`.
    pub unknown_name_skipped: bool,
    /// A `<? ... ?>` instruction other than `xml` is skipped rather than
    /// raising `unknownInstruction`.
    pub unknown_instruction_skipped: bool,
    /// Every inventory entry is treated as required.
    pub every_entry_required: bool,
    /// A required entry left unfilled fails the parse.
    pub missing_entry_failed: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            unknown_name_skipped: false,
            unknown_instruction_skipped: true,
            every_entry_required: false,
            missing_entry_failed: true,
        }
    }
}
