// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transport-level option sets (spec.md §6).

/// Options controlling how [`crate::write::send`] formats its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Tab-indent nested structures. Implies `line_feeds`.
    pub tabbed: bool,
    /// Emit a line break after every value.
    pub line_feeds: bool,
    /// When an identity carries a namespace group, emit its key as
    /// `"group:local"` rather than just `"local"`.
    pub namespaces: bool,
    /// Accepted for API uniformity with the XML transport; JSON has no
    /// prolog and this flag has no effect.
    pub prolog: bool,
}

impl WriteOptions {
    /// Pretty-printed output: tab indentation and line feeds.
    #[must_use]
    pub fn pretty() -> Self {
        Self {
            tabbed: true,
            line_feeds: true,
            ..Self::default()
        }
    }
}

/// Options controlling how [`crate::read::receive`] reconciles incoming
/// names against a package's inventory.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// An object key with no matching inventory entry is skipped (its
    /// value subtree discarded) rather than raising `unknownName`.
    pub unknown_name_skipped: bool,
    /// Every inventory entry is treated as required, regardless of the
    /// package's own `required` flag.
    pub every_entry_required: bool,
    /// A required entry left unfilled at the end of an object fails the
    /// parse (`inventoryBoundsExceeded`) rather than being silently
    /// accepted.
    pub missing_entry_failed: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            unknown_name_skipped: false,
            every_entry_required: false,
            missing_entry_failed: true,
        }
    }
}
