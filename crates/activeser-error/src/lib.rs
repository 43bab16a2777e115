// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared error taxonomy for the active-serialise transports.
//!
//! Every transport (JSON, XML, hex, base64) raises one [`ParseError`],
//! carrying a stable [`Code`], a human-readable message, and — for
//! character-stream transports — the row/column of the fault so a caller
//! can locate it without re-parsing the message string.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Broad family a [`Code`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Underlying source/sink failures (I/O, EOF mid-token).
    Source,
    /// Text-encoding failures (bad BOM, bad UTF, unknown escapes).
    Encoding,
    /// Structural/grammar failures (unbalanced scope, missing delimiter).
    Structural,
    /// Schema failures (unknown name, bounds exceeded, invalid object).
    Schema,
    /// Value-level failures (bad literal, missing value).
    Value,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Source => "source",
            Self::Encoding => "encoding",
            Self::Structural => "structural",
            Self::Schema => "schema",
            Self::Value => "value",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code covering the full taxonomy shared by
/// the JSON and XML transports, plus hex/base64.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that will not
/// change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    // -- Source --
    /// The underlying source/sink failed (I/O error, or went away mid-read).
    BadSource,
    /// A required byte/token count could not be satisfied before EOF.
    InstanceMissing,

    // -- Encoding --
    /// An escape sequence did not match any recognised form.
    UnknownEscapeChar,
    /// A byte sequence did not decode to a valid code point in the declared
    /// encoding, or a character reference decoded outside valid Unicode.
    BadEncoding,

    // -- Structural --
    /// A name was required (object key, tag name) but none was present.
    NameMissing,
    /// The scope stack ended with the source while a construct was
    /// still open (unterminated object/array/element).
    IncompleteContext,
    /// A token did not match the expected grammar at the current stage.
    ParsingError,
    /// A quoted string was not terminated before EOF or a line break.
    ClosingQuoteMissing,
    /// A value was expected (after `:` or as an array element) but absent.
    ValueMissing,
    /// An object/array scope closed without its matching opener, or vice
    /// versa.
    UnbalancedScope,
    /// A delimiter (`,`, `:`) was expected but a different token was found.
    BadDelimiter,

    // -- Schema --
    /// The destination could not accept the value being written to it.
    BadDestination,
    /// `fillInventory` returned an empty inventory for a non-leaf package.
    MissingInventory,
    /// A repeating entry exceeded its declared `maximum`.
    InventoryBoundsExceeded,
    /// `Package::validate`/`insert` rejected the parsed object.
    InvalidObject,
    /// An incoming name did not match any inventory entry, and the unknown
    /// policy requires this to be fatal.
    UnknownName,

    // -- Value --
    /// A literal did not match its expected grammar (number, bool, etc).
    BadValue,

    // -- XML only --
    /// A start tag was never closed by a matching end/self-close.
    UnboundedTag,
    /// An unrecognised `<!...>` section was encountered.
    UnknownSection,
    /// An unrecognised `<? ... ?>` processing instruction was encountered
    /// and policy forbids skipping it.
    UnknownInstruction,
    /// A tag was opened (`<`) without a following name.
    MissingTagName,
    /// An attribute list could not be parsed as a flat `key="value"` stream.
    MissingAttributes,
    /// An attribute name was not followed by `=`.
    AttributeEqualMissing,
    /// An attribute value's opening quote had no matching closing quote.
    AttributeQuoteMissing,
    /// An end tag was missing or did not match the currently open element.
    ClosingTagMissing,
    /// A name violated XML 1.0 name-start/name-char rules.
    BadName,
    /// An element's content did not match what its package's inventory
    /// declares (e.g. mixed content where only an item slot is declared).
    BadElement,
    /// A start or end tag name did not match any inventory entry, and the
    /// unknown policy requires this to be fatal.
    UnknownTag,
}

impl Code {
    /// Returns the broad [`Category`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> Category {
        use Code::*;
        match self {
            BadSource | InstanceMissing => Category::Source,
            UnknownEscapeChar | BadEncoding => Category::Encoding,
            NameMissing
            | IncompleteContext
            | ParsingError
            | ClosingQuoteMissing
            | UnbalancedScope
            | BadDelimiter
            | UnboundedTag
            | MissingTagName
            | MissingAttributes
            | AttributeEqualMissing
            | AttributeQuoteMissing
            | ClosingTagMissing
            | BadName => Category::Structural,
            BadDestination | MissingInventory | InventoryBoundsExceeded | InvalidObject
            | UnknownName | UnknownSection | UnknownInstruction | BadElement | UnknownTag => {
                Category::Schema
            }
            ValueMissing | BadValue => Category::Value,
        }
    }

    /// Returns `true` for codes the caller may recover from by skipping the
    /// offending subtree (`unknownName`/`unknownTag` under a lenient
    /// policy), per spec.md §7.
    #[must_use]
    pub fn is_recoverable_by_skip(&self) -> bool {
        matches!(self, Code::UnknownName | Code::UnknownTag)
    }

    /// Stable `SCREAMING_SNAKE_CASE` representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        use Code::*;
        match self {
            BadSource => "BAD_SOURCE",
            InstanceMissing => "INSTANCE_MISSING",
            UnknownEscapeChar => "UNKNOWN_ESCAPE_CHAR",
            BadEncoding => "BAD_ENCODING",
            NameMissing => "NAME_MISSING",
            IncompleteContext => "INCOMPLETE_CONTEXT",
            ParsingError => "PARSING_ERROR",
            ClosingQuoteMissing => "CLOSING_QUOTE_MISSING",
            ValueMissing => "VALUE_MISSING",
            UnbalancedScope => "UNBALANCED_SCOPE",
            BadDelimiter => "BAD_DELIMITER",
            BadDestination => "BAD_DESTINATION",
            MissingInventory => "MISSING_INVENTORY",
            InventoryBoundsExceeded => "INVENTORY_BOUNDS_EXCEEDED",
            InvalidObject => "INVALID_OBJECT",
            UnknownName => "UNKNOWN_NAME",
            BadValue => "BAD_VALUE",
            UnboundedTag => "UNBOUNDED_TAG",
            UnknownSection => "UNKNOWN_SECTION",
            UnknownInstruction => "UNKNOWN_INSTRUCTION",
            MissingTagName => "MISSING_TAG_NAME",
            MissingAttributes => "MISSING_ATTRIBUTES",
            AttributeEqualMissing => "ATTRIBUTE_EQUAL_MISSING",
            AttributeQuoteMissing => "ATTRIBUTE_QUOTE_MISSING",
            ClosingTagMissing => "CLOSING_TAG_MISSING",
            BadName => "BAD_NAME",
            BadElement => "BAD_ELEMENT",
            UnknownTag => "UNKNOWN_TAG",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// 1-based row/column of the last character consumed from a `BufferIn`
/// before a fault was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based row (line) number.
    pub row: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    /// A position at the very start of a source (row 1, column 1).
    #[must_use]
    pub fn start() -> Self {
        Self { row: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// The single error type every transport in this workspace raises.
///
/// # Examples
///
/// ```
/// use activeser_error::{Code, ParseError, Position};
///
/// let err = ParseError::new(Code::UnknownName, "unexpected key \"verte\"")
///     .at(Position { row: 24, column: 5 });
/// assert_eq!(err.code, Code::UnknownName);
/// assert_eq!(err.position.unwrap().row, 24);
/// ```
#[derive(Debug)]
pub struct ParseError {
    /// Machine-readable error code.
    pub code: Code,
    /// Human-readable description.
    pub message: String,
    /// Row/column of the fault, when raised from a character-stream
    /// transport (JSON, XML). `None` for purely binary transports
    /// (hex, base64).
    pub position: Option<Position>,
    /// Optional underlying cause (e.g. an I/O error).
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ParseError {
    /// Create a new error with the given code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            position: None,
            source: None,
        }
    }

    /// Attach a row/column position.
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> Category {
        self.code.category()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(pos) = self.position {
            write!(f, " (at {pos})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|b| b.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience alias used throughout the transport crates.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_category_mapping_covers_taxonomy() {
        assert_eq!(Code::BadSource.category(), Category::Source);
        assert_eq!(Code::UnknownEscapeChar.category(), Category::Encoding);
        assert_eq!(Code::UnbalancedScope.category(), Category::Structural);
        assert_eq!(Code::InventoryBoundsExceeded.category(), Category::Schema);
        assert_eq!(Code::BadValue.category(), Category::Value);
    }

    #[test]
    fn unknown_name_and_tag_are_skip_recoverable() {
        assert!(Code::UnknownName.is_recoverable_by_skip());
        assert!(Code::UnknownTag.is_recoverable_by_skip());
        assert!(!Code::BadValue.is_recoverable_by_skip());
    }

    #[test]
    fn display_includes_code_message_and_position() {
        let err =
            ParseError::new(Code::ClosingTagMissing, "expected </shape>").at(Position::start());
        let text = err.to_string();
        assert!(text.contains("CLOSING_TAG_MISSING"));
        assert!(text.contains("expected </shape>"));
        assert!(text.contains("1:1"));
    }

    #[test]
    fn display_without_position_omits_suffix() {
        let err = ParseError::new(Code::BadValue, "not a number");
        assert_eq!(err.to_string(), "BAD_VALUE: not a number");
    }

    #[test]
    fn as_str_round_trips_through_serde() {
        let json = serde_json::to_string(&Code::InventoryBoundsExceeded).unwrap();
        assert_eq!(json, "\"INVENTORY_BOUNDS_EXCEEDED\"");
        let back: Code = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Code::InventoryBoundsExceeded);
    }
}
