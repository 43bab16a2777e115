// SPDX-License-Identifier: MIT OR Apache-2.0
//! Leaf values and the [`Cargo`] union a package dispatches per slot.

use std::fmt;

use activeser_codec::hex;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A leaf value carried by one inventory slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (JSON `null`, an absent/self-closing XML element).
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer. Floating-point literals with no fractional part
    /// and no exponent decode to this variant, per the JSON value-typing
    /// grammar.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// Text content.
    Text(String),
    /// A GUID, formatted on the wire as canonical dashed hex groups
    /// (`F74C8696-6C1E-6F33-619B-FD8E979E68A4`).
    Guid(Uuid),
    /// A timestamp, formatted on the wire as RFC 3339. Written with
    /// millisecond precision; any finer sub-second precision on the
    /// value is truncated, not rounded, matching the original's
    /// fixed-precision time formatting (spec.md Open Question (c),
    /// preserved rather than made configurable).
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Render this value as it appears inside text content (JSON string
    /// body or XML character data) — never includes JSON's surrounding
    /// quotes.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Guid(g) => format_guid(g),
            Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn format_guid(guid: &Uuid) -> String {
    let bytes = guid.as_bytes();
    format!(
        "{}-{}-{}-{}-{}",
        hex::encode(&bytes[0..4]),
        hex::encode(&bytes[4..6]),
        hex::encode(&bytes[6..8]),
        hex::encode(&bytes[8..10]),
        hex::encode(&bytes[10..16]),
    )
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A leaf cargo object: something a transport can both read a [`Value`]
/// out of and write a [`Value`] into.
pub trait Item: std::fmt::Debug {
    /// The item's current value.
    fn get_value(&self) -> Value;
    /// Overwrite the item's value.
    fn set_value(&mut self, value: Value);
}

/// The simplest possible [`Item`]: a bare, owned [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueItem(pub Value);

impl Item for ValueItem {
    fn get_value(&self) -> Value {
        self.0.clone()
    }

    fn set_value(&mut self, value: Value) {
        self.0 = value;
    }
}

/// What a package dispatches for one inventory slot: a leaf [`Item`], a
/// nested [`crate::Package`], or nothing.
pub enum Cargo {
    /// A leaf value.
    Item(Box<dyn Item>),
    /// A nested package (object/element).
    Package(Box<dyn crate::Package>),
    /// No cargo for this slot (skip it).
    Null,
}

impl Cargo {
    /// Wrap a bare [`Value`] as an item-cargo.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Cargo::Item(Box::new(ValueItem(value)))
    }
}

impl fmt::Debug for Cargo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cargo::Item(item) => f.debug_tuple("Item").field(item).finish(),
            Cargo::Package(_) => f.write_str("Package(..)"),
            Cargo::Null => f.write_str("Null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_formats_as_canonical_dashed_groups() {
        let guid = Uuid::parse_str("f74c8696-6c1e-6f33-619b-fd8e979e68a4").unwrap();
        assert_eq!(
            Value::Guid(guid).to_text(),
            "F74C8696-6C1E-6F33-619B-FD8E979E68A4"
        );
    }

    #[test]
    fn value_item_round_trips_set_and_get() {
        let mut item = ValueItem(Value::Int(1));
        item.set_value(Value::Text("hi".into()));
        assert_eq!(item.get_value(), Value::Text("hi".into()));
    }
}
