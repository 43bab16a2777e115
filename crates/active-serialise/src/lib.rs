// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-dependency facade over the `active-serialise` workspace: the
//! inventory/cargo protocol (`activeser-core`), the JSON and XML
//! transports, the streaming byte buffer, and the hex/base64 codecs.
//!
//! Most consumers only need this crate. Depend on a leaf crate directly
//! (e.g. `activeser-codec` alone) only when pulling in the rest would be
//! dead weight.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use activeser_core::{check_required, Cargo, Entry, Identity, Inventory, Item, Role, Unknown, Value, ValueItem};
pub use activeser_error::{Category, Code, ParseError, Position, Result};

pub use activeser_buffer::{BufferIn, BufferOut, FoundPolicy, Source};
pub use activeser_encoding::{DataFormat, Encoding};

/// Hex and Base64 byte/text transports.
pub use activeser_codec::{base64, hex};

/// The JSON transport, re-exported under its own module so `json::to_string`
/// and `xml::to_string` don't collide.
pub mod json {
    pub use activeser_json::*;
}

/// The XML transport, re-exported under its own module so `json::to_string`
/// and `xml::to_string` don't collide.
pub mod xml {
    pub use activeser_xml::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl activeser_core::Package for Point {
        fn fill_inventory(&self, inventory: &mut Inventory) {
            inventory.push(Identity::element("x")).required = true;
            inventory.push(Identity::element("y")).required = true;
        }

        fn get_cargo(&self, entry: &Entry) -> Cargo {
            match entry.identity.name.as_str() {
                "x" => Cargo::value(Value::Int(self.x)),
                "y" => Cargo::value(Value::Int(self.y)),
                _ => Cargo::Null,
            }
        }

        fn insert(&mut self, entry: &Entry, cargo: Cargo) -> Result<()> {
            let Cargo::Item(item) = cargo else {
                return Err(ParseError::new(Code::BadDestination, "expected a leaf value"));
            };
            let Value::Int(n) = item.get_value() else {
                return Err(ParseError::new(Code::BadValue, "expected an integer"));
            };
            match entry.identity.name.as_str() {
                "x" => self.x = n,
                "y" => self.y = n,
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn same_package_round_trips_through_both_transports() {
        let point = Point { x: 3, y: -4 };

        let as_json = json::to_string(&point, &json::WriteOptions::default()).unwrap();
        let mut from_json = Point::default();
        json::from_str(&mut from_json, &as_json, &json::ReadOptions::default()).unwrap();
        assert_eq!(from_json, point);

        let as_xml = xml::to_string(&point, &Identity::element("point"), &xml::WriteOptions::default()).unwrap();
        let mut from_xml = Point::default();
        xml::from_str(&mut from_xml, &Identity::element("point"), &as_xml, &xml::ReadOptions::default()).unwrap();
        assert_eq!(from_xml, point);
    }

    #[test]
    fn hex_and_base64_agree_on_the_same_bytes() {
        let bytes = b"active-serialise";
        assert_eq!(hex::decode(&hex::encode(bytes), None).unwrap(), bytes);
        assert_eq!(base64::decode(&base64::encode(bytes)).unwrap(), bytes);
    }
}
