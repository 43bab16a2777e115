// SPDX-License-Identifier: MIT OR Apache-2.0
//! A JSON reader/writer that reconciles a token stream with a
//! [`Package`]'s published [`activeser_core::Inventory`] (spec.md §4.4).
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod options;
mod read;
mod scan;
mod write;

use activeser_buffer::{BufferIn, BufferOut};
use activeser_core::Package;
use activeser_encoding::DataFormat;
use activeser_error::Result;
use tracing::{debug, warn};

pub use options::{ReadOptions, WriteOptions};
pub use read::receive;
pub use write::send;

/// Serialise `package` as a JSON document, returning it as a `String`.
pub fn to_string(package: &dyn Package, options: &WriteOptions) -> Result<String> {
    debug!(target: "activeser.json", "sending package");
    let mut bytes = Vec::new();
    {
        let mut out = BufferOut::new(&mut bytes, DataFormat::default());
        if let Err(err) = send(package, &mut out, options) {
            warn!(target: "activeser.json", error = %err, "send failed");
            return Err(err);
        }
        out.flush()?;
    }
    Ok(String::from_utf8(bytes).expect("writer only emits UTF-8 when DataFormat::default() is used"))
}

/// Parse a JSON document out of `text` into `package`.
pub fn from_str(package: &mut dyn Package, text: &str, options: &ReadOptions) -> Result<()> {
    debug!(target: "activeser.json", len = text.len(), "receiving package");
    let mut buf = BufferIn::new(text.as_bytes())?;
    receive(package, &mut buf, options).inspect_err(|err| {
        warn!(target: "activeser.json", error = %err, row = err.position.map(|p| p.row), "receive failed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use activeser_core::{Cargo, Entry, Identity, Inventory, Role, Value};
    use activeser_error::Code;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Bar {
        id: i64,
        text: String,
    }

    impl Package for Bar {
        fn fill_inventory(&self, inventory: &mut Inventory) {
            inventory.push(Identity::element("id")).required = true;
            inventory.push(Identity::element("text")).required = true;
        }

        fn get_cargo(&self, entry: &Entry) -> Cargo {
            match entry.identity.name.as_str() {
                "id" => Cargo::value(Value::Int(self.id)),
                "text" => Cargo::value(Value::Text(self.text.clone())),
                _ => Cargo::Null,
            }
        }

        fn insert(&mut self, entry: &Entry, cargo: Cargo) -> Result<()> {
            let Cargo::Item(item) = cargo else {
                return Err(activeser_error::ParseError::new(Code::BadDestination, "expected a leaf value"));
            };
            match (entry.identity.name.as_str(), item.get_value()) {
                ("id", Value::Int(n)) => self.id = n,
                ("text", Value::Text(s)) => self.text = s,
                _ => {
                    return Err(activeser_error::ParseError::new(Code::BadValue, "wrong shape for entry"))
                }
            }
            Ok(())
        }
    }

    /// Read back every field `child` currently holds, by driving its own
    /// `get_cargo` — staying inside the `Package` protocol rather than
    /// downcasting the trait object.
    fn snapshot_bar(child: &dyn Package) -> Bar {
        let mut inventory = Inventory::new();
        child.fill_inventory(&mut inventory);
        let mut bar = Bar::default();
        for entry in inventory.iter() {
            if let Cargo::Item(item) = child.get_cargo(entry) {
                let _ = bar.insert(entry, Cargo::Item(item));
            }
        }
        bar
    }

    #[derive(Debug, Default)]
    struct Foo {
        name: String,
        bar: Bar,
        tags: Vec<String>,
    }

    impl Package for Foo {
        fn fill_inventory(&self, inventory: &mut Inventory) {
            inventory.push(Identity::element("name")).required = true;
            inventory.push(Identity::element("bar")).required = true;
            let tags = inventory.push(Identity::array("tags"));
            tags.maximum = None;
            tags.available = self.tags.len() as u32;
        }

        fn get_cargo(&self, entry: &Entry) -> Cargo {
            match entry.identity.role {
                // Existing elements (write) are read back by index; any
                // index past current content (read) gets a fresh blank
                // slot for `insert` to fill.
                Role::Array => match self.tags.get(entry.available as usize) {
                    Some(t) => Cargo::value(Value::Text(t.clone())),
                    None => Cargo::value(Value::Text(String::new())),
                },
                _ => match entry.identity.name.as_str() {
                    "name" => Cargo::value(Value::Text(self.name.clone())),
                    "bar" => Cargo::Package(Box::new(self.bar.clone())),
                    _ => Cargo::Null,
                },
            }
        }

        fn insert(&mut self, entry: &Entry, cargo: Cargo) -> Result<()> {
            if entry.identity.role == Role::Array {
                let Cargo::Item(item) = cargo else {
                    return Err(activeser_error::ParseError::new(Code::BadDestination, "expected a tag string"));
                };
                let Value::Text(s) = item.get_value() else {
                    return Err(activeser_error::ParseError::new(Code::BadValue, "expected text"));
                };
                self.tags.push(s);
                return Ok(());
            }
            match entry.identity.name.as_str() {
                "name" => {
                    let Cargo::Item(item) = cargo else {
                        return Err(activeser_error::ParseError::new(Code::BadDestination, "expected a leaf value"));
                    };
                    let Value::Text(s) = item.get_value() else {
                        return Err(activeser_error::ParseError::new(Code::BadValue, "expected text"));
                    };
                    self.name = s;
                }
                "bar" => {
                    let Cargo::Package(child) = cargo else {
                        return Err(activeser_error::ParseError::new(Code::BadDestination, "expected a nested object"));
                    };
                    self.bar = snapshot_bar(child.as_ref());
                }
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn nested_package_round_trips_through_json_text() {
        let foo = Foo {
            name: "widget".into(),
            bar: Bar { id: 7, text: "inner".into() },
            tags: vec!["a".into(), "b".into(), "c".into()],
        };
        let text = to_string(&foo, &WriteOptions::default()).unwrap();

        let mut back = Foo::default();
        from_str(&mut back, &text, &ReadOptions::default()).unwrap();

        assert_eq!(back.name, "widget");
        assert_eq!(back.bar, Bar { id: 7, text: "inner".into() });
        assert_eq!(back.tags, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn pretty_printed_output_round_trips_identically() {
        let foo = Foo {
            name: "widget".into(),
            bar: Bar { id: 1, text: "x".into() },
            tags: vec![],
        };
        let text = to_string(&foo, &WriteOptions::pretty()).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains('\t'));

        let mut back = Foo::default();
        from_str(&mut back, &text, &ReadOptions::default()).unwrap();
        assert_eq!(back.name, "widget");
    }

    #[test]
    fn unknown_name_raises_with_position_by_default() {
        let text = r#"{
  "name": "widget",
  "verte": "oops",
  "bar": { "id": 1, "text": "x" }
}"#;
        let mut foo = Foo::default();
        let err = from_str(&mut foo, text, &ReadOptions::default()).unwrap_err();
        assert_eq!(err.code, Code::UnknownName);
        assert_eq!(err.position.unwrap().row, 3);
    }

    #[test]
    fn unknown_name_is_skipped_when_policy_allows() {
        let text = r#"{"name":"widget","verte":{"nested":[1,2,3]},"bar":{"id":1,"text":"x"}}"#;
        let mut foo = Foo::default();
        let options = ReadOptions {
            unknown_name_skipped: true,
            ..ReadOptions::default()
        };
        from_str(&mut foo, text, &options).unwrap();
        assert_eq!(foo.name, "widget");
        assert_eq!(foo.bar.id, 1);
    }

    #[test]
    fn missing_required_entry_fails_by_default() {
        let text = r#"{"name":"widget"}"#;
        let mut foo = Foo::default();
        let err = from_str(&mut foo, text, &ReadOptions::default()).unwrap_err();
        assert_eq!(err.code, Code::InventoryBoundsExceeded);
    }
}
