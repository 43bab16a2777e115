// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON writer: drives a [`Package`] through the inventory send-side loop
//! (spec.md §4.3) and renders it as JSON text.

use std::io::Write;

use activeser_buffer::BufferOut;
use activeser_core::{Cargo, Entry, Inventory, Package, Role, Value};
use activeser_error::Result;

use crate::options::WriteOptions;

/// Serialise `package` as a JSON document.
pub fn send<W: Write>(package: &dyn Package, out: &mut BufferOut<W>, options: &WriteOptions) -> Result<()> {
    write_package(package, out, options, 0)
}

fn newline_indent<W: Write>(out: &mut BufferOut<W>, options: &WriteOptions, depth: usize) -> Result<()> {
    if options.tabbed || options.line_feeds {
        out.put('\n')?;
        if options.tabbed {
            for _ in 0..depth {
                out.put('\t')?;
            }
        }
    }
    Ok(())
}

fn write_package<W: Write>(
    pkg: &dyn Package,
    out: &mut BufferOut<W>,
    options: &WriteOptions,
    depth: usize,
) -> Result<()> {
    let mut inventory = Inventory::new();
    pkg.fill_inventory(&mut inventory);
    if inventory.len() == 1 && inventory.iter().next().expect("len==1").identity.role == Role::Array {
        let entry = inventory.iter().next().expect("len==1").clone();
        write_array(pkg, &entry, out, options, depth)
    } else {
        write_object(pkg, &inventory, out, options, depth)
    }
}

/// Emit `entry`'s published count of existing elements (set by the
/// package's own `fill_inventory`, not discovered by probing), per
/// spec.md §4.3 ("iterate `i = 0 .. entry.available-1`").
fn write_array<W: Write>(
    pkg: &dyn Package,
    entry: &Entry,
    out: &mut BufferOut<W>,
    options: &WriteOptions,
    depth: usize,
) -> Result<()> {
    out.put('[')?;
    let mut first = true;
    for available in 0..entry.available {
        let mut slot = entry.clone();
        slot.available = available;
        let child = pkg.get_cargo(&slot);
        if matches!(child, Cargo::Null) {
            break;
        }
        if !first {
            out.put(',')?;
        }
        newline_indent(out, options, depth + 1)?;
        write_cargo(&child, out, options, depth + 1)?;
        first = false;
    }
    if !first {
        newline_indent(out, options, depth)?;
    }
    out.put(']')
}

fn write_object<W: Write>(
    pkg: &dyn Package,
    inventory: &Inventory,
    out: &mut BufferOut<W>,
    options: &WriteOptions,
    depth: usize,
) -> Result<()> {
    out.put('{')?;
    let mut first = true;
    for entry in inventory.iter() {
        if !first {
            out.put(',')?;
        }
        newline_indent(out, options, depth + 1)?;
        write_key(entry, out, options)?;
        out.put(':')?;
        if entry.identity.role == Role::Array {
            write_array(pkg, entry, out, options, depth + 1)?;
        } else {
            let child = pkg.get_cargo(entry);
            write_cargo(&child, out, options, depth + 1)?;
        }
        first = false;
    }
    if !first {
        newline_indent(out, options, depth)?;
    }
    out.put('}')
}

fn write_cargo<W: Write>(cargo: &Cargo, out: &mut BufferOut<W>, options: &WriteOptions, depth: usize) -> Result<()> {
    match cargo {
        Cargo::Null => out.put_str("null"),
        Cargo::Item(item) => write_value(&item.get_value(), out),
        Cargo::Package(pkg) => write_package(pkg.as_ref(), out, options, depth),
    }
}

fn write_key<W: Write>(entry: &Entry, out: &mut BufferOut<W>, options: &WriteOptions) -> Result<()> {
    out.put('"')?;
    if options.namespaces {
        if let Some(group) = &entry.identity.group {
            write_escaped(group, out)?;
            out.put(':')?;
        }
    }
    write_escaped(&entry.identity.name, out)?;
    out.put('"')
}

fn write_value<W: Write>(value: &Value, out: &mut BufferOut<W>) -> Result<()> {
    match value {
        Value::Null => out.put_str("null"),
        Value::Bool(b) => out.put_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.put_str(&i.to_string()),
        Value::Float(f) => out.put_str(&f.to_string()),
        Value::Text(s) => {
            out.put('"')?;
            write_escaped(s, out)?;
            out.put('"')
        }
        Value::Guid(_) | Value::DateTime(_) => {
            out.put('"')?;
            write_escaped(&value.to_text(), out)?;
            out.put('"')
        }
    }
}

/// Escape `\\` first, then the remaining reserved characters, so a
/// backslash introduced by escaping is never re-escaped.
fn write_escaped<W: Write>(text: &str, out: &mut BufferOut<W>) -> Result<()> {
    for ch in text.chars() {
        match ch {
            '\\' => out.put_str("\\\\")?,
            '"' => out.put_str("\\\"")?,
            '\u{8}' => out.put_str("\\b")?,
            '\u{c}' => out.put_str("\\f")?,
            '\n' => out.put_str("\\n")?,
            '\r' => out.put_str("\\r")?,
            '\t' => out.put_str("\\t")?,
            c if (c as u32) < 0x20 => out.put_str(&format!("\\u{:04x}", c as u32))?,
            c => out.put(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use activeser_core::{Identity, ValueItem};
    use activeser_encoding::DataFormat;

    struct Leaf(Value);

    impl Package for Leaf {
        fn fill_inventory(&self, inventory: &mut Inventory) {
            inventory.push(Identity::element("value"));
        }

        fn get_cargo(&self, _entry: &Entry) -> Cargo {
            Cargo::Item(Box::new(ValueItem(self.0.clone())))
        }

        fn insert(&mut self, _entry: &Entry, _cargo: Cargo) -> Result<()> {
            Ok(())
        }
    }

    fn render(pkg: &dyn Package, options: &WriteOptions) -> String {
        let mut bytes = Vec::new();
        {
            let mut out = BufferOut::new(&mut bytes, DataFormat::default());
            send(pkg, &mut out, options).unwrap();
            out.flush().unwrap();
        }
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn single_element_object_renders_compact() {
        let text = render(&Leaf(Value::Text("hi".into())), &WriteOptions::default());
        assert_eq!(text, r#"{"value":"hi"}"#);
    }

    #[test]
    fn control_characters_are_escaped() {
        let text = render(&Leaf(Value::Text("a\tb\nc".into())), &WriteOptions::default());
        assert_eq!(text, r#"{"value":"a\tb\nc"}"#);
    }

    #[test]
    fn pretty_option_adds_newlines_and_tabs() {
        let text = render(&Leaf(Value::Int(1)), &WriteOptions::pretty());
        assert_eq!(text, "{\n\t\"value\":1\n}");
    }
}
