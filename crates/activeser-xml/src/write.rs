// SPDX-License-Identifier: MIT OR Apache-2.0
//! XML writer: drives a [`Package`] through the inventory send-side loop
//! (spec.md §4.3) and renders it as XML text.

use std::io::Write;

use activeser_buffer::BufferOut;
use activeser_core::{Cargo, Entry, Identity, Inventory, Package, Role};
use activeser_encoding::{DataFormat, Encoding};
use activeser_error::Result;

use crate::name;
use crate::options::WriteOptions;

/// Serialise `package` as an XML document rooted at `identity`.
pub fn send<W: Write>(package: &dyn Package, identity: &Identity, out: &mut BufferOut<W>, options: &WriteOptions) -> Result<()> {
    if options.prolog {
        out.put_str("<?xml version=\"1.0\" encoding=\"")?;
        out.put_str(encoding_name(out.format()))?;
        out.put_str("\"?>")?;
        out.put('\n')?;
    }
    write_element(package, identity, out, options, 0)
}

fn encoding_name(format: DataFormat) -> &'static str {
    match format.encoding {
        Encoding::Utf8 => "utf-8",
        Encoding::Utf16 => "utf-16",
        Encoding::Utf32 => "utf-32",
        Encoding::Ascii => "us-ascii",
        Encoding::Iso8859_1 => "iso-8859-1",
    }
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

fn write_element<W: Write>(
    pkg: &dyn Package,
    identity: &Identity,
    out: &mut BufferOut<W>,
    options: &WriteOptions,
    depth: usize,
) -> Result<()> {
    name::validate(&identity.name)?;
    let mut inventory = Inventory::new();
    pkg.fill_inventory(&mut inventory);

    let tag_name = if options.namespaces {
        name::join_prefix(identity.group.as_deref(), &identity.name)
    } else {
        identity.name.clone()
    };

    out.put('<')?;
    out.put_str(&tag_name)?;
    for entry in inventory.attributes() {
        if let Cargo::Item(item) = pkg.get_cargo(entry) {
            out.put(' ')?;
            out.put_str(&entry.identity.name)?;
            out.put_str("=\"")?;
            // Attribute values are written as-is; the caller supplies
            // escape-safe text (spec.md §9(b), not validated here).
            out.put_str(&item.get_value().to_text())?;
            out.put('"')?;
        }
    }

    let non_attr: Vec<&Entry> = inventory.iter().filter(|e| e.identity.role != Role::Attribute).collect();

    if non_attr.is_empty() {
        return out.put_str("/>");
    }

    if non_attr.len() == 1 && non_attr[0].identity.role == Role::Array {
        let entry = non_attr[0];
        if entry.available == 0 {
            return out.put_str("/>");
        }
        out.put('>')?;
        for available in 0..entry.available {
            let mut slot = entry.clone();
            slot.available = available;
            let child = pkg.get_cargo(&slot);
            newline_indent(out, options, depth + 1)?;
            write_child(&child, &entry.identity.name, out, options, depth + 1)?;
        }
        newline_indent(out, options, depth)?;
        return write_close(out, &tag_name);
    }

    if non_attr.len() == 1 && non_attr[0].identity.name == identity.name {
        let entry = non_attr[0];
        let cargo = pkg.get_cargo(entry);
        return match cargo {
            Cargo::Null => out.put_str("/>"),
            Cargo::Item(item) => {
                out.put('>')?;
                out.put_str(&name::escape_text(&item.get_value().to_text()))?;
                write_close(out, &tag_name)
            }
            Cargo::Package(child) => {
                out.put('>')?;
                newline_indent(out, options, depth + 1)?;
                write_element(child.as_ref(), &entry.identity, out, options, depth + 1)?;
                newline_indent(out, options, depth)?;
                write_close(out, &tag_name)
            }
        };
    }

    out.put('>')?;
    for entry in &non_attr {
        if entry.identity.role == Role::Array {
            for available in 0..entry.available {
                let mut slot = (*entry).clone();
                slot.available = available;
                let child = pkg.get_cargo(&slot);
                newline_indent(out, options, depth + 1)?;
                write_child(&child, &entry.identity.name, out, options, depth + 1)?;
            }
        } else {
            let child = pkg.get_cargo(entry);
            if matches!(child, Cargo::Null) {
                continue;
            }
            newline_indent(out, options, depth + 1)?;
            write_child(&child, &entry.identity.name, out, options, depth + 1)?;
        }
    }
    newline_indent(out, options, depth)?;
    write_close(out, &tag_name)
}

fn write_close<W: Write>(out: &mut BufferOut<W>, tag_name: &str) -> Result<()> {
    out.put_str("</")?;
    out.put_str(tag_name)?;
    out.put('>')
}

fn write_child<W: Write>(cargo: &Cargo, child_name: &str, out: &mut BufferOut<W>, options: &WriteOptions, depth: usize) -> Result<()> {
    match cargo {
        Cargo::Null => Ok(()),
        Cargo::Item(item) => {
            out.put('<')?;
            out.put_str(child_name)?;
            out.put('>')?;
            out.put_str(&name::escape_text(&item.get_value().to_text()))?;
            write_close(out, child_name)
        }
        Cargo::Package(pkg) => write_element(pkg.as_ref(), &Identity::element(child_name), out, options, depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activeser_core::{Identity, Value, ValueItem};

    struct Leaf(Value);

    impl Package for Leaf {
        fn fill_inventory(&self, inventory: &mut Inventory) {
            inventory.push(Identity::element("leaf")).required = true;
        }

        fn get_cargo(&self, _entry: &Entry) -> Cargo {
            Cargo::Item(Box::new(ValueItem(self.0.clone())))
        }

        fn insert(&mut self, _entry: &Entry, _cargo: Cargo) -> Result<()> {
            Ok(())
        }
    }

    fn render(pkg: &dyn Package, identity: &Identity, options: &WriteOptions) -> String {
        let mut bytes = Vec::new();
        {
            let mut out = BufferOut::new(&mut bytes, DataFormat::default());
            send(pkg, identity, &mut out, options).unwrap();
            out.flush().unwrap();
        }
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn passthrough_entry_renders_as_own_text_content() {
        let text = render(&Leaf(Value::Text("hi".into())), &Identity::element("leaf"), &WriteOptions::default());
        assert_eq!(text, "<leaf>hi</leaf>");
    }

    #[test]
    fn reserved_characters_are_entity_escaped() {
        let text = render(&Leaf(Value::Text("a<b>c&d".into())), &Identity::element("leaf"), &WriteOptions::default());
        assert_eq!(text, "<leaf>a&lt;b&gt;c&amp;d</leaf>");
    }

    #[test]
    fn prolog_names_the_output_encoding() {
        let mut bytes = Vec::new();
        {
            let mut out = BufferOut::new(&mut bytes, DataFormat::default());
            send(&Leaf(Value::Int(1)), &Identity::element("leaf"), &mut out, &WriteOptions::pretty()).unwrap();
            out.flush().unwrap();
        }
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
    }
}
