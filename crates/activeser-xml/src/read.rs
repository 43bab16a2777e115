// SPDX-License-Identifier: MIT OR Apache-2.0
//! XML reader: drives a [`Package`] through the inventory receive-side
//! loop (spec.md §4.3), including the attribute-first protocol used by
//! polymorphic wrappers.
//!
//! Unlike a token-at-a-time reader, [`crate::scan::parse_start_tag`]
//! already collects a tag's full attribute list before any element
//! content is read, so the "read a restore point, rewind, re-enter"
//! dance spec.md §4.3 describes for interleaved attribute/element
//! streams isn't needed here: attributes are simply applied in full
//! before `finalise_attributes` is called.

use activeser_buffer::{BufferIn, Source};
use activeser_core::{check_required, Cargo, Entry, Identity, Inventory, Package, Role, Unknown, Value};
use activeser_error::{Code, ParseError, Result};

use crate::options::ReadOptions;
use crate::scan::{self, consume_literal, read_name, read_text_content, skip_until, skip_ws, StartTag};

/// Parse an XML document into `package`, whose root element is expected
/// to be named `identity.name`.
pub fn receive<S: Source>(
    package: &mut dyn Package,
    identity: &Identity,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    skip_prolog(buf, options)?;
    skip_ws(buf)?;
    scan::expect_char(buf, '<')?;
    let start = scan::parse_start_tag(buf)?;
    if !identity.name.is_empty() && start.name != identity.name {
        return Err(ParseError::new(
            Code::UnknownTag,
            format!("expected root element \"{}\", found \"{}\"", identity.name, start.name),
        )
        .at(buf.position()));
    }
    receive_tag_body(package, &start, buf, options)
}

/// Consume an optional `<?xml ...?>` prolog, comments, and unknown
/// processing instructions that precede the root element.
fn skip_prolog<S: Source>(buf: &mut BufferIn<S>, options: &ReadOptions) -> Result<()> {
    loop {
        skip_ws(buf)?;
        if buf.peek()? != Some('<') {
            return Ok(());
        }
        buf.get()?;
        match buf.peek()? {
            Some('?') => {
                buf.get()?;
                let target = read_name(buf)?;
                if target.eq_ignore_ascii_case("xml") || options.unknown_instruction_skipped {
                    skip_until(buf, "?>")?;
                } else {
                    return Err(ParseError::new(
                        Code::UnknownInstruction,
                        format!("unrecognised processing instruction \"{target}\""),
                    )
                    .at(buf.position()));
                }
            }
            Some('!') => {
                if consume_literal(buf, "--")? {
                    skip_until(buf, "-->")?;
                } else {
                    return Err(ParseError::new(Code::UnknownSection, "unrecognised \"<!\" section before root element")
                        .at(buf.position()));
                }
            }
            _ => {
                buf.rewind(1)?;
                return Ok(());
            }
        }
    }
}

/// Parse the content of a tag whose start tag has already been consumed:
/// attributes, attribute-first dispatch, body, and (if not self-closing)
/// the matching end tag.
fn receive_tag_body<S: Source>(
    pkg: &mut dyn Package,
    start: &StartTag,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    let mut inventory = Inventory::new();
    pkg.fill_inventory(&mut inventory);
    if inventory.is_empty() {
        return Err(ParseError::new(Code::MissingInventory, "package published an empty inventory").at(buf.position()));
    }
    apply_attributes(pkg, &mut inventory, &start.attributes, buf, options)?;

    if pkg.is_attribute_first() {
        pkg.finalise_attributes()?;
        inventory = Inventory::new();
        pkg.fill_inventory(&mut inventory);
    }

    if options.every_entry_required {
        for entry in inventory.iter_mut() {
            entry.required = true;
        }
    }

    if start.self_closing {
        if options.missing_entry_failed {
            check_required(&inventory)?;
        }
        return pkg.validate();
    }

    let non_attr: Vec<Entry> = inventory.iter().filter(|e| e.identity.role != Role::Attribute).cloned().collect();

    if non_attr.len() == 1 && non_attr[0].identity.role == Role::Array {
        receive_array_body(pkg, &non_attr[0], &start.name, buf, options)?;
    } else if non_attr.len() == 1 && non_attr[0].identity.name == start.name {
        receive_passthrough_body(pkg, &non_attr[0], &start.name, buf, options)?;
    } else {
        receive_object_body(pkg, &mut inventory, &start.name, buf, options)?;
    }

    pkg.validate()
}

fn apply_attributes<S: Source>(
    pkg: &mut dyn Package,
    inventory: &mut Inventory,
    attributes: &[(String, String)],
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    for (name, value) in attributes {
        let Some(entry) = inventory.find(name, Role::Attribute).cloned() else {
            if options.unknown_name_skipped {
                continue;
            }
            return Err(ParseError::new(Code::UnknownName, format!("unexpected attribute \"{name}\"")).at(buf.position()));
        };
        if !entry.has_capacity() {
            return Err(ParseError::new(
                Code::InventoryBoundsExceeded,
                format!("attribute \"{name}\" exceeded its maximum"),
            )
            .at(buf.position()));
        }
        let mut cargo = pkg.get_cargo(&entry);
        let Cargo::Item(item) = &mut cargo else {
            return Err(ParseError::new(Code::BadDestination, format!("attribute \"{name}\" expects a leaf value"))
                .at(buf.position()));
        };
        item.set_value(Value::Text(value.clone()));
        pkg.insert(&entry, cargo)?;
        if let Some(e) = inventory.find_mut(name, Role::Attribute) {
            e.available += 1;
            e.required = false;
        }
    }
    Ok(())
}

/// Fill a freshly obtained cargo slot from the tag just parsed (`start`)
/// — a leaf reads its text content, a package recurses, and a slot the
/// package declined (`Cargo::Null`) has its subtree discarded.
fn fill_child_cargo<S: Source>(
    cargo: &mut Cargo,
    start: &StartTag,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    match cargo {
        Cargo::Null => {
            if !start.self_closing {
                discard_subtree(buf, &start.name)?;
            }
        }
        Cargo::Item(item) => {
            if start.self_closing {
                item.set_value(Value::Null);
            } else {
                let text = read_text_content(buf)?;
                item.set_value(Value::Text(text));
                expect_end_tag(buf, &start.name)?;
            }
        }
        Cargo::Package(child) => receive_tag_body(child.as_mut(), start, buf, options)?,
    }
    Ok(())
}

/// Consume and discard an already-opened element's content through its
/// matching end tag, for subtrees an `Unknown` sink or a declined slot
/// has no interest in.
fn discard_subtree<S: Source>(buf: &mut BufferIn<S>, tag_name: &str) -> Result<()> {
    let mut sink = Unknown;
    let lenient = ReadOptions {
        unknown_name_skipped: true,
        missing_entry_failed: false,
        ..ReadOptions::default()
    };
    receive_object_body(&mut sink, &mut Inventory::new(), tag_name, buf, &lenient)
}

fn expect_end_tag<S: Source>(buf: &mut BufferIn<S>, expected: &str) -> Result<()> {
    skip_ws(buf)?;
    scan::expect_char(buf, '<')?;
    scan::expect_char(buf, '/')?;
    let name = scan::parse_end_tag(buf)?;
    if name != expected {
        return Err(ParseError::new(
            Code::ClosingTagMissing,
            format!("expected closing tag \"</{expected}>\", found \"</{name}>\""),
        )
        .at(buf.position()));
    }
    Ok(())
}

fn receive_array_body<S: Source>(
    pkg: &mut dyn Package,
    entry: &Entry,
    tag_name: &str,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    let mut available = 0u32;
    loop {
        skip_ws(buf)?;
        match buf.peek()? {
            Some('<') => {
                buf.get()?;
                if buf.peek()? == Some('/') {
                    buf.get()?;
                    let end_name = scan::parse_end_tag(buf)?;
                    if end_name != tag_name {
                        return Err(ParseError::new(
                            Code::ClosingTagMissing,
                            format!("expected closing tag \"</{tag_name}>\", found \"</{end_name}>\""),
                        )
                        .at(buf.position()));
                    }
                    break;
                }
                let child_start = scan::parse_start_tag(buf)?;
                if child_start.name != entry.identity.name {
                    if options.unknown_name_skipped {
                        if !child_start.self_closing {
                            discard_subtree(buf, &child_start.name)?;
                        }
                        continue;
                    }
                    return Err(ParseError::new(Code::UnknownTag, format!("unexpected element \"{}\"", child_start.name))
                        .at(buf.position()));
                }
                if let Some(max) = entry.maximum {
                    if available >= max {
                        return Err(ParseError::new(
                            Code::InventoryBoundsExceeded,
                            format!("entry \"{}\" exceeded its maximum of {max}", entry.identity.name),
                        )
                        .at(buf.position()));
                    }
                }
                let mut slot = entry.clone();
                slot.available = available;
                let mut child = pkg.get_cargo(&slot);
                fill_child_cargo(&mut child, &child_start, buf, options)?;
                pkg.insert(&slot, child)?;
                available += 1;
            }
            None => return Err(ParseError::new(Code::IncompleteContext, "element never closed").at(buf.position())),
            Some(_) => {
                let text = read_text_content(buf)?;
                if !text.trim().is_empty() {
                    return Err(ParseError::new(Code::BadElement, "unexpected character data between array elements")
                        .at(buf.position()));
                }
            }
        }
    }
    if options.missing_entry_failed && entry.required && available == 0 {
        return Err(ParseError::new(
            Code::InventoryBoundsExceeded,
            format!("required entry \"{}\" was never filled", entry.identity.name),
        )
        .at(buf.position()));
    }
    Ok(())
}

fn receive_passthrough_body<S: Source>(
    pkg: &mut dyn Package,
    entry: &Entry,
    tag_name: &str,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    let mut child = pkg.get_cargo(entry);
    match &mut child {
        Cargo::Item(item) => {
            let text = read_text_content(buf)?;
            item.set_value(Value::Text(text));
            expect_end_tag(buf, tag_name)?;
        }
        Cargo::Package(child_pkg) => {
            skip_ws(buf)?;
            scan::expect_char(buf, '<')?;
            let inner_start = scan::parse_start_tag(buf)?;
            if inner_start.name != entry.identity.name {
                return Err(ParseError::new(Code::UnknownTag, format!("unexpected element \"{}\"", inner_start.name))
                    .at(buf.position()));
            }
            receive_tag_body(child_pkg.as_mut(), &inner_start, buf, options)?;
            expect_end_tag(buf, tag_name)?;
        }
        Cargo::Null => {
            discard_subtree(buf, tag_name)?;
        }
    }
    let mut slot = entry.clone();
    slot.available = 1;
    pkg.insert(&slot, child)
}

fn receive_object_body<S: Source>(
    pkg: &mut dyn Package,
    inventory: &mut Inventory,
    tag_name: &str,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    loop {
        skip_ws(buf)?;
        match buf.peek()? {
            Some('<') => {
                buf.get()?;
                match buf.peek()? {
                    Some('/') => {
                        buf.get()?;
                        let end_name = scan::parse_end_tag(buf)?;
                        if end_name != tag_name {
                            return Err(ParseError::new(
                                Code::ClosingTagMissing,
                                format!("expected closing tag \"</{tag_name}>\", found \"</{end_name}>\""),
                            )
                            .at(buf.position()));
                        }
                        break;
                    }
                    Some('!') => {
                        if consume_literal(buf, "--")? {
                            skip_until(buf, "-->")?;
                        } else {
                            return Err(ParseError::new(Code::UnknownSection, "unrecognised \"<!\" section")
                                .at(buf.position()));
                        }
                    }
                    Some('?') => {
                        buf.get()?;
                        let target = read_name(buf)?;
                        if options.unknown_instruction_skipped || target.eq_ignore_ascii_case("xml") {
                            skip_until(buf, "?>")?;
                        } else {
                            return Err(ParseError::new(
                                Code::UnknownInstruction,
                                format!("unrecognised processing instruction \"{target}\""),
                            )
                            .at(buf.position()));
                        }
                    }
                    _ => {
                        let child_start = scan::parse_start_tag(buf)?;
                        let name = child_start.name.clone();
                        let array_entry = inventory.find(&name, Role::Array).cloned();
                        let element_entry = inventory.find(&name, Role::Element).cloned();
                        match (array_entry, element_entry) {
                            (Some(entry), _) => {
                                if !entry.has_capacity() {
                                    return Err(ParseError::new(
                                        Code::InventoryBoundsExceeded,
                                        format!("entry \"{name}\" exceeded its maximum"),
                                    )
                                    .at(buf.position()));
                                }
                                let mut slot = entry.clone();
                                slot.available = entry.available;
                                let mut child = pkg.get_cargo(&slot);
                                fill_child_cargo(&mut child, &child_start, buf, options)?;
                                pkg.insert(&slot, child)?;
                                if let Some(e) = inventory.find_mut(&name, Role::Array) {
                                    e.available += 1;
                                    e.required = false;
                                }
                            }
                            (None, Some(entry)) => {
                                if !entry.has_capacity() {
                                    return Err(ParseError::new(
                                        Code::InventoryBoundsExceeded,
                                        format!("entry \"{name}\" exceeded its maximum"),
                                    )
                                    .at(buf.position()));
                                }
                                let mut child = pkg.get_cargo(&entry);
                                fill_child_cargo(&mut child, &child_start, buf, options)?;
                                pkg.insert(&entry, child)?;
                                if let Some(e) = inventory.find_mut(&name, Role::Element) {
                                    e.available += 1;
                                    e.required = false;
                                }
                            }
                            (None, None) => {
                                if options.unknown_name_skipped {
                                    if child_start.self_closing {
                                        // nothing further to discard
                                    } else {
                                        discard_subtree(buf, &child_start.name)?;
                                    }
                                } else {
                                    return Err(ParseError::new(Code::UnknownTag, format!("unexpected element \"{name}\""))
                                        .at(buf.position()));
                                }
                            }
                        }
                    }
                }
            }
            None => return Err(ParseError::new(Code::IncompleteContext, "element never closed").at(buf.position())),
            Some(_) => {
                let text = read_text_content(buf)?;
                if !text.trim().is_empty() {
                    return Err(ParseError::new(Code::BadElement, "unexpected character data in element content")
                        .at(buf.position()));
                }
            }
        }
    }
    if options.missing_entry_failed {
        check_required(inventory)?;
    }
    Ok(())
}
