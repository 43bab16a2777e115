// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON reader: drives a [`Package`] through the inventory receive-side
//! loop (spec.md §4.3).

use activeser_buffer::{BufferIn, Source};
use activeser_core::{check_required, Cargo, Inventory, Package, Role, Value};
use activeser_error::{Code, ParseError, Result};

use crate::options::ReadOptions;
use crate::scan::{expect_char, get, parse_literal_or_number, parse_string_body, peek, skip_value, skip_ws};

/// Parse a JSON document into `package`.
pub fn receive<S: Source>(package: &mut dyn Package, buf: &mut BufferIn<S>, options: &ReadOptions) -> Result<()> {
    receive_package(package, buf, options)
}

fn receive_package<S: Source>(pkg: &mut dyn Package, buf: &mut BufferIn<S>, options: &ReadOptions) -> Result<()> {
    let mut inventory = Inventory::new();
    pkg.fill_inventory(&mut inventory);
    if inventory.is_empty() {
        return Err(ParseError::new(Code::MissingInventory, "package published an empty inventory").at(buf.position()));
    }
    if options.every_entry_required {
        for entry in inventory.iter().map(|e| e.identity.name.clone()).collect::<Vec<_>>() {
            if let Some(e) = inventory.find_mut(&entry, Role::Element) {
                e.required = true;
            }
        }
    }
    if inventory.len() == 1 && inventory.iter().next().expect("len==1").identity.role == Role::Array {
        let entry = inventory.iter().next().expect("len==1").clone();
        receive_array(pkg, &entry, buf, options)?;
    } else {
        receive_object(pkg, &mut inventory, buf, options)?;
    }
    pkg.validate()
}

fn receive_array<S: Source>(
    pkg: &mut dyn Package,
    entry: &activeser_core::Entry,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    skip_ws(buf)?;
    expect_char(buf, '[')?;
    skip_ws(buf)?;
    if peek(buf)? == Some(']') {
        get(buf)?;
        return Ok(());
    }
    let mut available = 0u32;
    loop {
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
        receive_cargo(&mut child, buf, options)?;
        pkg.insert(&slot, child)?;
        available += 1;
        skip_ws(buf)?;
        match get(buf)? {
            Some(',') => {
                skip_ws(buf)?;
                continue;
            }
            Some(']') => break,
            Some(c) => {
                return Err(ParseError::new(Code::UnbalancedScope, format!("expected ',' or ']', found '{c}'"))
                    .at(buf.position()))
            }
            None => {
                return Err(ParseError::new(Code::IncompleteContext, "array never closed").at(buf.position()))
            }
        }
    }
    Ok(())
}

fn receive_object<S: Source>(
    pkg: &mut dyn Package,
    inventory: &mut Inventory,
    buf: &mut BufferIn<S>,
    options: &ReadOptions,
) -> Result<()> {
    skip_ws(buf)?;
    expect_char(buf, '{')?;
    skip_ws(buf)?;
    if peek(buf)? == Some('}') {
        get(buf)?;
        if options.missing_entry_failed {
            check_required(inventory)?;
        }
        return Ok(());
    }
    loop {
        skip_ws(buf)?;
        expect_char(buf, '"')?;
        let name = parse_string_body(buf)?;
        skip_ws(buf)?;
        expect_char(buf, ':')?;

        let array_entry = inventory.find(&name, Role::Array).cloned();
        let element_entry = inventory.find(&name, Role::Element).cloned();
        match (array_entry, element_entry) {
            (Some(entry), _) => {
                receive_array(pkg, &entry, buf, options)?;
                if let Some(e) = inventory.find_mut(&name, Role::Array) {
                    e.available = 1;
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
                receive_cargo(&mut child, buf, options)?;
                pkg.insert(&entry, child)?;
                if let Some(e) = inventory.find_mut(&name, Role::Element) {
                    e.available += 1;
                    e.required = false;
                }
            }
            (None, None) => {
                if options.unknown_name_skipped {
                    skip_value(buf)?;
                } else {
                    return Err(ParseError::new(Code::UnknownName, format!("unexpected key \"{name}\"")).at(buf.position()));
                }
            }
        }

        skip_ws(buf)?;
        match get(buf)? {
            Some(',') => continue,
            Some('}') => break,
            Some(c) => {
                return Err(ParseError::new(Code::UnbalancedScope, format!("expected ',' or '}}', found '{c}'"))
                    .at(buf.position()))
            }
            None => return Err(ParseError::new(Code::IncompleteContext, "object never closed").at(buf.position())),
        }
    }
    if options.missing_entry_failed {
        check_required(inventory)?;
    }
    Ok(())
}

fn receive_cargo<S: Source>(cargo: &mut Cargo, buf: &mut BufferIn<S>, options: &ReadOptions) -> Result<()> {
    match cargo {
        Cargo::Null => {
            skip_value(buf)?;
        }
        Cargo::Item(item) => {
            skip_ws(buf)?;
            let value = match peek(buf)? {
                Some('"') => {
                    get(buf)?;
                    Value::Text(parse_string_body(buf)?)
                }
                Some(_) => parse_literal_or_number(buf)?,
                None => return Err(ParseError::new(Code::ValueMissing, "expected a value").at(buf.position())),
            };
            item.set_value(value);
        }
        Cargo::Package(pkg) => {
            receive_package(pkg.as_mut(), buf, options)?;
        }
    }
    Ok(())
}
