// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`Package`] trait: the polymorphic self-description contract every
//! (de)serialisable object implements.

use activeser_error::{Code, ParseError, Result};

use crate::cargo::Cargo;
use crate::inventory::{Entry, Inventory};

/// A polymorphic, self-describing object a transport can read from or
/// write to.
///
/// A transport never knows the concrete type behind a `Package` — it
/// drives the protocol entirely through this trait: publish a schema
/// (`fill_inventory`), hand over cargo for each slot on the way out
/// (`get_cargo`), and accept cargo for each slot on the way in
/// (`insert`).
pub trait Package {
    /// Publish this package's schema into `inventory`.
    fn fill_inventory(&self, inventory: &mut Inventory);

    /// Produce the cargo to send for `entry` (an element/attribute/array
    /// slot published by [`Self::fill_inventory`]).
    fn get_cargo(&self, entry: &Entry) -> Cargo;

    /// Reset to default content, e.g. before reading a new instance into
    /// a reused package.
    fn set_default(&mut self) {}

    /// Accept incoming `cargo` for `entry`. Called once per occurrence —
    /// for an array-role entry this is called once per element.
    ///
    /// # Errors
    ///
    /// Returns [`Code::BadDestination`] if `cargo` cannot be accepted
    /// (wrong shape for the slot).
    fn insert(&mut self, entry: &Entry, cargo: Cargo) -> Result<()>;

    /// Validate the package's content after every slot has been read.
    /// The default accepts anything.
    ///
    /// # Errors
    ///
    /// Returns [`Code::InvalidObject`] when content fails a cross-field
    /// invariant the inventory alone can't express.
    fn validate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether this package must be offered its attributes before any
    /// element content (XML's attribute-first polymorphism, spec.md
    /// §4.5). Most packages don't care about ordering and leave this
    /// `false`.
    fn is_attribute_first(&self) -> bool {
        false
    }

    /// Called once all attributes have been read into an
    /// attribute-first package, before element content begins.
    ///
    /// # Errors
    ///
    /// Returns [`Code::InvalidObject`] if the attributes read so far are
    /// not a valid combination.
    fn finalise_attributes(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reject every slot outright, skipping all content offered to it. Used
/// as the destination for names/tags the unknown-policy allows to be
/// silently dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unknown;

impl Package for Unknown {
    fn fill_inventory(&self, _inventory: &mut Inventory) {}

    fn get_cargo(&self, _entry: &Entry) -> Cargo {
        Cargo::Null
    }

    fn insert(&mut self, _entry: &Entry, _cargo: Cargo) -> Result<()> {
        Ok(())
    }
}

/// Enforce the `everyEntryRequired`/`missingEntryFailed` policy against a
/// filled inventory: fail if any required entry was never filled.
///
/// # Errors
///
/// Returns [`Code::InventoryBoundsExceeded`] naming the first missing
/// required entry.
pub fn check_required(inventory: &Inventory) -> Result<()> {
    if let Some(entry) = inventory.missing_required().next() {
        return Err(ParseError::new(
            Code::InventoryBoundsExceeded,
            format!("required entry \"{}\" was never filled", entry.identity.name),
        ));
    }
    Ok(())
}
