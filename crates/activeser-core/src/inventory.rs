// SPDX-License-Identifier: MIT OR Apache-2.0
//! The ordered schema a package publishes: one [`Entry`] per slot it is
//! willing to send or receive.

use crate::identity::{Identity, Role};

/// One named, role-typed slot a [`crate::Package`] advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The slot's identity (name, group, role).
    pub identity: Identity,
    /// Position within the inventory, assigned at
    /// [`Inventory::push`] time; stable for the lifetime of one
    /// `fillInventory` call.
    pub index: usize,
    /// Whether the transport must fail the whole object if this slot is
    /// never filled (policy `everyEntryRequired`/`missingEntryFailed`
    /// controls whether that failure is raised).
    pub required: bool,
    /// Upper bound on how many occurrences this slot may receive.
    /// `None` means unbounded (only meaningful for [`Role::Array`]).
    pub maximum: Option<u32>,
    /// How many occurrences have been filled so far.
    pub available: u32,
}

impl Entry {
    /// A required, singly-occurring entry.
    #[must_use]
    pub fn new(identity: Identity, index: usize) -> Self {
        Self {
            identity,
            index,
            required: false,
            maximum: Some(1),
            available: 0,
        }
    }

    /// Mark this entry as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set an occurrence cap (`None` for unbounded).
    #[must_use]
    pub fn with_maximum(mut self, maximum: Option<u32>) -> Self {
        self.maximum = maximum;
        self
    }

    /// Whether another occurrence of this entry may still be accepted.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        match self.maximum {
            Some(max) => self.available < max,
            None => true,
        }
    }
}

/// The ordered set of slots a package publishes via `fillInventory`.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<Entry>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a new entry, assigning it the next index.
    pub fn push(&mut self, identity: Identity) -> &mut Entry {
        let index = self.entries.len();
        self.entries.push(Entry::new(identity, index));
        self.entries.last_mut().expect("just pushed")
    }

    /// Append a fully-constructed entry as-is (its `index` is overwritten
    /// to its position in this inventory).
    pub fn push_entry(&mut self, mut entry: Entry) {
        entry.index = self.entries.len();
        self.entries.push(entry);
    }

    /// Number of published slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slots have been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry matching `name`/`role`, if any.
    #[must_use]
    pub fn find(&self, name: &str, role: Role) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.identity.role == role && e.identity.matches_name(name))
    }

    /// Find the entry matching `name`/`role` for mutation (to record an
    /// occurrence).
    pub fn find_mut(&mut self, name: &str, role: Role) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.identity.role == role && e.identity.matches_name(name))
    }

    /// Iterate entries in publication order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Iterate entries in publication order for mutation (e.g. marking
    /// every entry required under the `everyEntryRequired` policy).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }

    /// Entries whose [`Role`] is [`Role::Attribute`], in publication
    /// order — the set an attribute-first package reads before any
    /// element content.
    pub fn attributes(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.identity.role == Role::Attribute)
    }

    /// Entries required but never filled (`available == 0`).
    pub fn missing_required(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.required && e.available == 0)
    }
}
