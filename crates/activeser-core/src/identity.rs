// SPDX-License-Identifier: MIT OR Apache-2.0
//! Names and roles: how an inventory slot presents itself to a transport.

/// How a slot's value is carried by the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A child element / object member (the common case).
    Element,
    /// An attribute of the enclosing element — meaningful to XML, folded
    /// into the enclosing JSON object by default.
    Attribute,
    /// A repeating slot: the same name may appear more than once, each
    /// occurrence filling one array/sequence entry.
    Array,
}

/// A name, optional namespace/prefix group, and role — identifies one
/// inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// The slot's name as it appears on the wire.
    pub name: String,
    /// An optional namespace prefix (XML) or grouping label. Opaque: this
    /// crate does not resolve `xmlns` URIs, it only compares prefix text.
    pub group: Option<String>,
    /// How the slot's value is carried.
    pub role: Role,
}

impl Identity {
    /// An element-role identity with no namespace group.
    #[must_use]
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            role: Role::Element,
        }
    }

    /// An attribute-role identity with no namespace group.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            role: Role::Attribute,
        }
    }

    /// An array-role identity with no namespace group.
    #[must_use]
    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            role: Role::Array,
        }
    }

    /// Attach a namespace/prefix group to this identity.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Whether `name` (ignoring any namespace prefix) matches this
    /// identity's name.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name
    }
}
