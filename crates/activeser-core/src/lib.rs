// SPDX-License-Identifier: MIT OR Apache-2.0
//! The inventory/cargo protocol: the schema-driven, bidirectional
//! self-description contract every transport (JSON, XML, …) drives.
//!
//! A [`Package`] publishes an ordered [`Inventory`] of named, role-typed
//! [`Entry`] slots. A transport walks that inventory, exchanging
//! [`Cargo`] — a leaf [`Value`] wrapped in an [`Item`], a nested
//! `Package`, or nothing — for each slot, in either direction.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cargo;
mod identity;
mod inventory;
mod package;

pub use cargo::{Cargo, Item, Value, ValueItem};
pub use identity::{Identity, Role};
pub use inventory::{Entry, Inventory};
pub use package::{check_required, Package, Unknown};
