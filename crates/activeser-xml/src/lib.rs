// SPDX-License-Identifier: MIT OR Apache-2.0
//! An XML reader/writer that reconciles a tag/attribute stream with a
//! [`Package`]'s published [`activeser_core::Inventory`] (spec.md §4.5),
//! including the attribute-first protocol polymorphic wrappers rely on
//! (spec.md §4.3, §8 scenario 6).
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod name;
mod options;
mod read;
mod scan;
mod write;

use activeser_buffer::{BufferIn, BufferOut};
use activeser_core::{Identity, Package};
use activeser_encoding::DataFormat;
use activeser_error::Result;
use tracing::{debug, warn};

pub use options::{ReadOptions, WriteOptions};
pub use read::receive;
pub use write::send;

/// Serialise `package` as an XML document rooted at `identity`, returning
/// it as a `String`.
pub fn to_string(package: &dyn Package, identity: &Identity, options: &WriteOptions) -> Result<String> {
    debug!(target: "activeser.xml", root = %identity.name, "sending package");
    let mut bytes = Vec::new();
    {
        let mut out = BufferOut::new(&mut bytes, DataFormat::default());
        if let Err(err) = send(package, identity, &mut out, options) {
            warn!(target: "activeser.xml", root = %identity.name, error = %err, "send failed");
            return Err(err);
        }
        out.flush()?;
    }
    Ok(String::from_utf8(bytes).expect("writer only emits UTF-8 when DataFormat::default() is used"))
}

/// Parse an XML document out of `text`, rooted at `identity`, into
/// `package`.
pub fn from_str(package: &mut dyn Package, identity: &Identity, text: &str, options: &ReadOptions) -> Result<()> {
    debug!(target: "activeser.xml", root = %identity.name, len = text.len(), "receiving package");
    let mut buf = BufferIn::new(text.as_bytes())?;
    receive(package, identity, &mut buf, options).inspect_err(|err| {
        warn!(target: "activeser.xml", root = %identity.name, error = %err, row = err.position.map(|p| p.row), "receive failed");
    })
}
