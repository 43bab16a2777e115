// SPDX-License-Identifier: MIT OR Apache-2.0
//! Byte-to-text transports: [`hex`] and [`base64`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod base64;
pub mod hex;
