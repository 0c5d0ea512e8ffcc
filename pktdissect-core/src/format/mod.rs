//! Formatting utilities for decoded values and whole dissections.
//!
//! - [`address`] renders MAC addresses, hex strings and OUIs
//! - [`text`] renders a [`crate::Dissection`] as lines of text

pub mod address;
pub mod text;

pub use address::{format_hex, format_hex_preview, format_mac, format_oui};
pub use text::write_dissection;
