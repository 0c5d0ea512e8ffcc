//! Saved-capture reading.
//!
//! [`CaptureReader`] yields [`RawPacket`]s from legacy PCAP and PCAPNG
//! files; [`RawPacket::capture`] turns one into a dissection input.

mod reader;

pub use reader::{CaptureReader, PcapFormat, RawPacket};
