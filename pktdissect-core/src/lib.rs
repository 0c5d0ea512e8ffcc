//! # pktdissect-core
//!
//! Bounds-checked packet dissection: a checked byte cursor, a generic TLV
//! walker, a dispatch table keyed by link type, EtherType, IP protocol and
//! port, and decoders for the common link, network and transport protocols.
//!
//! Every read is checked against what was actually captured. A short or
//! inconsistent packet ends its dissection with a terminal state naming the
//! layer that stopped; it never panics and never reads past the capture.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pktdissect_core::prelude::*;
//!
//! let config = DissectConfig::default();
//! for packet in CaptureReader::open("capture.pcap")? {
//!     let packet = packet?;
//!     let dissection = dissect_packet(default_registry(), &config, packet.link_type, packet.capture());
//!     println!("{dissection}");
//! }
//! # Ok::<(), pktdissect_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        pktdissect-core                              |
//! +---------------------------------------------------------------------+
//! |  cursor      - bounds-checked big-endian reads over captured bytes  |
//! |  tlv         - type/length/value walker for option areas            |
//! |  tokens      - value-to-name tables, bit-flag strings               |
//! |  checksum    - Internet checksum and transport pseudo-headers       |
//! |  protocol/   - Dissector trait, registry, dispatch walk, decoders   |
//! |  format/     - text rendering of dissections                        |
//! |  pcap/       - PCAP/PCAPNG reading                                  |
//! |  error       - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Supported Protocols
//!
//! | Layer | Protocols |
//! |-------|-----------|
//! | Link | Ethernet II / 802.3, Linux cooked (SLL), raw IP, VLAN (802.1Q/802.1ad), LLDP |
//! | Network | IPv4, IPv6, ARP, ICMP |
//! | Transport | TCP, UDP, GRE |
//! | Application | DHCP/BOOTP |

pub mod bits;
pub mod capture;
pub mod checksum;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod pcap;
pub mod prelude;
pub mod protocol;
pub mod tlv;
pub mod tokens;

// Re-export commonly used types at crate root for convenience
pub use capture::{linktype, CaptureBuffer};
pub use checksum::{ChecksumStatus, PseudoHeader};
pub use config::{DissectConfig, Verbosity};
pub use cursor::Cursor;
pub use error::{DissectError, Error, PcapError, Result};
pub use pcap::{CaptureReader, RawPacket};
pub use protocol::{
    builtin_registry, default_registry, dissect, dissect_packet, Addressing, Decoded, DispatchKey,
    DissectContext, Dissection, Dissector, DissectorRegistry, FieldEntry, FieldValue, FrameInfo, Handoff,
    Layer, Note, OptionEntry, Stop, Transport, TunnelLayer, TunnelType,
};
pub use tlv::{TlvRecord, TlvShape, TlvWalker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
