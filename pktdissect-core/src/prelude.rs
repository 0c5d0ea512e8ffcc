//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```rust
//! use pktdissect_core::prelude::*;
//!
//! let config = DissectConfig::default().with_verbosity(Verbosity::Brief);
//! let dissection = dissect_packet(default_registry(), &config, linktype::RAW, CaptureBuffer::from_slice(&[0x45]));
//! assert!(matches!(dissection.stop, Stop::Truncated { protocol: "ipv4", .. }));
//! ```

// Dissection
pub use crate::capture::{linktype, CaptureBuffer};
pub use crate::config::{DissectConfig, Verbosity};
pub use crate::protocol::{
    default_registry, dissect_packet, Dissection, Dissector, DissectorRegistry, FieldValue,
    Layer, Stop,
};

// Capture files
pub use crate::pcap::{CaptureReader, RawPacket};

// Error types
pub use crate::error::{DissectError, Error, Result};
