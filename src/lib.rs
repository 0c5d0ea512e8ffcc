//! pktdissect - print bounds-checked protocol dissections of capture files.
//!
//! The dissection engine lives in [`pktdissect_core`]; this crate adds the
//! command-line front end.
//!
//! # Example
//!
//! ```no_run
//! use pktdissect::core::prelude::*;
//!
//! let config = DissectConfig::default();
//! let mut reader = CaptureReader::open("capture.pcap")?;
//! while let Some(packet) = reader.next_packet()? {
//!     println!("{}", dissect_packet(default_registry(), &config, packet.link_type, packet.capture()));
//! }
//! # Ok::<(), pktdissect::core::Error>(())
//! ```

pub mod cli;

pub use pktdissect_core as core;
pub use pktdissect_core::{Error, Result};
