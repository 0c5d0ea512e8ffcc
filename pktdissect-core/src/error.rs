//! Error types for pktdissect-core.
//!
//! Two families live here:
//!
//! - [`DissectError`] - the outcome of a failed read or a failed sanity check
//!   inside a single dissector. It never escapes [`crate::dissect_packet`];
//!   the dispatch loop turns it into a terminal [`crate::Stop`] state.
//! - [`enum@Error`] / [`PcapError`] - failures of the saved-capture reader.

use compact_str::CompactString;
use thiserror::Error;

/// Main error type for capture-file operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading or parsing a capture file
    #[error("PCAP error: {0}")]
    Pcap(#[from] PcapError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to capture file reading.
#[derive(Error, Debug)]
pub enum PcapError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Invalid PCAP format
    #[error("Invalid PCAP format: {reason}")]
    InvalidFormat { reason: String },
}

/// Why a dissector stopped decoding its layer.
///
/// `Truncated` means the bytes simply were not captured (snaplen cut the
/// frame short). `Malformed` means the bytes are there but the lengths or
/// counts inside them contradict each other.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DissectError {
    /// A read needed bytes beyond the captured region.
    ///
    /// `offset` is absolute within the frame; `available` is how many
    /// captured bytes remained at that offset.
    #[error("truncated: need {needed} bytes at offset {offset}, {available} captured")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Lengths or counts are internally inconsistent.
    #[error("malformed: {reason}")]
    Malformed { reason: CompactString },
}

impl DissectError {
    /// Shorthand for building a [`DissectError::Malformed`].
    pub fn malformed(reason: impl Into<CompactString>) -> Self {
        DissectError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DissectError::Truncated { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, DissectError::Malformed { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
