//! The result of dissecting one frame.

use super::registry::DispatchKey;
use super::Layer;
use crate::config::Verbosity;
use crate::error::DissectError;

/// Capture metadata of the dissected frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub link_type: u16,
    pub captured_length: usize,
    pub on_wire_length: usize,
}

/// How the encapsulation walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop<'a> {
    /// A leaf layer was reached. `payload` holds the captured bytes of the
    /// opaque remainder; `claimed` is its length per the enclosing header.
    Complete {
        offset: usize,
        payload: &'a [u8],
        claimed: usize,
    },
    /// A layer named a payload protocol nothing is registered for.
    UnknownProtocol {
        key: DispatchKey,
        offset: usize,
        remaining: usize,
    },
    Truncated {
        protocol: &'static str,
        error: DissectError,
    },
    Malformed {
        protocol: &'static str,
        error: DissectError,
    },
    /// The configured layer limit was hit.
    DepthLimit { limit: usize, offset: usize },
}

impl Stop<'_> {
    /// Short name of the terminal state.
    pub fn kind(&self) -> &'static str {
        match self {
            Stop::Complete { .. } => "complete",
            Stop::UnknownProtocol { .. } => "unknown",
            Stop::Truncated { .. } => "truncated",
            Stop::Malformed { .. } => "malformed",
            Stop::DepthLimit { .. } => "depth-limit",
        }
    }
}

/// Every layer decoded from one frame plus the terminal state.
///
/// `Display` renders it as text at the verbosity it was dissected with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dissection<'a> {
    pub frame: FrameInfo,
    pub layers: Vec<Layer<'a>>,
    pub stop: Stop<'a>,
    pub verbosity: Verbosity,
    pub payload_preview: usize,
}

impl<'a> Dissection<'a> {
    /// First layer with the given protocol name.
    pub fn layer(&self, protocol: &str) -> Option<&Layer<'a>> {
        self.layers.iter().find(|l| l.protocol == protocol)
    }

    /// Protocol names in encapsulation order.
    pub fn protocols(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.protocol).collect()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.stop, Stop::Complete { .. })
    }

    /// Captured bytes of the leaf payload, if the walk completed.
    pub fn payload(&self) -> Option<&'a [u8]> {
        match self.stop {
            Stop::Complete { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Layers with at least one checksum mismatch note.
    pub fn checksum_errors(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| l.has_checksum_mismatch())
            .count()
    }
}

impl std::fmt::Display for Dissection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::format::text::write_dissection(f, self)
    }
}
