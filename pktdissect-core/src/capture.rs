//! Captured frames and link-layer types.

use crate::cursor::Cursor;

/// Link-layer header types (the `network` field of a PCAP header).
pub mod linktype {
    pub const ETHERNET: u16 = 1;
    pub const RAW: u16 = 101;
    pub const LINUX_SLL: u16 = 113;
    pub const IPV4: u16 = 228;
    pub const IPV6: u16 = 229;
}

/// One captured frame: the bytes that were saved plus the frame's
/// original size on the wire.
///
/// The captured length never exceeds the on-wire length. A caller handing
/// in more bytes than it says were captured has the excess ignored; an
/// on-wire length smaller than the captured length is raised to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBuffer<'a> {
    data: &'a [u8],
    on_wire_length: usize,
}

impl<'a> CaptureBuffer<'a> {
    pub fn new(data: &'a [u8], captured_length: usize, on_wire_length: usize) -> Self {
        let captured = captured_length.min(data.len());
        Self {
            data: data.get(..captured).unwrap_or_default(),
            on_wire_length: on_wire_length.max(captured),
        }
    }

    /// A frame that was captured in full.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(data, data.len(), data.len())
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn captured_length(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn on_wire_length(&self) -> usize {
        self.on_wire_length
    }

    /// True when snaplen cut the frame short.
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.on_wire_length
    }

    /// Cursor over the whole captured frame.
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor::new(self.data)
    }
}
