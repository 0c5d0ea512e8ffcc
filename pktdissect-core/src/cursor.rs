//! Bounded, big-endian reads over a region of a captured frame.
//!
//! A [`Cursor`] is a `Copy` view of the captured bytes belonging to one
//! protocol layer, plus the absolute offset of that region within the frame.
//! Every read is relative to the region start and is checked against the
//! captured bytes before any byte is touched. A read that does not fit fails
//! with [`DissectError::Truncated`]; a read never returns a partial value.
//!
//! ```
//! use pktdissect_core::cursor::Cursor;
//!
//! let frame = [0x08, 0x00, 0x45];
//! let cursor = Cursor::new(&frame);
//! assert_eq!(cursor.read_u16(0).unwrap(), 0x0800);
//! assert!(cursor.read_u16(2).is_err());
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::DissectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    base: usize,
}

impl<'a> Cursor<'a> {
    /// A cursor over a whole captured frame, starting at absolute offset 0.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, base: 0 }
    }

    /// A cursor over `buf`, which starts at absolute offset `base`.
    pub(crate) const fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, base }
    }

    /// Absolute offset of the region start within the frame.
    #[inline]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Number of captured bytes in the region.
    #[inline]
    pub const fn captured(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Captured bytes left from `offset` to the end of the region.
    #[inline]
    pub fn remaining(&self, offset: usize) -> usize {
        self.buf.len().saturating_sub(offset)
    }

    /// Check that `len` bytes at `offset` were captured, without reading them.
    #[inline]
    pub fn ensure(&self, offset: usize, len: usize) -> Result<(), DissectError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(()),
            _ => Err(self.truncated(offset, len)),
        }
    }

    /// Borrow `len` bytes at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], DissectError> {
        offset
            .checked_add(len)
            .and_then(|end| self.buf.get(offset..end))
            .ok_or_else(|| self.truncated(offset, len))
    }

    /// Captured bytes from `offset` to the end of the region (possibly empty).
    pub fn rest(&self, offset: usize) -> &'a [u8] {
        self.buf.get(offset..).unwrap_or_default()
    }

    /// Copy `N` bytes at `offset` into an array.
    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DissectError> {
        let bytes = self.slice(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&self, offset: usize) -> Result<u8, DissectError> {
        let [b] = self.read_array::<1>(offset)?;
        Ok(b)
    }

    #[inline]
    pub fn read_u16(&self, offset: usize) -> Result<u16, DissectError> {
        self.read_array(offset).map(u16::from_be_bytes)
    }

    pub fn read_u24(&self, offset: usize) -> Result<u32, DissectError> {
        let [a, b, c] = self.read_array::<3>(offset)?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> Result<u32, DissectError> {
        self.read_array(offset).map(u32::from_be_bytes)
    }

    pub fn read_u48(&self, offset: usize) -> Result<u64, DissectError> {
        let [a, b, c, d, e, f] = self.read_array::<6>(offset)?;
        Ok(u64::from_be_bytes([0, 0, a, b, c, d, e, f]))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64, DissectError> {
        self.read_array(offset).map(u64::from_be_bytes)
    }

    pub fn read_ipv4(&self, offset: usize) -> Result<Ipv4Addr, DissectError> {
        self.read_array::<4>(offset).map(Ipv4Addr::from)
    }

    pub fn read_ipv6(&self, offset: usize) -> Result<Ipv6Addr, DissectError> {
        self.read_array::<16>(offset).map(Ipv6Addr::from)
    }

    pub fn read_mac(&self, offset: usize) -> Result<[u8; 6], DissectError> {
        self.read_array(offset)
    }

    /// Sub-region starting at `offset`, at most `claimed` bytes long.
    ///
    /// The result never extends past this region's captured bytes, so a
    /// claimed length larger than the capture yields a shorter cursor whose
    /// reads report truncation. An `offset` beyond the capture yields an
    /// empty cursor.
    pub fn narrow(&self, offset: usize, claimed: usize) -> Cursor<'a> {
        let start = offset.min(self.buf.len());
        let end = start.saturating_add(claimed).min(self.buf.len());
        Cursor {
            buf: self.buf.get(start..end).unwrap_or_default(),
            base: self.base.saturating_add(offset),
        }
    }

    fn truncated(&self, offset: usize, needed: usize) -> DissectError {
        DissectError::Truncated {
            offset: self.base.saturating_add(offset),
            needed,
            available: self.remaining(offset),
        }
    }
}
