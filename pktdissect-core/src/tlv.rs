//! Type-length-value walker.
//!
//! [`walk`] iterates the records of an options area whose extent is known
//! from a header length field. Each step either consumes at least one byte
//! or ends the walk, so iteration always terminates and never leaves the
//! declared region. The first error is yielded once and the walker is
//! fused afterwards.
//!
//! ```
//! use pktdissect_core::cursor::Cursor;
//! use pktdissect_core::tlv::{walk, TlvShape};
//!
//! // TCP options: NOP, NOP, MSS 1460, EOL
//! let opts = [0x01, 0x01, 0x02, 0x04, 0x05, 0xb4, 0x00, 0x00];
//! let kinds: Vec<u16> = walk(&Cursor::new(&opts), 0, opts.len(), TlvShape::TCP_OPTIONS)
//!     .map(|r| r.unwrap().kind)
//!     .collect();
//! assert_eq!(kinds, [1, 1, 2, 0]);
//! ```

use compact_str::format_compact;

use crate::bits;
use crate::cursor::Cursor;
use crate::error::DissectError;

/// Record layouts understood by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvShape {
    /// 1-byte kind, 1-byte length covering the whole record.
    ///
    /// `terminator` and `pad` kinds are single bytes with no length field;
    /// the terminator ends the walk.
    TypeLength8 {
        terminator: Option<u8>,
        pad: Option<u8>,
    },
    /// 1-byte kind, 1-byte length covering only the value.
    TypeLength8Exclusive {
        terminator: Option<u8>,
        pad: Option<u8>,
    },
    /// IPv6 hop-by-hop and destination options: Pad1 is a single byte,
    /// everything else has a value-only length.
    Ipv6Option,
    /// 16-bit word holding a 7-bit kind and a 9-bit value length. Kind 0
    /// ends the walk.
    PackedTypeLength,
    /// 2-byte kind, 2-byte length covering the whole record.
    TypeLength16,
}

impl TlvShape {
    pub const IP_OPTIONS: TlvShape = TlvShape::TypeLength8 {
        terminator: Some(0),
        pad: Some(1),
    };
    pub const TCP_OPTIONS: TlvShape = TlvShape::IP_OPTIONS;
    pub const DHCP_OPTIONS: TlvShape = TlvShape::TypeLength8Exclusive {
        terminator: Some(255),
        pad: Some(0),
    };

    pub const fn header_len(&self) -> usize {
        match self {
            TlvShape::TypeLength8 { .. }
            | TlvShape::TypeLength8Exclusive { .. }
            | TlvShape::Ipv6Option
            | TlvShape::PackedTypeLength => 2,
            TlvShape::TypeLength16 => 4,
        }
    }

    /// `Some(is_terminator)` if `kind` is a single-byte record in this shape.
    fn single_byte(&self, kind: u8) -> Option<bool> {
        match *self {
            TlvShape::TypeLength8 { terminator, pad }
            | TlvShape::TypeLength8Exclusive { terminator, pad } => {
                if terminator == Some(kind) {
                    Some(true)
                } else if pad == Some(kind) {
                    Some(false)
                } else {
                    None
                }
            }
            TlvShape::Ipv6Option => (kind == 0).then_some(false),
            TlvShape::PackedTypeLength | TlvShape::TypeLength16 => None,
        }
    }

    /// Read `(kind, total record length)` at `pos`.
    fn read_header(&self, cursor: &Cursor<'_>, pos: usize) -> Result<(u16, usize), DissectError> {
        let header = self.header_len();
        Ok(match self {
            TlvShape::TypeLength8 { .. } => {
                let [kind, len] = cursor.read_array::<2>(pos)?;
                (u16::from(kind), usize::from(len))
            }
            TlvShape::TypeLength8Exclusive { .. } | TlvShape::Ipv6Option => {
                let [kind, len] = cursor.read_array::<2>(pos)?;
                (u16::from(kind), usize::from(len) + header)
            }
            TlvShape::PackedTypeLength => {
                let word = u32::from(cursor.read_u16(pos)?);
                let kind = bits::field(word, 9, 7) as u16;
                let len = bits::field(word, 0, 9) as usize;
                (kind, len + header)
            }
            TlvShape::TypeLength16 => {
                let kind = cursor.read_u16(pos)?;
                let len = cursor.read_u16(pos + 2)?;
                (kind, usize::from(len))
            }
        })
    }
}

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord<'a> {
    pub kind: u16,
    /// Whole record length, header included.
    pub length: usize,
    pub value: &'a [u8],
    /// Offset of the record within the walked region.
    pub offset: usize,
    /// Absolute offset of `value` within the frame.
    pub value_base: usize,
}

impl<'a> TlvRecord<'a> {
    /// Bounded reads over the value.
    pub fn value_cursor(&self) -> Cursor<'a> {
        Cursor::with_base(self.value, self.value_base)
    }
}

/// Iterator over the records of one options region.
#[derive(Debug, Clone)]
pub struct TlvWalker<'a> {
    cursor: Cursor<'a>,
    shape: TlvShape,
    start: usize,
    pos: usize,
    remaining: usize,
    done: bool,
}

/// Walk `region_length` bytes of records starting at `region_start`.
///
/// The region length comes from a header field; bytes of it that were not
/// captured surface as [`DissectError::Truncated`] when reached.
pub fn walk<'a>(
    cursor: &Cursor<'a>,
    region_start: usize,
    region_length: usize,
    shape: TlvShape,
) -> TlvWalker<'a> {
    TlvWalker {
        cursor: *cursor,
        shape,
        start: region_start,
        pos: region_start,
        remaining: region_length,
        done: false,
    }
}

impl<'a> TlvWalker<'a> {
    /// Bytes of the region consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos - self.start
    }

    /// Region bytes not yet walked (e.g. padding after a terminator).
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn step(&mut self) -> Result<TlvRecord<'a>, DissectError> {
        let pos = self.pos;
        let kind = self.cursor.read_u8(pos)?;

        if let Some(terminates) = self.shape.single_byte(kind) {
            self.advance(1);
            self.done = terminates;
            return Ok(TlvRecord {
                kind: u16::from(kind),
                length: 1,
                value: &[],
                offset: pos - self.start,
                value_base: self.cursor.base() + pos + 1,
            });
        }

        let header = self.shape.header_len();
        if self.remaining < header {
            return Err(DissectError::malformed(format_compact!(
                "{} trailing bytes, shorter than a {}-byte TLV header",
                self.remaining,
                header
            )));
        }

        let (kind, length) = self.shape.read_header(&self.cursor, pos)?;
        if length < header {
            return Err(DissectError::malformed(format_compact!(
                "TLV length {length} shorter than header"
            )));
        }
        if length > self.remaining {
            return Err(DissectError::malformed(format_compact!(
                "TLV length {length} exceeds remaining {}",
                self.remaining
            )));
        }

        let value = self.cursor.slice(pos + header, length - header)?;
        self.advance(length);
        if self.shape == TlvShape::PackedTypeLength && kind == 0 {
            self.done = true;
        }

        Ok(TlvRecord {
            kind,
            length,
            value,
            offset: pos - self.start,
            value_base: self.cursor.base() + pos + header,
        })
    }

    fn advance(&mut self, len: usize) {
        self.pos += len;
        self.remaining -= len;
    }
}

impl<'a> Iterator for TlvWalker<'a> {
    type Item = Result<TlvRecord<'a>, DissectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == 0 {
            self.done = true;
            return None;
        }
        match self.step() {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for TlvWalker<'_> {}
