//! Field value types for decoded layers.
//!
//! Values borrow from the frame where the bytes appear verbatim (`Str`,
//! `Bytes`) and own their data only when the text has to be constructed
//! (`OwnedString`, e.g. a token name for an unknown code).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use compact_str::{format_compact, CompactString};

use crate::format::{format_hex, format_mac};
use crate::tokens::{lookup, TokenTable};

/// A decoded field value.
///
/// The lifetime parameter `'data` ties borrowed values to the frame.
#[derive(Debug, Clone)]
pub enum FieldValue<'data> {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    /// Rendered as `0x` plus four hex digits (EtherTypes, checksums).
    Hex16(u16),
    /// Rendered as `0x` plus eight hex digits (transaction ids, keys).
    Hex32(u32),

    IpAddr(IpAddr),
    MacAddr([u8; 6]),

    /// Text that appears verbatim in the packet, or a static name.
    Str(&'data str),
    /// Raw bytes of the packet, rendered in hex.
    Bytes(&'data [u8]),

    /// Constructed text. Inline up to 24 bytes.
    OwnedString(CompactString),

    /// Multi-valued fields (router lists, SACK blocks).
    List(Vec<FieldValue<'data>>),

    Null,
}

impl<'data> FieldValue<'data> {
    /// Create a MAC address from bytes.
    pub fn mac(bytes: &[u8]) -> Self {
        match <[u8; 6]>::try_from(bytes) {
            Ok(mac) => FieldValue::MacAddr(mac),
            Err(_) => FieldValue::Null,
        }
    }

    /// Create an IPv4 address from bytes.
    pub fn ipv4(bytes: &[u8]) -> Self {
        match <[u8; 4]>::try_from(bytes) {
            Ok(octets) => FieldValue::IpAddr(IpAddr::V4(Ipv4Addr::from(octets))),
            Err(_) => FieldValue::Null,
        }
    }

    /// Create an IPv6 address from bytes.
    pub fn ipv6(bytes: &[u8]) -> Self {
        match <[u8; 16]>::try_from(bytes) {
            Ok(octets) => FieldValue::IpAddr(IpAddr::V6(Ipv6Addr::from(octets))),
            Err(_) => FieldValue::Null,
        }
    }

    /// Name of `key` in `table`, or `unknown (KEY)`.
    pub fn token(table: TokenTable, key: u32) -> Self {
        match lookup(table, key) {
            Some(name) => FieldValue::Str(name),
            None => FieldValue::OwnedString(format_compact!("unknown ({key})")),
        }
    }

    /// Text if the bytes are printable UTF-8, otherwise the raw bytes.
    pub fn text(bytes: &'data [u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(s) if !s.chars().any(char::is_control) => FieldValue::Str(s),
            _ => FieldValue::Bytes(bytes),
        }
    }

    /// Every 4-byte group of `bytes` as an IPv4 address.
    pub fn ipv4_list(bytes: &[u8]) -> Self {
        FieldValue::List(bytes.chunks_exact(4).map(FieldValue::ipv4).collect())
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(u64::from(*v)),
            FieldValue::UInt16(v) | FieldValue::Hex16(v) => Some(u64::from(*v)),
            FieldValue::UInt32(v) | FieldValue::Hex32(v) => Some(u64::from(*v)),
            FieldValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u16.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::UInt16(v) | FieldValue::Hex16(v) => Some(*v),
            FieldValue::UInt8(v) => Some(u16::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::OwnedString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            FieldValue::IpAddr(ip) => Some(*ip),
            _ => None,
        }
    }

    /// Try to get as list reference.
    pub fn as_list(&self) -> Option<&[FieldValue<'data>]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::UInt8(v) => write!(f, "{v}"),
            FieldValue::UInt16(v) => write!(f, "{v}"),
            FieldValue::UInt32(v) => write!(f, "{v}"),
            FieldValue::UInt64(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Hex16(v) => write!(f, "{v:#06x}"),
            FieldValue::Hex32(v) => write!(f, "{v:#010x}"),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::OwnedString(s) => write!(f, "{s}"),
            FieldValue::Bytes(b) if b.is_empty() => write!(f, "-"),
            FieldValue::Bytes(b) => write!(f, "{}", format_hex(b)),
            FieldValue::IpAddr(addr) => write!(f, "{addr}"),
            FieldValue::MacAddr(mac) => write!(f, "{}", format_mac(mac)),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            FieldValue::Null => write!(f, "-"),
        }
    }
}

// Implement PartialEq manually to handle borrowed vs owned comparison
impl<'a, 'b> PartialEq<FieldValue<'b>> for FieldValue<'a> {
    fn eq(&self, other: &FieldValue<'b>) -> bool {
        match (self, other) {
            (FieldValue::UInt8(a), FieldValue::UInt8(b)) => a == b,
            (FieldValue::UInt16(a), FieldValue::UInt16(b)) => a == b,
            (FieldValue::UInt32(a), FieldValue::UInt32(b)) => a == b,
            (FieldValue::UInt64(a), FieldValue::UInt64(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Hex16(a), FieldValue::Hex16(b)) => a == b,
            (FieldValue::Hex32(a), FieldValue::Hex32(b)) => a == b,
            (FieldValue::IpAddr(a), FieldValue::IpAddr(b)) => a == b,
            (FieldValue::MacAddr(a), FieldValue::MacAddr(b)) => a == b,
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            (FieldValue::Str(a), FieldValue::OwnedString(b)) => *a == b.as_str(),
            (FieldValue::OwnedString(a), FieldValue::Str(b)) => a.as_str() == *b,
            (FieldValue::OwnedString(a), FieldValue::OwnedString(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (FieldValue::Null, FieldValue::Null) => true,
            _ => false,
        }
    }
}
