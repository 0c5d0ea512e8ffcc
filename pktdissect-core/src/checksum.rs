//! RFC 1071 Internet checksum.
//!
//! Verification sums the covered bytes *including* the transmitted checksum
//! field; a correct packet folds to zero. When it does not, [`expected`]
//! recovers the value the field should have held.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Running one's-complement sum.
///
/// Feed even-length chunks; only the final chunk may have odd length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checksum {
    sum: u64,
}

impl Checksum {
    pub const fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn add_bytes(&mut self, data: &[u8]) -> &mut Self {
        let mut words = data.chunks_exact(2);
        for word in &mut words {
            self.sum += u64::from(u16::from_be_bytes([word[0], word[1]]));
        }
        if let [last] = words.remainder() {
            self.sum += u64::from(*last) << 8;
        }
        self
    }

    pub fn add_u16(&mut self, value: u16) -> &mut Self {
        self.sum += u64::from(value);
        self
    }

    pub fn add_u32(&mut self, value: u32) -> &mut Self {
        self.add_u16((value >> 16) as u16).add_u16(value as u16)
    }

    /// Fold and complement.
    pub fn finish(&self) -> u16 {
        !fold(self.sum)
    }
}

fn fold(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum as u16
}

/// Checksum of `data`. Zero when `data` already carries a valid checksum.
pub fn internet_checksum(data: &[u8]) -> u16 {
    Checksum::new().add_bytes(data).finish()
}

/// The value the checksum field should have carried, given the field as
/// transmitted and the result of summing the covered bytes with it.
pub fn expected(found: u16, computed: u16) -> u16 {
    fold(u64::from(found) + u64::from(computed))
}

/// Addresses an IP layer hands to the transport layer for its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoHeader {
    V4 { src: Ipv4Addr, dst: Ipv4Addr },
    V6 { src: Ipv6Addr, dst: Ipv6Addr },
}

impl PseudoHeader {
    /// Checksum of a transport segment including this pseudo-header.
    pub fn checksum(&self, protocol: u8, segment: &[u8]) -> u16 {
        let mut sum = Checksum::new();
        match self {
            PseudoHeader::V4 { src, dst } => {
                sum.add_bytes(&src.octets())
                    .add_bytes(&dst.octets())
                    .add_u16(u16::from(protocol))
                    .add_u16(segment.len() as u16);
            }
            PseudoHeader::V6 { src, dst } => {
                sum.add_bytes(&src.octets())
                    .add_bytes(&dst.octets())
                    .add_u32(segment.len() as u32)
                    .add_u16(u16::from(protocol));
            }
        }
        sum.add_bytes(segment).finish()
    }

    pub fn is_v4(&self) -> bool {
        matches!(self, PseudoHeader::V4 { .. })
    }
}

/// Outcome of an advisory checksum check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    Good,
    Bad { expected: u16 },
    /// Not all covered bytes were captured, or checking is disabled.
    Unverified,
    /// The sender did not compute one (UDP over IPv4, field zero).
    Absent,
}

impl ChecksumStatus {
    /// Classify a `computed` sum over covered bytes that include `found`.
    pub fn from_sum(found: u16, computed: u16) -> Self {
        if computed == 0 {
            ChecksumStatus::Good
        } else {
            ChecksumStatus::Bad {
                expected: expected(found, computed),
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumStatus::Good => "good",
            ChecksumStatus::Bad { .. } => "bad",
            ChecksumStatus::Unverified => "unverified",
            ChecksumStatus::Absent => "none",
        }
    }
}
