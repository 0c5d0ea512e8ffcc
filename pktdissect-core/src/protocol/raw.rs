//! Raw IP link layer.
//!
//! LINKTYPE_RAW frames start directly with an IP header. This dissector
//! consumes nothing; it reads the version nibble and hands the same bytes to
//! the IPv4 or IPv6 dissector.

use compact_str::format_compact;

use super::ethertype;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::bits;
use crate::capture::linktype;
use crate::cursor::Cursor;
use crate::error::DissectError;

#[derive(Debug, Clone, Copy)]
pub struct RawIpDissector;

impl Dissector for RawIpDissector {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn display_name(&self) -> &'static str {
        "Raw IP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::Link(linktype::RAW)]
    }

    fn min_header_len(&self) -> usize {
        1
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        _claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let version = bits::field(u32::from(cursor.read_u8(0)?), 4, 4) as u8;
        layer.push("ip_version", FieldValue::UInt8(version));

        let next = match version {
            4 => ethertype::IPV4,
            6 => ethertype::IPV6,
            v => {
                return Err(DissectError::malformed(format_compact!(
                    "unknown IP version {v}"
                )))
            }
        };
        Ok(Decoded::to(0, DispatchKey::EtherType(next)))
    }
}
