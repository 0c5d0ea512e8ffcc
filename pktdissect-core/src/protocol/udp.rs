//! UDP dissector.

use compact_str::format_compact;

use super::ipv4::ip_protocol;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Handoff, Layer, Transport};
use crate::checksum::{ChecksumStatus, PseudoHeader};
use crate::cursor::Cursor;
use crate::error::DissectError;

/// UDP header length.
pub const UDP_HEADER_LEN: usize = 8;

/// UDP dissector.
///
/// The payload is handed to whichever application dissector is registered
/// for one of the two ports.
#[derive(Debug, Clone, Copy)]
pub struct UdpDissector;

impl Dissector for UdpDissector {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn display_name(&self) -> &'static str {
        "UDP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::IpProtocol(ip_protocol::UDP)]
    }

    fn min_header_len(&self) -> usize {
        UDP_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let src_port = cursor.read_u16(0)?;
        let dst_port = cursor.read_u16(2)?;
        let length = usize::from(cursor.read_u16(4)?);
        let checksum = cursor.read_u16(6)?;

        layer.push("src_port", FieldValue::UInt16(src_port));
        layer.push("dst_port", FieldValue::UInt16(dst_port));
        layer.push("length", FieldValue::UInt16(length as u16));

        if length < UDP_HEADER_LEN {
            return Err(DissectError::malformed(format_compact!(
                "length {length} shorter than header"
            )));
        }

        let datagram_len = if length > claimed {
            layer.info(format_compact!(
                "length {length} exceeds {claimed} available bytes"
            ));
            None
        } else {
            Some(length)
        };

        let status = match (ctx.pseudo_header, datagram_len) {
            // Zero means "no checksum" only over IPv4.
            (None | Some(PseudoHeader::V4 { .. }), _) if checksum == 0 => ChecksumStatus::Absent,
            (Some(pseudo_header), Some(len)) if ctx.can_verify(len, cursor.captured()) => {
                let datagram = cursor.slice(0, len)?;
                ChecksumStatus::from_sum(checksum, pseudo_header.checksum(ip_protocol::UDP, datagram))
            }
            _ => ChecksumStatus::Unverified,
        };
        layer.checksum("udp", checksum, status);

        let decoded = Decoded::new(
            UDP_HEADER_LEN,
            Handoff::Ports {
                transport: Transport::Udp,
                src: src_port,
                dst: dst_port,
            },
        );
        Ok(match datagram_len {
            Some(len) => decoded.with_payload_len(len - UDP_HEADER_LEN),
            None => decoded,
        })
    }
}
