//! GRE dissector (RFC 2784/2890, legacy RFC 1701 routing, PPTP enhanced GRE).

use compact_str::format_compact;

use super::ethernet::ETHERTYPE_VALUES;
use super::ipv4::ip_protocol;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer, TunnelType};
use crate::bits;
use crate::checksum::{internet_checksum, ChecksumStatus};
use crate::cursor::Cursor;
use crate::error::DissectError;

/// Flags/version word plus protocol type.
pub const GRE_BASE_HEADER_LEN: usize = 4;

/// GRE dissector.
///
/// The optional checksum, key and sequence fields are present according to
/// the flag bits. Version 1 is the PPTP variant, whose key field carries a
/// payload length and call ID and which may append an acknowledgment number.
#[derive(Debug, Clone, Copy)]
pub struct GreDissector;

impl Dissector for GreDissector {
    fn name(&self) -> &'static str {
        "gre"
    }

    fn display_name(&self) -> &'static str {
        "GRE"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::IpProtocol(ip_protocol::GRE)]
    }

    fn min_header_len(&self) -> usize {
        GRE_BASE_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let word = u32::from(cursor.read_u16(0)?);
        let checksum_present = bits::flag(word, 15);
        let routing_present = bits::flag(word, 14);
        let key_present = bits::flag(word, 13);
        let seq_present = bits::flag(word, 12);
        let version = bits::field(word, 0, 3);

        layer.push("flags", FieldValue::Hex16(word as u16));
        layer.push("checksum_present", FieldValue::Bool(checksum_present));
        layer.push("key_present", FieldValue::Bool(key_present));
        layer.push("seq_present", FieldValue::Bool(seq_present));
        layer.push("recursion", FieldValue::UInt8(bits::field(word, 8, 3) as u8));
        layer.push("version", FieldValue::UInt8(version as u8));

        let protocol = cursor.read_u16(2)?;
        layer.push("protocol", FieldValue::Hex16(protocol));
        layer.push(
            "protocol_name",
            FieldValue::token(ETHERTYPE_VALUES, u32::from(protocol)),
        );

        let mut offset = GRE_BASE_HEADER_LEN;
        let mut tunnel_id = None;

        match version {
            0 => {
                if checksum_present || routing_present {
                    let checksum = cursor.read_u16(offset)?;
                    if checksum_present {
                        let status = if ctx.can_verify(claimed, cursor.captured()) {
                            ChecksumStatus::from_sum(
                                checksum,
                                internet_checksum(cursor.slice(0, claimed)?),
                            )
                        } else {
                            ChecksumStatus::Unverified
                        };
                        layer.checksum("gre", checksum, status);
                    }
                    layer.push("routing_offset", FieldValue::UInt16(cursor.read_u16(offset + 2)?));
                    offset += 4;
                }
                if key_present {
                    let key = cursor.read_u32(offset)?;
                    layer.push("key", FieldValue::Hex32(key));
                    tunnel_id = Some(u64::from(key));
                    offset += 4;
                }
                if seq_present {
                    layer.push("sequence", FieldValue::UInt32(cursor.read_u32(offset)?));
                    offset += 4;
                }
                if routing_present {
                    offset = skip_routing(cursor, offset, claimed, layer)?;
                }
            }
            1 => {
                if !key_present {
                    return Err(DissectError::malformed("enhanced GRE without key field"));
                }
                let payload_length = cursor.read_u16(offset)?;
                let call_id = cursor.read_u16(offset + 2)?;
                layer.push("payload_length", FieldValue::UInt16(payload_length));
                layer.push("call_id", FieldValue::UInt16(call_id));
                tunnel_id = Some(u64::from(call_id));
                offset += 4;
                if seq_present {
                    layer.push("sequence", FieldValue::UInt32(cursor.read_u32(offset)?));
                    offset += 4;
                }
                if bits::flag(word, 7) {
                    layer.push("ack", FieldValue::UInt32(cursor.read_u32(offset)?));
                    offset += 4;
                }
            }
            v => {
                return Err(DissectError::malformed(format_compact!(
                    "unsupported GRE version {v}"
                )))
            }
        }

        Ok(Decoded::to(offset, DispatchKey::EtherType(protocol)).with_tunnel(TunnelType::Gre, tunnel_id))
    }
}

/// Walk RFC 1701 source route entries up to the terminating null entry.
///
/// Each entry is address family (2), SRE offset (1), SRE length (1) and
/// `length` bytes of routing information.
fn skip_routing(
    cursor: &Cursor<'_>,
    mut offset: usize,
    claimed: usize,
    layer: &mut Layer<'_>,
) -> Result<usize, DissectError> {
    let mut entries = 0u16;
    loop {
        if offset + 4 > claimed {
            return Err(DissectError::malformed("routing entries run past the packet"));
        }
        let family = cursor.read_u16(offset)?;
        let length = usize::from(cursor.read_u8(offset + 3)?);
        offset += 4;
        if family == 0 && length == 0 {
            break;
        }
        if offset + length > claimed {
            return Err(DissectError::malformed(format_compact!(
                "routing entry length {length} runs past the packet"
            )));
        }
        cursor.ensure(offset, length)?;
        offset += length;
        entries += 1;
    }
    layer.push("routing_entries", FieldValue::UInt16(entries));
    Ok(offset)
}
