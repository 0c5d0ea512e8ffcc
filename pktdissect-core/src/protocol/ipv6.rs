//! IPv6 dissector, including the extension header chain.

use compact_str::format_compact;

use super::ethertype;
use super::ipv4::IP_PROTOCOL_VALUES;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer, TunnelType};
use crate::bits;
use crate::capture::linktype;
use crate::checksum::PseudoHeader;
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tlv::{walk, TlvShape};
use crate::tokens::{tok2str, TokenTable};

/// Fixed IPv6 header length.
pub const IPV6_HEADER_LEN: usize = 40;

/// Next header values that may follow an IPv6 header.
pub mod next_header {
    pub const HOP_BY_HOP: u8 = 0;
    pub const IPIP: u8 = 4;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const IPV6: u8 = 41;
    pub const ROUTING: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const GRE: u8 = 47;
    pub const ESP: u8 = 50;
    pub const AH: u8 = 51;
    pub const ICMPV6: u8 = 58;
    pub const NO_NEXT: u8 = 59;
    pub const DEST_OPTS: u8 = 60;
}

const IPV6_OPTION_VALUES: TokenTable = &[
    (0, "Pad1"),
    (1, "PadN"),
    (4, "Tunnel Encapsulation Limit"),
    (5, "Router Alert"),
    (194, "Jumbo Payload"),
    (201, "Home Address"),
];

/// IPv6 dissector.
///
/// Hop-by-hop, routing, fragment, authentication and destination options
/// headers are decoded into this layer; the first other next header value
/// is the handoff.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Dissector;

impl Dissector for Ipv6Dissector {
    fn name(&self) -> &'static str {
        "ipv6"
    }

    fn display_name(&self) -> &'static str {
        "IPv6"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::EtherType(ethertype::IPV6),
            DispatchKey::Link(linktype::IPV6),
            DispatchKey::IpProtocol(next_header::IPV6),
        ]
    }

    fn min_header_len(&self) -> usize {
        IPV6_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let word = cursor.read_u32(0)?;
        let version = bits::field(word, 28, 4);
        layer.push("version", FieldValue::UInt8(version as u8));
        if version != 6 {
            return Err(DissectError::malformed(format_compact!(
                "IP version {version} in IPv6 header"
            )));
        }
        let traffic_class = bits::field(word, 20, 8);
        layer.push("traffic_class", FieldValue::UInt8(traffic_class as u8));
        layer.push("dscp", FieldValue::UInt8(bits::field(traffic_class, 2, 6) as u8));
        layer.push("ecn", FieldValue::UInt8(bits::field(traffic_class, 0, 2) as u8));
        layer.push("flow_label", FieldValue::Hex32(bits::field(word, 0, 20)));

        let payload_length = usize::from(cursor.read_u16(4)?);
        layer.push("payload_length", FieldValue::UInt16(payload_length as u16));
        let mut next = cursor.read_u8(6)?;
        layer.push("next_header", FieldValue::UInt8(next));
        layer.push(
            "next_header_name",
            FieldValue::token(IP_PROTOCOL_VALUES, u32::from(next)),
        );
        layer.push("hop_limit", FieldValue::UInt8(cursor.read_u8(7)?));

        let src = cursor.read_ipv6(8)?;
        let dst = cursor.read_ipv6(24)?;
        layer.push("src_ip", FieldValue::IpAddr(src.into()));
        layer.push("dst_ip", FieldValue::IpAddr(dst.into()));

        let mut datagram_len = IPV6_HEADER_LEN + payload_length;
        if datagram_len > claimed {
            layer.info(format_compact!(
                "payload length {payload_length} exceeds {} available bytes",
                claimed.saturating_sub(IPV6_HEADER_LEN)
            ));
            datagram_len = claimed;
        }

        let mut offset = IPV6_HEADER_LEN;
        let mut fragmented = false;
        let mut later_fragment = false;
        let mut chain = Vec::new();

        while is_extension_header(next) {
            let ext_len = extension_len(cursor, offset, next)?;
            if offset + ext_len > datagram_len {
                return Err(DissectError::malformed(format_compact!(
                    "extension header length {ext_len} at offset {offset} exceeds datagram"
                )));
            }
            cursor.ensure(offset, ext_len)?;
            chain.push(FieldValue::token(IP_PROTOCOL_VALUES, u32::from(next)));

            match next {
                next_header::HOP_BY_HOP | next_header::DEST_OPTS => {
                    decode_options(cursor, offset + 2, ext_len - 2, layer)?;
                }
                next_header::ROUTING => {
                    layer.push("routing_type", FieldValue::UInt8(cursor.read_u8(offset + 2)?));
                    layer.push("segments_left", FieldValue::UInt8(cursor.read_u8(offset + 3)?));
                }
                next_header::FRAGMENT => {
                    let frag = u32::from(cursor.read_u16(offset + 2)?);
                    let fragment_offset = bits::field(frag, 3, 13) as usize * 8;
                    let more_fragments = bits::flag(frag, 0);
                    layer.push("fragment_offset", FieldValue::UInt16(fragment_offset as u16));
                    layer.push("more_fragments", FieldValue::Bool(more_fragments));
                    layer.push("fragment_id", FieldValue::Hex32(cursor.read_u32(offset + 4)?));
                    fragmented |= more_fragments || fragment_offset != 0;
                    later_fragment |= fragment_offset != 0;
                }
                next_header::AH => {
                    layer.push("ah_spi", FieldValue::Hex32(cursor.read_u32(offset + 4)?));
                    layer.push("ah_sequence", FieldValue::UInt32(cursor.read_u32(offset + 8)?));
                }
                _ => {}
            }

            next = cursor.read_u8(offset)?;
            offset += ext_len;
            if later_fragment {
                break;
            }
        }

        if !chain.is_empty() {
            layer.push("extension_headers", FieldValue::List(chain));
            layer.push("upper_protocol", FieldValue::UInt8(next));
        }

        let payload_len = datagram_len - offset;
        if later_fragment || next == next_header::NO_NEXT {
            return Ok(Decoded::leaf(offset).with_payload_len(payload_len));
        }

        let mut decoded =
            Decoded::to(offset, DispatchKey::IpProtocol(next)).with_payload_len(payload_len);
        decoded = if fragmented {
            decoded.without_pseudo_header()
        } else {
            decoded.with_pseudo_header(PseudoHeader::V6 { src, dst })
        };
        Ok(match next {
            next_header::IPIP => decoded.with_tunnel(TunnelType::IpInIp, None),
            next_header::IPV6 => decoded.with_tunnel(TunnelType::Ip6InIp, None),
            _ => decoded,
        })
    }
}

fn is_extension_header(next: u8) -> bool {
    matches!(
        next,
        next_header::HOP_BY_HOP
            | next_header::ROUTING
            | next_header::FRAGMENT
            | next_header::AH
            | next_header::DEST_OPTS
    )
}

/// Length in bytes of the extension header of type `kind` at `offset`.
fn extension_len(cursor: &Cursor<'_>, offset: usize, kind: u8) -> Result<usize, DissectError> {
    Ok(match kind {
        next_header::FRAGMENT => 8,
        // AH counts 4-byte units, minus two.
        next_header::AH => (usize::from(cursor.read_u8(offset + 1)?) + 2) * 4,
        _ => (usize::from(cursor.read_u8(offset + 1)?) + 1) * 8,
    })
}

fn decode_options<'a>(
    cursor: &Cursor<'a>,
    start: usize,
    len: usize,
    layer: &mut Layer<'a>,
) -> Result<(), DissectError> {
    for record in walk(cursor, start, len, TlvShape::Ipv6Option) {
        let record = record?;
        let value = match record.kind {
            0 | 1 => FieldValue::Null,
            5 if record.value.len() == 2 => {
                FieldValue::UInt16(record.value_cursor().read_u16(0)?)
            }
            194 if record.value.len() == 4 => {
                FieldValue::UInt32(record.value_cursor().read_u32(0)?)
            }
            _ => FieldValue::Bytes(record.value),
        };
        layer.option(
            record.kind,
            tok2str(IPV6_OPTION_VALUES, u32::from(record.kind)),
            record.length,
            value,
        );
    }
    Ok(())
}
