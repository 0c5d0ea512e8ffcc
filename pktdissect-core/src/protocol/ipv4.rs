//! IPv4 dissector.

use compact_str::{format_compact, CompactString};

use super::ethertype;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer, TunnelType};
use crate::bits;
use crate::capture::linktype;
use crate::checksum::{internet_checksum, ChecksumStatus, PseudoHeader};
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tlv::{walk, TlvShape};
use crate::tokens::{bittok2str, tok2str, TokenTable};

/// IPv4 header without options.
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// IP protocol numbers (IANA "Assigned Internet Protocol Numbers").
pub mod ip_protocol {
    pub const HOPOPT: u8 = 0;
    pub const ICMP: u8 = 1;
    pub const IGMP: u8 = 2;
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
    pub const DSTOPTS: u8 = 60;
    pub const OSPF: u8 = 89;
    pub const PIM: u8 = 103;
    pub const VRRP: u8 = 112;
    pub const SCTP: u8 = 132;
}

pub const IP_PROTOCOL_VALUES: TokenTable = &[
    (ip_protocol::HOPOPT as u32, "HOPOPT"),
    (ip_protocol::ICMP as u32, "ICMP"),
    (ip_protocol::IGMP as u32, "IGMP"),
    (ip_protocol::IPIP as u32, "IPIP"),
    (ip_protocol::TCP as u32, "TCP"),
    (ip_protocol::UDP as u32, "UDP"),
    (ip_protocol::IPV6 as u32, "IPv6"),
    (ip_protocol::ROUTING as u32, "IPv6-Route"),
    (ip_protocol::FRAGMENT as u32, "IPv6-Frag"),
    (ip_protocol::GRE as u32, "GRE"),
    (ip_protocol::ESP as u32, "ESP"),
    (ip_protocol::AH as u32, "AH"),
    (ip_protocol::ICMPV6 as u32, "ICMPv6"),
    (ip_protocol::NO_NEXT as u32, "IPv6-NoNxt"),
    (ip_protocol::DSTOPTS as u32, "IPv6-Opts"),
    (ip_protocol::OSPF as u32, "OSPF"),
    (ip_protocol::PIM as u32, "PIM"),
    (ip_protocol::VRRP as u32, "VRRP"),
    (ip_protocol::SCTP as u32, "SCTP"),
];

mod ip_option {
    pub const EOL: u16 = 0;
    pub const NOP: u16 = 1;
    pub const RR: u16 = 7;
    pub const TS: u16 = 68;
    pub const SECURITY: u16 = 130;
    pub const LSRR: u16 = 131;
    pub const SSRR: u16 = 137;
    pub const RA: u16 = 148;
}

const IP_OPTION_VALUES: TokenTable = &[
    (ip_option::EOL as u32, "EOL"),
    (ip_option::NOP as u32, "NOP"),
    (ip_option::RR as u32, "RR"),
    (ip_option::TS as u32, "TS"),
    (ip_option::SECURITY as u32, "SEC"),
    (ip_option::LSRR as u32, "LSRR"),
    (ip_option::SSRR as u32, "SSRR"),
    (ip_option::RA as u32, "RA"),
];

/// The 3-bit flags field, reserved bit first.
const FLAG_VALUES: TokenTable = &[(0x2, "DF"), (0x1, "MF")];

/// IPv4 dissector.
///
/// Also registered under IP protocol 4 so an IPv4-in-IP payload is
/// dissected as a tunnelled packet.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Dissector;

impl Dissector for Ipv4Dissector {
    fn name(&self) -> &'static str {
        "ipv4"
    }

    fn display_name(&self) -> &'static str {
        "IPv4"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::EtherType(ethertype::IPV4),
            DispatchKey::Link(linktype::IPV4),
            DispatchKey::IpProtocol(ip_protocol::IPIP),
        ]
    }

    fn min_header_len(&self) -> usize {
        IPV4_MIN_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let b0 = u32::from(cursor.read_u8(0)?);
        let version = bits::field(b0, 4, 4);
        layer.push("version", FieldValue::UInt8(version as u8));
        if version != 4 {
            return Err(DissectError::malformed(format_compact!(
                "IP version {version} in IPv4 header"
            )));
        }

        let ihl = bits::field(b0, 0, 4);
        let header_len = ihl as usize * 4;
        layer.push("ihl", FieldValue::UInt8(ihl as u8));
        if header_len < IPV4_MIN_HEADER_LEN {
            return Err(DissectError::malformed(format_compact!(
                "header length {header_len} below minimum {IPV4_MIN_HEADER_LEN}"
            )));
        }

        let tos = u32::from(cursor.read_u8(1)?);
        layer.push("dscp", FieldValue::UInt8(bits::field(tos, 2, 6) as u8));
        layer.push("ecn", FieldValue::UInt8(bits::field(tos, 0, 2) as u8));

        let total_length = usize::from(cursor.read_u16(2)?);
        layer.push("total_length", FieldValue::UInt16(total_length as u16));
        if total_length < header_len {
            return Err(DissectError::malformed(format_compact!(
                "total length {total_length} shorter than header length {header_len}"
            )));
        }

        layer.push("identification", FieldValue::Hex16(cursor.read_u16(4)?));

        let frag = u32::from(cursor.read_u16(6)?);
        let flags = bits::field(frag, 13, 3);
        let more_fragments = bits::flag(frag, 13);
        let fragment_offset = bits::field(frag, 0, 13) as usize * 8;
        layer.push(
            "flags",
            FieldValue::OwnedString(CompactString::from(bittok2str(FLAG_VALUES, flags))),
        );
        layer.push("dont_fragment", FieldValue::Bool(bits::flag(frag, 14)));
        layer.push("more_fragments", FieldValue::Bool(more_fragments));
        layer.push("fragment_offset", FieldValue::UInt16(fragment_offset as u16));

        layer.push("ttl", FieldValue::UInt8(cursor.read_u8(8)?));
        let protocol = cursor.read_u8(9)?;
        layer.push("protocol", FieldValue::UInt8(protocol));
        layer.push(
            "protocol_name",
            FieldValue::token(IP_PROTOCOL_VALUES, u32::from(protocol)),
        );

        let checksum = cursor.read_u16(10)?;
        let status = if ctx.can_verify(header_len, cursor.remaining(0)) {
            let header = cursor.slice(0, header_len)?;
            ChecksumStatus::from_sum(checksum, internet_checksum(header))
        } else {
            ChecksumStatus::Unverified
        };
        layer.checksum("ip header", checksum, status);

        let src = cursor.read_ipv4(12)?;
        let dst = cursor.read_ipv4(16)?;
        layer.push("src_ip", FieldValue::IpAddr(src.into()));
        layer.push("dst_ip", FieldValue::IpAddr(dst.into()));

        if header_len > IPV4_MIN_HEADER_LEN {
            decode_options(cursor, header_len - IPV4_MIN_HEADER_LEN, layer)?;
        }

        let datagram_len = if total_length > claimed {
            layer.info(format_compact!(
                "total length {total_length} exceeds {claimed} available bytes"
            ));
            claimed
        } else {
            total_length
        };
        let payload_len = datagram_len.saturating_sub(header_len);

        // Only the first fragment carries the next header.
        if fragment_offset != 0 {
            return Ok(Decoded::leaf(header_len)
                .with_payload_len(payload_len)
                .without_pseudo_header());
        }

        let mut decoded = Decoded::to(header_len, DispatchKey::IpProtocol(protocol))
            .with_payload_len(payload_len);
        decoded = if more_fragments {
            decoded.without_pseudo_header()
        } else {
            decoded.with_pseudo_header(PseudoHeader::V4 { src, dst })
        };
        Ok(match protocol {
            ip_protocol::IPIP => decoded.with_tunnel(TunnelType::IpInIp, None),
            ip_protocol::IPV6 => decoded.with_tunnel(TunnelType::Ip6InIp, None),
            _ => decoded,
        })
    }
}

/// Walk the options area that follows the fixed header.
fn decode_options<'a>(
    cursor: &Cursor<'a>,
    options_len: usize,
    layer: &mut Layer<'a>,
) -> Result<(), DissectError> {
    for record in walk(cursor, IPV4_MIN_HEADER_LEN, options_len, TlvShape::IP_OPTIONS) {
        let record = record?;
        let value = match record.kind {
            ip_option::EOL | ip_option::NOP => FieldValue::Null,
            // Route options: 1-byte pointer, then the address list.
            ip_option::RR | ip_option::LSRR | ip_option::SSRR => {
                FieldValue::ipv4_list(record.value.get(1..).unwrap_or_default())
            }
            ip_option::RA if record.value.len() == 2 => {
                FieldValue::UInt16(record.value_cursor().read_u16(0)?)
            }
            _ => FieldValue::Bytes(record.value),
        };
        layer.option(
            record.kind,
            tok2str(IP_OPTION_VALUES, u32::from(record.kind)),
            record.length,
            value,
        );
    }
    Ok(())
}
