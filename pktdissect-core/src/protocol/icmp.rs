//! ICMP (IPv4) dissector.

use super::ethertype;
use super::ipv4::ip_protocol;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::checksum::{internet_checksum, ChecksumStatus};
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tokens::TokenTable;

/// Type, code, checksum and the 4-byte rest-of-header.
pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP type constants.
pub mod icmp_type {
    pub const ECHO_REPLY: u8 = 0;
    pub const DESTINATION_UNREACHABLE: u8 = 3;
    pub const SOURCE_QUENCH: u8 = 4;
    pub const REDIRECT: u8 = 5;
    pub const ECHO_REQUEST: u8 = 8;
    pub const ROUTER_ADVERTISEMENT: u8 = 9;
    pub const ROUTER_SOLICITATION: u8 = 10;
    pub const TIME_EXCEEDED: u8 = 11;
    pub const PARAMETER_PROBLEM: u8 = 12;
    pub const TIMESTAMP_REQUEST: u8 = 13;
    pub const TIMESTAMP_REPLY: u8 = 14;
}

const ICMP_TYPE_VALUES: TokenTable = &[
    (icmp_type::ECHO_REPLY as u32, "echo reply"),
    (icmp_type::DESTINATION_UNREACHABLE as u32, "destination unreachable"),
    (icmp_type::SOURCE_QUENCH as u32, "source quench"),
    (icmp_type::REDIRECT as u32, "redirect"),
    (icmp_type::ECHO_REQUEST as u32, "echo request"),
    (icmp_type::ROUTER_ADVERTISEMENT as u32, "router advertisement"),
    (icmp_type::ROUTER_SOLICITATION as u32, "router solicitation"),
    (icmp_type::TIME_EXCEEDED as u32, "time exceeded"),
    (icmp_type::PARAMETER_PROBLEM as u32, "parameter problem"),
    (icmp_type::TIMESTAMP_REQUEST as u32, "timestamp request"),
    (icmp_type::TIMESTAMP_REPLY as u32, "timestamp reply"),
];

const UNREACH_CODE_VALUES: TokenTable = &[
    (0, "net unreachable"),
    (1, "host unreachable"),
    (2, "protocol unreachable"),
    (3, "port unreachable"),
    (4, "fragmentation needed"),
    (5, "source route failed"),
    (6, "destination network unknown"),
    (7, "destination host unknown"),
    (9, "network administratively prohibited"),
    (10, "host administratively prohibited"),
    (13, "communication administratively prohibited"),
];

const REDIRECT_CODE_VALUES: TokenTable = &[
    (0, "redirect for network"),
    (1, "redirect for host"),
    (2, "redirect for TOS and network"),
    (3, "redirect for TOS and host"),
];

const TIME_EXCEEDED_CODE_VALUES: TokenTable = &[
    (0, "time to live exceeded in transit"),
    (1, "fragment reassembly time exceeded"),
];

/// ICMP dissector.
///
/// Error messages quote the offending datagram's IP header, which is handed
/// to the IPv4 dissector.
#[derive(Debug, Clone, Copy)]
pub struct IcmpDissector;

impl Dissector for IcmpDissector {
    fn name(&self) -> &'static str {
        "icmp"
    }

    fn display_name(&self) -> &'static str {
        "ICMP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::IpProtocol(ip_protocol::ICMP)]
    }

    fn min_header_len(&self) -> usize {
        ICMP_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let kind = cursor.read_u8(0)?;
        let code = cursor.read_u8(1)?;
        layer.push("type", FieldValue::UInt8(kind));
        layer.push("type_name", FieldValue::token(ICMP_TYPE_VALUES, u32::from(kind)));
        layer.push("code", FieldValue::UInt8(code));

        let code_table = match kind {
            icmp_type::DESTINATION_UNREACHABLE => Some(UNREACH_CODE_VALUES),
            icmp_type::REDIRECT => Some(REDIRECT_CODE_VALUES),
            icmp_type::TIME_EXCEEDED => Some(TIME_EXCEEDED_CODE_VALUES),
            _ => None,
        };
        if let Some(table) = code_table {
            layer.push("code_name", FieldValue::token(table, u32::from(code)));
        }

        // The checksum covers the whole message.
        let checksum = cursor.read_u16(2)?;
        let status = if ctx.can_verify(claimed, cursor.captured()) {
            ChecksumStatus::from_sum(checksum, internet_checksum(cursor.slice(0, claimed)?))
        } else {
            ChecksumStatus::Unverified
        };
        layer.checksum("icmp", checksum, status);

        match kind {
            icmp_type::ECHO_REQUEST | icmp_type::ECHO_REPLY => {
                layer.push("identifier", FieldValue::UInt16(cursor.read_u16(4)?));
                layer.push("sequence", FieldValue::UInt16(cursor.read_u16(6)?));
                Ok(Decoded::leaf(ICMP_HEADER_LEN))
            }
            icmp_type::TIMESTAMP_REQUEST | icmp_type::TIMESTAMP_REPLY => {
                layer.push("identifier", FieldValue::UInt16(cursor.read_u16(4)?));
                layer.push("sequence", FieldValue::UInt16(cursor.read_u16(6)?));
                layer.push("originate_timestamp", FieldValue::UInt32(cursor.read_u32(8)?));
                layer.push("receive_timestamp", FieldValue::UInt32(cursor.read_u32(12)?));
                layer.push("transmit_timestamp", FieldValue::UInt32(cursor.read_u32(16)?));
                Ok(Decoded::leaf(ICMP_HEADER_LEN + 12))
            }
            icmp_type::DESTINATION_UNREACHABLE
            | icmp_type::SOURCE_QUENCH
            | icmp_type::REDIRECT
            | icmp_type::TIME_EXCEEDED
            | icmp_type::PARAMETER_PROBLEM => {
                match kind {
                    icmp_type::DESTINATION_UNREACHABLE if code == 4 => {
                        layer.push("next_hop_mtu", FieldValue::UInt16(cursor.read_u16(6)?));
                    }
                    icmp_type::REDIRECT => {
                        layer.push("gateway", FieldValue::IpAddr(cursor.read_ipv4(4)?.into()));
                    }
                    icmp_type::PARAMETER_PROBLEM => {
                        layer.push("pointer", FieldValue::UInt8(cursor.read_u8(4)?));
                    }
                    _ => {}
                }
                Ok(Decoded::to(
                    ICMP_HEADER_LEN,
                    DispatchKey::EtherType(ethertype::IPV4),
                ))
            }
            _ => {
                layer.push("rest_of_header", FieldValue::Hex32(cursor.read_u32(4)?));
                Ok(Decoded::leaf(ICMP_HEADER_LEN))
            }
        }
    }
}
