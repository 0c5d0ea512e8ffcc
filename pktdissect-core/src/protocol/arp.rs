//! ARP / RARP dissector.
//!
//! Address widths come from the header's hardware and protocol length
//! fields, so the record size is only known after the fixed part is read.

use compact_str::format_compact;

use super::ethertype;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tokens::TokenTable;

/// Fixed part: htype, ptype, hlen, plen, oper.
pub const ARP_FIXED_LEN: usize = 8;

pub mod opcode {
    pub const REQUEST: u16 = 1;
    pub const REPLY: u16 = 2;
    pub const REVERSE_REQUEST: u16 = 3;
    pub const REVERSE_REPLY: u16 = 4;
    pub const INVERSE_REQUEST: u16 = 8;
    pub const INVERSE_REPLY: u16 = 9;
    pub const NAK: u16 = 10;
}

const OPCODE_VALUES: TokenTable = &[
    (opcode::REQUEST as u32, "Request"),
    (opcode::REPLY as u32, "Reply"),
    (opcode::REVERSE_REQUEST as u32, "Reverse Request"),
    (opcode::REVERSE_REPLY as u32, "Reverse Reply"),
    (opcode::INVERSE_REQUEST as u32, "Inverse Request"),
    (opcode::INVERSE_REPLY as u32, "Inverse Reply"),
    (opcode::NAK as u32, "NACK Reply"),
];

const HARDWARE_VALUES: TokenTable = &[
    (1, "Ethernet"),
    (6, "IEEE 802"),
    (15, "Frame Relay"),
    (24, "IEEE 1394"),
    (32, "InfiniBand"),
];

/// Render an address by its width: MAC for 6 bytes, IPv4 for 4, IPv6 for
/// 16, hex otherwise.
fn address(bytes: &[u8]) -> FieldValue<'_> {
    match bytes.len() {
        4 => FieldValue::ipv4(bytes),
        6 => FieldValue::mac(bytes),
        16 => FieldValue::ipv6(bytes),
        _ => FieldValue::Bytes(bytes),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArpDissector;

impl Dissector for ArpDissector {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn display_name(&self) -> &'static str {
        "ARP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::EtherType(ethertype::ARP),
            DispatchKey::EtherType(ethertype::RARP),
        ]
    }

    fn min_header_len(&self) -> usize {
        ARP_FIXED_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let htype = cursor.read_u16(0)?;
        let ptype = cursor.read_u16(2)?;
        let hlen = usize::from(cursor.read_u8(4)?);
        let plen = usize::from(cursor.read_u8(5)?);
        let oper = cursor.read_u16(6)?;

        layer.push("hardware_type", FieldValue::token(HARDWARE_VALUES, u32::from(htype)));
        layer.push("protocol_type", FieldValue::Hex16(ptype));
        layer.push("hardware_size", FieldValue::UInt8(hlen as u8));
        layer.push("protocol_size", FieldValue::UInt8(plen as u8));
        layer.push("operation", FieldValue::token(OPCODE_VALUES, u32::from(oper)));

        let total = ARP_FIXED_LEN + 2 * (hlen + plen);
        if total > claimed {
            return Err(DissectError::malformed(format_compact!(
                "addresses need {total} bytes, {claimed} available"
            )));
        }

        let mut offset = ARP_FIXED_LEN;
        for (name, len) in [
            ("sender_hw_addr", hlen),
            ("sender_proto_addr", plen),
            ("target_hw_addr", hlen),
            ("target_proto_addr", plen),
        ] {
            layer.push(name, address(cursor.slice(offset, len)?));
            offset += len;
        }

        Ok(Decoded::leaf(total))
    }
}
