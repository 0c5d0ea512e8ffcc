//! Ethernet II and IEEE 802.3 dissector.

use compact_str::format_compact;

use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::capture::linktype;
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tokens::TokenTable;

/// Ethernet header length (dst + src + type/length).
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Largest value of the type/length field that is a length (802.3).
const MAX_8023_LENGTH: u16 = 1500;

/// Well-known EtherType values (IEEE 802).
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const TRANSPARENT_BRIDGING: u16 = 0x6558;
    pub const RARP: u16 = 0x8035;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
    pub const PPP: u16 = 0x880B;
    pub const MPLS: u16 = 0x8847;
    pub const PPPOE_DISCOVERY: u16 = 0x8863;
    pub const PPPOE_SESSION: u16 = 0x8864;
    pub const EAPOL: u16 = 0x888E;
    pub const QINQ: u16 = 0x88A8;
    pub const LLDP: u16 = 0x88CC;
    pub const MACSEC: u16 = 0x88E5;
    pub const PTP: u16 = 0x88F7;
    pub const QINQ_LEGACY: u16 = 0x9100;
}

pub const ETHERTYPE_VALUES: TokenTable = &[
    (ethertype::IPV4 as u32, "IPv4"),
    (ethertype::ARP as u32, "ARP"),
    (ethertype::TRANSPARENT_BRIDGING as u32, "Transparent Ethernet Bridging"),
    (ethertype::RARP as u32, "RARP"),
    (ethertype::VLAN as u32, "802.1Q"),
    (ethertype::IPV6 as u32, "IPv6"),
    (ethertype::PPP as u32, "PPP"),
    (ethertype::MPLS as u32, "MPLS unicast"),
    (ethertype::PPPOE_DISCOVERY as u32, "PPPoE D"),
    (ethertype::PPPOE_SESSION as u32, "PPPoE S"),
    (ethertype::EAPOL as u32, "EAPOL"),
    (ethertype::QINQ as u32, "802.1Q-QinQ"),
    (ethertype::LLDP as u32, "LLDP"),
    (ethertype::MACSEC as u32, "MACsec"),
    (ethertype::PTP as u32, "PTP"),
    (ethertype::QINQ_LEGACY as u32, "802.1Q-9100"),
];

/// Ethernet dissector.
///
/// A type/length field of 1500 or less is an 802.3 length; the frame then
/// carries an LLC header whose payload is not decoded further.
#[derive(Debug, Clone, Copy)]
pub struct EthernetDissector;

impl Dissector for EthernetDissector {
    fn name(&self) -> &'static str {
        "ethernet"
    }

    fn display_name(&self) -> &'static str {
        "Ethernet"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::Link(linktype::ETHERNET),
            DispatchKey::EtherType(ethertype::TRANSPARENT_BRIDGING),
        ]
    }

    fn min_header_len(&self) -> usize {
        ETHERNET_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        layer.push("dst_mac", FieldValue::MacAddr(cursor.read_mac(0)?));
        layer.push("src_mac", FieldValue::MacAddr(cursor.read_mac(6)?));

        let type_or_length = cursor.read_u16(12)?;
        if type_or_length > MAX_8023_LENGTH {
            layer.push("ethertype", FieldValue::Hex16(type_or_length));
            layer.push(
                "ethertype_name",
                FieldValue::token(ETHERTYPE_VALUES, u32::from(type_or_length)),
            );
            return Ok(Decoded::to(
                ETHERNET_HEADER_LEN,
                DispatchKey::EtherType(type_or_length),
            ));
        }

        // 802.3: length counts the LLC header and its payload.
        let length = usize::from(type_or_length);
        layer.push("length", FieldValue::UInt16(type_or_length));
        let available = claimed.saturating_sub(ETHERNET_HEADER_LEN);
        if length > available {
            return Err(DissectError::malformed(format_compact!(
                "802.3 length {length} exceeds {available} bytes of frame"
            )));
        }
        if length < 3 {
            return Err(DissectError::malformed(format_compact!(
                "802.3 length {length} too short for LLC header"
            )));
        }

        layer.push("dsap", FieldValue::Hex16(u16::from(cursor.read_u8(14)?)));
        layer.push("ssap", FieldValue::Hex16(u16::from(cursor.read_u8(15)?)));
        layer.push("control", FieldValue::Hex16(u16::from(cursor.read_u8(16)?)));

        Ok(Decoded::leaf(ETHERNET_HEADER_LEN + 3).with_payload_len(length - 3))
    }
}
