//! LLDP (IEEE 802.1AB) dissector.
//!
//! An LLDPDU is a sequence of TLVs with a 16-bit header: 7-bit type and
//! 9-bit value length. The Chassis ID, Port ID and TTL TLVs must come first,
//! in that order; an End TLV closes the PDU.

use compact_str::{format_compact, CompactString};

use super::ethertype;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::format::format_oui;
use crate::tlv::{walk, TlvRecord, TlvShape};
use crate::tokens::{bittok2str, lookup, tok2str, TokenTable};

/// LLDP TLV types.
pub mod tlv_type {
    pub const END: u16 = 0;
    pub const CHASSIS_ID: u16 = 1;
    pub const PORT_ID: u16 = 2;
    pub const TTL: u16 = 3;
    pub const PORT_DESCRIPTION: u16 = 4;
    pub const SYSTEM_NAME: u16 = 5;
    pub const SYSTEM_DESCRIPTION: u16 = 6;
    pub const SYSTEM_CAPABILITIES: u16 = 7;
    pub const MANAGEMENT_ADDRESS: u16 = 8;
    pub const ORGANIZATION_SPECIFIC: u16 = 127;
}

const TLV_VALUES: TokenTable = &[
    (tlv_type::END as u32, "End"),
    (tlv_type::CHASSIS_ID as u32, "Chassis ID"),
    (tlv_type::PORT_ID as u32, "Port ID"),
    (tlv_type::TTL as u32, "Time to Live"),
    (tlv_type::PORT_DESCRIPTION as u32, "Port Description"),
    (tlv_type::SYSTEM_NAME as u32, "System Name"),
    (tlv_type::SYSTEM_DESCRIPTION as u32, "System Description"),
    (tlv_type::SYSTEM_CAPABILITIES as u32, "System Capabilities"),
    (tlv_type::MANAGEMENT_ADDRESS as u32, "Management Address"),
    (tlv_type::ORGANIZATION_SPECIFIC as u32, "Organization specific"),
];

mod chassis_subtype {
    pub const MAC_ADDRESS: u8 = 4;
    pub const NETWORK_ADDRESS: u8 = 5;
}

mod port_subtype {
    pub const MAC_ADDRESS: u8 = 3;
    pub const NETWORK_ADDRESS: u8 = 4;
}

const CHASSIS_SUBTYPE_VALUES: TokenTable = &[
    (1, "Chassis component"),
    (2, "Interface alias"),
    (3, "Port component"),
    (4, "MAC address"),
    (5, "Network address"),
    (6, "Interface name"),
    (7, "Local"),
];

const PORT_SUBTYPE_VALUES: TokenTable = &[
    (1, "Interface alias"),
    (2, "Port component"),
    (3, "MAC address"),
    (4, "Network address"),
    (5, "Interface name"),
    (6, "Agent circuit ID"),
    (7, "Local"),
];

const CAPABILITY_VALUES: TokenTable = &[
    (0x01, "Other"),
    (0x02, "Repeater"),
    (0x04, "Bridge"),
    (0x08, "WLAN AP"),
    (0x10, "Router"),
    (0x20, "Telephone"),
    (0x40, "Docsis"),
    (0x80, "Station Only"),
];

const OUI_VALUES: TokenTable = &[
    (0x00_80c2, "IEEE 802.1"),
    (0x00_120f, "IEEE 802.3"),
    (0x00_12bb, "TIA"),
];

/// Address family numbers used by network address subtypes.
const AF_IPV4: u8 = 1;
const AF_IPV6: u8 = 2;

#[derive(Debug, Clone, Copy)]
pub struct LldpDissector;

impl Dissector for LldpDissector {
    fn name(&self) -> &'static str {
        "lldp"
    }

    fn display_name(&self) -> &'static str {
        "LLDP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::EtherType(ethertype::LLDP)]
    }

    fn min_header_len(&self) -> usize {
        2
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let mut walker = walk(cursor, 0, claimed, TlvShape::PackedTypeLength);
        let mut index = 0;
        let mut ended = false;

        for record in walker.by_ref() {
            let record = record?;
            let expected = match index {
                0 => Some(tlv_type::CHASSIS_ID),
                1 => Some(tlv_type::PORT_ID),
                2 => Some(tlv_type::TTL),
                _ => None,
            };
            if let Some(expected) = expected.filter(|&kind| kind != record.kind) {
                layer.info(format_compact!(
                    "expected {} TLV, found type {}",
                    tok2str(TLV_VALUES, u32::from(expected)),
                    record.kind
                ));
            }
            index += 1;

            if record.kind == tlv_type::END {
                ended = true;
                break;
            }
            let value = decode_tlv(&record, layer)?;
            layer.option(
                record.kind,
                tok2str(TLV_VALUES, u32::from(record.kind)),
                record.length,
                value,
            );
        }

        if !ended {
            layer.info("LLDPDU not terminated by End TLV");
        }
        Ok(Decoded::leaf(walker.consumed()))
    }
}

/// Decode one TLV value, also lifting the well-known ones into fields.
fn decode_tlv<'a>(
    record: &TlvRecord<'a>,
    layer: &mut Layer<'a>,
) -> Result<FieldValue<'a>, DissectError> {
    let value = record.value;
    let data = record.value_cursor();
    Ok(match record.kind {
        tlv_type::CHASSIS_ID => {
            let id = subtyped_id(
                value,
                CHASSIS_SUBTYPE_VALUES,
                chassis_subtype::MAC_ADDRESS,
                chassis_subtype::NETWORK_ADDRESS,
            );
            layer.push("chassis_id", id.clone());
            id
        }
        tlv_type::PORT_ID => {
            let id = subtyped_id(
                value,
                PORT_SUBTYPE_VALUES,
                port_subtype::MAC_ADDRESS,
                port_subtype::NETWORK_ADDRESS,
            );
            layer.push("port_id", id.clone());
            id
        }
        tlv_type::TTL if value.len() == 2 => {
            let ttl = FieldValue::UInt16(data.read_u16(0)?);
            layer.push("ttl", ttl.clone());
            ttl
        }
        tlv_type::PORT_DESCRIPTION => {
            layer.push("port_description", FieldValue::text(value));
            FieldValue::text(value)
        }
        tlv_type::SYSTEM_NAME => {
            layer.push("system_name", FieldValue::text(value));
            FieldValue::text(value)
        }
        tlv_type::SYSTEM_DESCRIPTION => FieldValue::text(value),
        tlv_type::SYSTEM_CAPABILITIES if value.len() == 4 => {
            let system = u32::from(data.read_u16(0)?);
            let enabled = u32::from(data.read_u16(2)?);
            FieldValue::OwnedString(format_compact!(
                "system {}, enabled {}",
                bittok2str(CAPABILITY_VALUES, system),
                bittok2str(CAPABILITY_VALUES, enabled)
            ))
        }
        tlv_type::MANAGEMENT_ADDRESS => management_address(value),
        tlv_type::ORGANIZATION_SPECIFIC if value.len() >= 4 => {
            let oui = data.read_u24(0)?;
            let org = match lookup(OUI_VALUES, oui) {
                Some(name) => CompactString::from(name),
                None => CompactString::from(format_oui(oui)),
            };
            FieldValue::OwnedString(format_compact!(
                "{org} subtype {} ({} bytes)",
                data.read_u8(3)?,
                value.len() - 4
            ))
        }
        _ => FieldValue::Bytes(value),
    })
}

/// Chassis and Port ID values: a subtype byte, then an identifier whose
/// form depends on the subtype.
fn subtyped_id<'a>(value: &'a [u8], subtypes: TokenTable, mac: u8, network: u8) -> FieldValue<'a> {
    let Some((&subtype, id)) = value.split_first() else {
        return FieldValue::Null;
    };
    match subtype {
        s if s == mac && id.len() == 6 => FieldValue::mac(id),
        s if s == network => network_address(id),
        s if lookup(subtypes, u32::from(s)).is_some() => FieldValue::text(id),
        _ => FieldValue::Bytes(id),
    }
}

/// Address family byte followed by the address.
fn network_address(value: &[u8]) -> FieldValue<'_> {
    match value.split_first() {
        Some((&AF_IPV4, addr)) if addr.len() == 4 => FieldValue::ipv4(addr),
        Some((&AF_IPV6, addr)) if addr.len() == 16 => FieldValue::ipv6(addr),
        _ => FieldValue::Bytes(value),
    }
}

/// Management address: string length (covering subtype and address),
/// address subtype, address. Interface numbering follows and is not decoded.
fn management_address(value: &[u8]) -> FieldValue<'_> {
    let Some((&len, rest)) = value.split_first() else {
        return FieldValue::Null;
    };
    match rest.get(..usize::from(len)) {
        Some(addr) if len > 0 => network_address(addr),
        _ => FieldValue::Bytes(value),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use super::*;
    use crate::capture::linktype;
    use crate::protocol::{dissect, Handoff, Stop};

    fn tlv(kind: u16, value: &[u8]) -> Vec<u8> {
        let header = (kind << 9) | value.len() as u16;
        let mut out = header.to_be_bytes().to_vec();
        out.extend_from_slice(value);
        out
    }

    fn lldpdu() -> Vec<u8> {
        let mut pdu = Vec::new();
        pdu.extend(tlv(1, &[4, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        pdu.extend(tlv(2, b"\x05eth0"));
        pdu.extend(tlv(3, &[0x00, 0x78]));
        pdu.extend(tlv(5, b"switch-1"));
        pdu.extend(tlv(7, &[0x00, 0x14, 0x00, 0x04]));
        pdu.extend(tlv(8, &[5, 1, 10, 0, 0, 1, 2, 0, 0, 0, 1, 0]));
        pdu.extend(tlv(127, &[0x00, 0x12, 0x0f, 0x01, 0x03, 0x6c, 0x00, 0x00, 0x10]));
        pdu.extend(tlv(0, &[]));
        pdu
    }

    #[test]
    fn test_lldpdu() {
        let pdu = lldpdu();
        let (result, layer) = dissect_one(&LldpDissector, &pdu);
        let decoded = result.unwrap();

        assert_eq!(decoded.consumed, pdu.len());
        assert_eq!(decoded.next, Handoff::Leaf);
        assert_field_eq(
            &layer,
            "chassis_id",
            FieldValue::MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
        );
        assert_field_eq(&layer, "port_id", FieldValue::Str("eth0"));
        assert_field_eq(&layer, "ttl", FieldValue::UInt16(120));
        assert_field_eq(&layer, "system_name", FieldValue::Str("switch-1"));
        assert!(layer.notes.is_empty());

        let value = |kind| layer.find_option(kind).unwrap().value.to_string();
        assert_eq!(
            value(tlv_type::SYSTEM_CAPABILITIES),
            "system Bridge,Router, enabled Bridge"
        );
        assert_eq!(value(tlv_type::MANAGEMENT_ADDRESS), "10.0.0.1");
        assert_eq!(
            value(tlv_type::ORGANIZATION_SPECIFIC),
            "IEEE 802.3 subtype 1 (5 bytes)"
        );
    }

    #[test]
    fn test_out_of_order_mandatory_tlvs() {
        let mut pdu = tlv(2, b"\x05eth0");
        pdu.extend(tlv(1, &[7, b'x']));
        pdu.extend(tlv(3, &[0, 1]));
        pdu.extend(tlv(0, &[]));
        let (result, layer) = dissect_one(&LldpDissector, &pdu);
        assert!(result.is_ok());
        assert_eq!(layer.notes.len(), 2);
        assert_eq!(
            layer.notes[0].to_string(),
            "[expected Chassis ID TLV, found type 2]"
        );
    }

    #[test]
    fn test_tlv_length_overrun() {
        let mut pdu = tlv(1, &[4, 0, 0, 0, 0, 0, 0]);
        // Type 5, length 300, only three bytes follow.
        pdu.extend_from_slice(&[0x0b, 0x2c, b'a', b'b', b'c']);
        let (result, layer) = dissect_one(&LldpDissector, &pdu);
        assert_eq!(
            result.unwrap_err(),
            DissectError::malformed("TLV length 302 exceeds remaining 5")
        );
        assert_eq!(layer.options.len(), 1);
    }

    #[test]
    fn test_missing_end_is_noted() {
        let mut pdu = tlv(1, &[7, b'a']);
        pdu.extend(tlv(2, &[7, b'b']));
        pdu.extend(tlv(3, &[0, 30]));
        let (result, layer) = dissect_one(&LldpDissector, &pdu);
        assert_eq!(result.unwrap().consumed, pdu.len());
        assert_eq!(layer.notes[0].to_string(), "[LLDPDU not terminated by End TLV]");
    }

    #[test]
    fn test_lldp_frame_with_padding() {
        let mut frame = EthernetBuilder::new()
            .dst([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e])
            .ethertype(0x88cc)
            .payload(&lldpdu())
            .build();
        frame.resize(frame.len() + 10, 0);

        let dissection = dissect(linktype::ETHERNET, &frame);
        assert_eq!(dissection.protocols(), ["ethernet", "lldp"]);
        assert!(matches!(dissection.stop, Stop::Complete { claimed: 10, .. }));
    }
}
