//! DHCP / BOOTP dissector.
//!
//! Decodes the fixed BOOTP header and, when the DHCP magic cookie follows
//! it, the options area. Registered on UDP ports 67 and 68.

use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tlv::{walk, TlvRecord, TlvShape};
use crate::tokens::{tok2str, TokenTable};

/// DHCP server port.
pub const DHCP_SERVER_PORT: u16 = 67;

/// DHCP client port.
pub const DHCP_CLIENT_PORT: u16 = 68;

/// BOOTP header size (without the magic cookie and options).
pub const BOOTP_HEADER_LEN: usize = 236;

/// DHCP magic cookie (0x63825363).
const DHCP_MAGIC_COOKIE: u32 = 0x6382_5363;

const OPTIONS_START: usize = BOOTP_HEADER_LEN + 4;

/// DHCP message types (option 53).
pub mod message_type {
    pub const DISCOVER: u8 = 1;
    pub const OFFER: u8 = 2;
    pub const REQUEST: u8 = 3;
    pub const DECLINE: u8 = 4;
    pub const ACK: u8 = 5;
    pub const NAK: u8 = 6;
    pub const RELEASE: u8 = 7;
    pub const INFORM: u8 = 8;
}

/// DHCP option codes (RFC 2132).
pub mod option {
    pub const PAD: u16 = 0;
    pub const SUBNET_MASK: u16 = 1;
    pub const ROUTER: u16 = 3;
    pub const DNS_SERVERS: u16 = 6;
    pub const HOSTNAME: u16 = 12;
    pub const DOMAIN_NAME: u16 = 15;
    pub const REQUESTED_IP: u16 = 50;
    pub const LEASE_TIME: u16 = 51;
    pub const MESSAGE_TYPE: u16 = 53;
    pub const SERVER_ID: u16 = 54;
    pub const PARAMETER_REQUEST_LIST: u16 = 55;
    pub const MAX_MESSAGE_SIZE: u16 = 57;
    pub const RENEWAL_TIME: u16 = 58;
    pub const REBINDING_TIME: u16 = 59;
    pub const VENDOR_CLASS_ID: u16 = 60;
    pub const CLIENT_ID: u16 = 61;
    pub const END: u16 = 255;
}

const OP_VALUES: TokenTable = &[(1, "BOOTREQUEST"), (2, "BOOTREPLY")];

const MESSAGE_TYPE_VALUES: TokenTable = &[
    (message_type::DISCOVER as u32, "Discover"),
    (message_type::OFFER as u32, "Offer"),
    (message_type::REQUEST as u32, "Request"),
    (message_type::DECLINE as u32, "Decline"),
    (message_type::ACK as u32, "ACK"),
    (message_type::NAK as u32, "NACK"),
    (message_type::RELEASE as u32, "Release"),
    (message_type::INFORM as u32, "Inform"),
];

const OPTION_VALUES: TokenTable = &[
    (option::SUBNET_MASK as u32, "Subnet-Mask"),
    (2, "Time-Zone"),
    (option::ROUTER as u32, "Default-Gateway"),
    (option::DNS_SERVERS as u32, "Domain-Name-Server"),
    (option::HOSTNAME as u32, "Hostname"),
    (option::DOMAIN_NAME as u32, "Domain-Name"),
    (28, "BR"),
    (42, "NTP"),
    (option::REQUESTED_IP as u32, "Requested-IP"),
    (option::LEASE_TIME as u32, "Lease-Time"),
    (option::MESSAGE_TYPE as u32, "DHCP-Message"),
    (option::SERVER_ID as u32, "Server-ID"),
    (option::PARAMETER_REQUEST_LIST as u32, "Parameter-Request"),
    (option::MAX_MESSAGE_SIZE as u32, "MSZ"),
    (option::RENEWAL_TIME as u32, "RN"),
    (option::REBINDING_TIME as u32, "RB"),
    (option::VENDOR_CLASS_ID as u32, "Vendor-Class"),
    (option::CLIENT_ID as u32, "Client-ID"),
    (81, "Client-FQDN"),
    (82, "Agent-Information"),
    (119, "Domain-Search"),
    (121, "Classless-Static-Route"),
    (option::END as u32, "END"),
];

#[derive(Debug, Clone, Copy)]
pub struct DhcpDissector;

impl Dissector for DhcpDissector {
    fn name(&self) -> &'static str {
        "dhcp"
    }

    fn display_name(&self) -> &'static str {
        "DHCP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::UdpPort(DHCP_SERVER_PORT),
            DispatchKey::UdpPort(DHCP_CLIENT_PORT),
        ]
    }

    fn min_header_len(&self) -> usize {
        BOOTP_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let op = cursor.read_u8(0)?;
        layer.push("op", FieldValue::token(OP_VALUES, u32::from(op)));
        layer.push("htype", FieldValue::UInt8(cursor.read_u8(1)?));
        let hlen = cursor.read_u8(2)?;
        layer.push("hlen", FieldValue::UInt8(hlen));
        layer.push("hops", FieldValue::UInt8(cursor.read_u8(3)?));
        layer.push("xid", FieldValue::Hex32(cursor.read_u32(4)?));
        layer.push("secs", FieldValue::UInt16(cursor.read_u16(8)?));
        let flags = cursor.read_u16(10)?;
        layer.push("flags", FieldValue::Hex16(flags));
        layer.push("broadcast", FieldValue::Bool(flags & 0x8000 != 0));

        for (name, offset) in [("ciaddr", 12), ("yiaddr", 16), ("siaddr", 20), ("giaddr", 24)] {
            layer.push(name, FieldValue::IpAddr(cursor.read_ipv4(offset)?.into()));
        }

        let chaddr = cursor.slice(28, usize::from(hlen).min(16))?;
        layer.push(
            "chaddr",
            match chaddr.len() {
                6 => FieldValue::mac(chaddr),
                _ => FieldValue::Bytes(chaddr),
            },
        );

        // Server name and boot file are NUL-padded strings.
        for (name, offset, len) in [("sname", 44, 64), ("file", 108, 128)] {
            let raw = cursor.slice(offset, len)?;
            let text = raw.split(|&b| b == 0).next().unwrap_or_default();
            if !text.is_empty() {
                layer.push(name, FieldValue::text(text));
            }
        }

        if claimed < OPTIONS_START || cursor.read_u32(BOOTP_HEADER_LEN)? != DHCP_MAGIC_COOKIE {
            layer.info("no DHCP magic cookie, BOOTP");
            return Ok(Decoded::leaf(BOOTP_HEADER_LEN));
        }

        let mut terminated = false;
        for record in walk(cursor, OPTIONS_START, claimed - OPTIONS_START, TlvShape::DHCP_OPTIONS) {
            let record = record?;
            match record.kind {
                option::PAD => continue,
                option::END => {
                    terminated = true;
                    continue;
                }
                option::MESSAGE_TYPE if record.value.len() == 1 => {
                    let kind = record.value_cursor().read_u8(0)?;
                    layer.push(
                        "message_type",
                        FieldValue::token(MESSAGE_TYPE_VALUES, u32::from(kind)),
                    );
                }
                _ => {}
            }
            layer.option(
                record.kind,
                tok2str(OPTION_VALUES, u32::from(record.kind)),
                record.length,
                option_value(&record)?,
            );
        }
        if !terminated {
            layer.info("options not terminated by END");
        }

        // Anything after END is padding within the options field.
        Ok(Decoded::leaf(claimed))
    }
}

fn option_value<'a>(record: &TlvRecord<'a>) -> Result<FieldValue<'a>, DissectError> {
    let value = record.value;
    let data = record.value_cursor();
    Ok(match (record.kind, value.len()) {
        (option::MESSAGE_TYPE, 1) => {
            FieldValue::token(MESSAGE_TYPE_VALUES, u32::from(data.read_u8(0)?))
        }
        (option::SUBNET_MASK | option::REQUESTED_IP | option::SERVER_ID, 4) => {
            FieldValue::ipv4(value)
        }
        (option::ROUTER | option::DNS_SERVERS, len) if len > 0 && len % 4 == 0 => {
            FieldValue::ipv4_list(value)
        }
        (option::HOSTNAME | option::DOMAIN_NAME | option::VENDOR_CLASS_ID, _) => {
            FieldValue::text(value)
        }
        (option::LEASE_TIME | option::RENEWAL_TIME | option::REBINDING_TIME, 4) => {
            FieldValue::UInt32(data.read_u32(0)?)
        }
        (option::MAX_MESSAGE_SIZE, 2) => FieldValue::UInt16(data.read_u16(0)?),
        (option::PARAMETER_REQUEST_LIST, _) => FieldValue::List(
            value
                .iter()
                .map(|&code| FieldValue::token(OPTION_VALUES, u32::from(code)))
                .collect(),
        ),
        // Hardware type 1 followed by a MAC address.
        (option::CLIENT_ID, 7) if data.read_u8(0)? == 1 => FieldValue::mac(data.slice(1, 6)?),
        (option::CLIENT_ID, _) => FieldValue::Bytes(value),
        (_, 0) => FieldValue::Null,
        _ => FieldValue::Bytes(value),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use super::*;
    use crate::capture::linktype;
    use crate::protocol::{dissect, Handoff, Stop};

    fn bootp(op: u8, options: Option<&[u8]>) -> Vec<u8> {
        let mut msg = vec![0u8; BOOTP_HEADER_LEN];
        msg[0] = op;
        msg[1] = 1;
        msg[2] = 6;
        msg[4..8].copy_from_slice(&0x3903_f326u32.to_be_bytes());
        msg[10] = 0x80;
        msg[16..20].copy_from_slice(&[192, 168, 0, 10]);
        msg[28..34].copy_from_slice(&[0x00, 0x0b, 0x82, 0x01, 0xfc, 0x42]);
        msg[44..48].copy_from_slice(b"boot");
        if let Some(options) = options {
            msg.extend_from_slice(&DHCP_MAGIC_COOKIE.to_be_bytes());
            msg.extend_from_slice(options);
        }
        msg
    }

    #[test]
    fn test_dhcp_discover() {
        let options = [
            53, 1, 1, // Discover
            0, // pad
            55, 4, 1, 3, 6, 15, // parameter request list
            61, 7, 1, 0x00, 0x0b, 0x82, 0x01, 0xfc, 0x42, // client id
            255, 0, 0,
        ];
        let msg = bootp(1, Some(&options));
        let (result, layer) = dissect_one(&DhcpDissector, &msg);
        let decoded = result.unwrap();

        assert_eq!(decoded.consumed, msg.len());
        assert_eq!(decoded.next, Handoff::Leaf);
        assert_field_eq(&layer, "op", FieldValue::Str("BOOTREQUEST"));
        assert_field_eq(&layer, "xid", FieldValue::Hex32(0x3903_f326));
        assert_field_eq(&layer, "broadcast", FieldValue::Bool(true));
        assert_field_eq(&layer, "message_type", FieldValue::Str("Discover"));
        assert_field_eq(&layer, "sname", FieldValue::Str("boot"));
        assert_eq!(layer.get("yiaddr").unwrap().to_string(), "192.168.0.10");
        assert_eq!(layer.get("chaddr").unwrap().to_string(), "00:0b:82:01:fc:42");

        // Pad and END are not recorded.
        let kinds: Vec<u16> = layer.options.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, [53, 55, 61]);
        assert_eq!(
            layer.find_option(option::PARAMETER_REQUEST_LIST).unwrap().value.to_string(),
            "[Subnet-Mask, Default-Gateway, Domain-Name-Server, Domain-Name]"
        );
        assert_eq!(
            layer.find_option(option::CLIENT_ID).unwrap().value,
            FieldValue::MacAddr([0x00, 0x0b, 0x82, 0x01, 0xfc, 0x42])
        );
        assert!(layer.notes.is_empty());
    }

    #[test]
    fn test_dhcp_offer_options() {
        let options = [
            53, 1, 2, //
            1, 4, 255, 255, 255, 0, //
            3, 4, 192, 168, 0, 1, //
            6, 8, 8, 8, 8, 8, 8, 8, 4, 4, //
            51, 4, 0, 0, 0x0e, 0x10, //
            54, 4, 192, 168, 0, 1, //
            15, 7, b'e', b'x', b'.', b'l', b'a', b'n', b'0', //
            255,
        ];
        let msg = bootp(2, Some(&options));
        let (result, layer) = dissect_one(&DhcpDissector, &msg);
        assert!(result.is_ok());

        let value = |kind| layer.find_option(kind).unwrap().value.to_string();
        assert_eq!(value(option::SUBNET_MASK), "255.255.255.0");
        assert_eq!(value(option::DNS_SERVERS), "[8.8.8.8, 8.8.4.4]");
        assert_eq!(value(option::LEASE_TIME), "3600");
        assert_eq!(value(option::DOMAIN_NAME), "ex.lan0");
        assert_field_eq(&layer, "message_type", FieldValue::Str("Offer"));
    }

    #[test]
    fn test_plain_bootp() {
        let msg = bootp(2, None);
        let (result, layer) = dissect_one(&DhcpDissector, &msg);
        assert_eq!(result.unwrap().consumed, BOOTP_HEADER_LEN);
        assert!(layer.options.is_empty());
        assert_eq!(layer.notes.len(), 1);
    }

    #[test]
    fn test_missing_end_is_noted() {
        let msg = bootp(1, Some(&[53, 1, 3]));
        let (result, layer) = dissect_one(&DhcpDissector, &msg);
        assert!(result.is_ok());
        assert_eq!(layer.notes[0].to_string(), "[options not terminated by END]");
    }

    #[test]
    fn test_option_overrun_is_malformed() {
        let msg = bootp(1, Some(&[53, 1, 1, 12, 200, b'h']));
        let (result, layer) = dissect_one(&DhcpDissector, &msg);
        assert_eq!(
            result.unwrap_err(),
            DissectError::malformed("TLV length 202 exceeds remaining 3")
        );
        assert_eq!(layer.options.len(), 1);
    }

    #[test]
    fn test_dhcp_over_udp() {
        let msg = bootp(1, Some(&[53, 1, 1, 255]));
        let udp = UdpBuilder::new()
            .src_port(68)
            .dst_port(67)
            .payload(&msg)
            .build_v4([0, 0, 0, 0], [255, 255, 255, 255]);
        let ip = Ipv4Builder::new()
            .src([0, 0, 0, 0])
            .dst([255, 255, 255, 255])
            .protocol(17)
            .payload(&udp)
            .build();
        let frame = EthernetBuilder::new().ethertype(0x0800).payload(&ip).build();

        let dissection = dissect(linktype::ETHERNET, &frame);
        assert_eq!(dissection.protocols(), ["ethernet", "ipv4", "udp", "dhcp"]);
        assert!(matches!(dissection.stop, Stop::Complete { claimed: 0, .. }));
    }
}
