//! Linux cooked capture (SLL v1) dissector.
//!
//! Used when capturing on the "any" interface or on devices without a
//! native link-layer header (LINKTYPE_LINUX_SLL = 113).

use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::capture::linktype;
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tokens::TokenTable;

/// Linux SLL header length in bytes.
pub const LINUX_SLL_HEADER_LEN: usize = 16;

/// Bytes reserved for the link-layer address.
const SLL_ADDR_LEN: usize = 8;

/// ARPHRD types (link layer hardware types).
pub mod arphrd {
    pub const ETHER: u16 = 1;
    pub const FRAD: u16 = 770;
    pub const LOOPBACK: u16 = 772;
    pub const IPGRE: u16 = 778;
    pub const IEEE80211_RADIOTAP: u16 = 803;
    pub const IP6GRE: u16 = 823;
    pub const NETLINK: u16 = 824;
}

const PACKET_TYPE_VALUES: TokenTable = &[
    (0, "In"),
    (1, "B"),
    (2, "M"),
    (3, "P"),
    (4, "Out"),
];

const ARPHRD_VALUES: TokenTable = &[
    (arphrd::ETHER as u32, "ETHER"),
    (arphrd::FRAD as u32, "FRAD"),
    (arphrd::LOOPBACK as u32, "LOOPBACK"),
    (arphrd::IPGRE as u32, "IPGRE"),
    (arphrd::IEEE80211_RADIOTAP as u32, "IEEE80211_RADIOTAP"),
    (arphrd::IP6GRE as u32, "IP6GRE"),
    (arphrd::NETLINK as u32, "NETLINK"),
];

/// Linux SLL dissector.
///
/// For Ethernet-like devices the protocol field is an EtherType; values of
/// 1500 and below are Linux-internal protocol numbers and end the walk.
#[derive(Debug, Clone, Copy)]
pub struct LinuxSllDissector;

impl Dissector for LinuxSllDissector {
    fn name(&self) -> &'static str {
        "linux_sll"
    }

    fn display_name(&self) -> &'static str {
        "Linux SLL"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::Link(linktype::LINUX_SLL)]
    }

    fn min_header_len(&self) -> usize {
        LINUX_SLL_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        _claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let pkt_type = cursor.read_u16(0)?;
        let arphrd_type = cursor.read_u16(2)?;
        let addr_len = cursor.read_u16(4)?;
        let protocol = cursor.read_u16(14)?;

        layer.push(
            "packet_type",
            FieldValue::token(PACKET_TYPE_VALUES, u32::from(pkt_type)),
        );
        layer.push(
            "arphrd_type",
            FieldValue::token(ARPHRD_VALUES, u32::from(arphrd_type)),
        );
        layer.push("addr_len", FieldValue::UInt16(addr_len));

        // Only the first addr_len bytes of the 8-byte field are valid.
        let addr = cursor.slice(6, usize::from(addr_len).min(SLL_ADDR_LEN))?;
        if addr.len() == 6 {
            layer.push("addr", FieldValue::mac(addr));
        } else if !addr.is_empty() {
            layer.push("addr", FieldValue::Bytes(addr));
        }

        layer.push("protocol", FieldValue::Hex16(protocol));

        match arphrd_type {
            arphrd::NETLINK => Ok(Decoded::leaf(LINUX_SLL_HEADER_LEN)),
            _ if protocol <= 1500 => Ok(Decoded::leaf(LINUX_SLL_HEADER_LEN)),
            _ => Ok(Decoded::to(
                LINUX_SLL_HEADER_LEN,
                DispatchKey::EtherType(protocol),
            )),
        }
    }
}
