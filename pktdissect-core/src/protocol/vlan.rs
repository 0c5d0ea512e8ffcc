//! IEEE 802.1Q / 802.1ad VLAN tag dissector.

use super::ethertype;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Layer};
use crate::bits;
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tokens::TokenTable;

/// VLAN tag length (TCI + inner EtherType).
pub const VLAN_TAG_LEN: usize = 4;

/// 802.1p priority code point names.
const PCP_VALUES: TokenTable = &[
    (0, "BE"),
    (1, "BK"),
    (2, "EE"),
    (3, "CA"),
    (4, "VI"),
    (5, "VO"),
    (6, "IC"),
    (7, "NC"),
];

/// VLAN dissector.
///
/// TCI layout: PCP (3 bits), DEI (1 bit), VID (12 bits).
#[derive(Debug, Clone, Copy)]
pub struct VlanDissector;

impl Dissector for VlanDissector {
    fn name(&self) -> &'static str {
        "vlan"
    }

    fn display_name(&self) -> &'static str {
        "802.1Q VLAN"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[
            DispatchKey::EtherType(ethertype::VLAN),
            DispatchKey::EtherType(ethertype::QINQ),
            DispatchKey::EtherType(ethertype::QINQ_LEGACY),
        ]
    }

    fn min_header_len(&self) -> usize {
        VLAN_TAG_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        _claimed: usize,
        _ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let tci = u32::from(cursor.read_u16(0)?);
        let pcp = bits::field(tci, 13, 3);

        layer.push("priority", FieldValue::UInt8(pcp as u8));
        layer.push("priority_name", FieldValue::token(PCP_VALUES, pcp));
        layer.push("dei", FieldValue::Bool(bits::flag(tci, 12)));
        layer.push("vlan_id", FieldValue::UInt16(bits::field(tci, 0, 12) as u16));

        let inner = cursor.read_u16(2)?;
        layer.push("ethertype", FieldValue::Hex16(inner));

        Ok(Decoded::to(VLAN_TAG_LEN, DispatchKey::EtherType(inner)))
    }
}
