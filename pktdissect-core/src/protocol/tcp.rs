//! TCP dissector.

use compact_str::{format_compact, CompactString};

use super::ipv4::ip_protocol;
use super::{Decoded, DispatchKey, DissectContext, Dissector, FieldValue, Handoff, Layer, Transport};
use crate::bits;
use crate::checksum::ChecksumStatus;
use crate::cursor::Cursor;
use crate::error::DissectError;
use crate::tlv::{walk, TlvRecord, TlvShape};
use crate::tokens::{bittok2str, tok2str, TokenTable};

/// TCP header without options.
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// TCP flag bits, as found in the low 9 bits of the offset/flags halfword.
pub mod tcp_flags {
    pub const FIN: u16 = 0x001;
    pub const SYN: u16 = 0x002;
    pub const RST: u16 = 0x004;
    pub const PSH: u16 = 0x008;
    pub const ACK: u16 = 0x010;
    pub const URG: u16 = 0x020;
    pub const ECE: u16 = 0x040;
    pub const CWR: u16 = 0x080;
    pub const NS: u16 = 0x100;
}

const TCP_FLAG_VALUES: TokenTable = &[
    (tcp_flags::FIN as u32, "FIN"),
    (tcp_flags::SYN as u32, "SYN"),
    (tcp_flags::RST as u32, "RST"),
    (tcp_flags::PSH as u32, "PSH"),
    (tcp_flags::ACK as u32, "ACK"),
    (tcp_flags::URG as u32, "URG"),
    (tcp_flags::ECE as u32, "ECE"),
    (tcp_flags::CWR as u32, "CWR"),
    (tcp_flags::NS as u32, "NS"),
];

/// TCP option kinds.
pub mod option_kind {
    pub const EOL: u16 = 0;
    pub const NOP: u16 = 1;
    pub const MSS: u16 = 2;
    pub const WINDOW_SCALE: u16 = 3;
    pub const SACK_PERMITTED: u16 = 4;
    pub const SACK: u16 = 5;
    pub const TIMESTAMP: u16 = 8;
    pub const USER_TIMEOUT: u16 = 28;
    pub const TCP_AO: u16 = 29;
    pub const MPTCP: u16 = 30;
    pub const FAST_OPEN: u16 = 34;
}

const OPTION_VALUES: TokenTable = &[
    (option_kind::EOL as u32, "eol"),
    (option_kind::NOP as u32, "nop"),
    (option_kind::MSS as u32, "mss"),
    (option_kind::WINDOW_SCALE as u32, "wscale"),
    (option_kind::SACK_PERMITTED as u32, "sackOK"),
    (option_kind::SACK as u32, "sack"),
    (option_kind::TIMESTAMP as u32, "TS"),
    (option_kind::USER_TIMEOUT as u32, "uto"),
    (option_kind::TCP_AO as u32, "tcp-ao"),
    (option_kind::MPTCP as u32, "mptcp"),
    (option_kind::FAST_OPEN as u32, "tfo"),
];

/// TCP dissector.
#[derive(Debug, Clone, Copy)]
pub struct TcpDissector;

impl Dissector for TcpDissector {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn display_name(&self) -> &'static str {
        "TCP"
    }

    fn keys(&self) -> &'static [DispatchKey] {
        &[DispatchKey::IpProtocol(ip_protocol::TCP)]
    }

    fn min_header_len(&self) -> usize {
        TCP_MIN_HEADER_LEN
    }

    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        let src_port = cursor.read_u16(0)?;
        let dst_port = cursor.read_u16(2)?;
        layer.push("src_port", FieldValue::UInt16(src_port));
        layer.push("dst_port", FieldValue::UInt16(dst_port));
        layer.push("seq", FieldValue::UInt32(cursor.read_u32(4)?));
        layer.push("ack", FieldValue::UInt32(cursor.read_u32(8)?));

        let offset_flags = u32::from(cursor.read_u16(12)?);
        let data_offset = bits::field(offset_flags, 12, 4);
        let header_len = data_offset as usize * 4;
        let flags = bits::field(offset_flags, 0, 9);
        layer.push("data_offset", FieldValue::UInt8(data_offset as u8));
        layer.push("flags", FieldValue::Hex16(flags as u16));
        layer.push(
            "flags_str",
            FieldValue::OwnedString(CompactString::from(bittok2str(TCP_FLAG_VALUES, flags))),
        );
        if header_len < TCP_MIN_HEADER_LEN {
            return Err(DissectError::malformed(format_compact!(
                "data offset {data_offset} below minimum 5"
            )));
        }
        if header_len > claimed {
            return Err(DissectError::malformed(format_compact!(
                "header length {header_len} exceeds segment length {claimed}"
            )));
        }

        layer.push("window", FieldValue::UInt16(cursor.read_u16(14)?));

        // The checksum covers the pseudo-header and the whole segment.
        let checksum = cursor.read_u16(16)?;
        let status = match ctx.pseudo_header {
            Some(pseudo_header) if ctx.can_verify(claimed, cursor.captured()) => {
                let segment = cursor.slice(0, claimed)?;
                ChecksumStatus::from_sum(checksum, pseudo_header.checksum(ip_protocol::TCP, segment))
            }
            _ => ChecksumStatus::Unverified,
        };
        layer.checksum("tcp", checksum, status);
        layer.push("urgent_pointer", FieldValue::UInt16(cursor.read_u16(18)?));

        if header_len > TCP_MIN_HEADER_LEN {
            for record in walk(
                cursor,
                TCP_MIN_HEADER_LEN,
                header_len - TCP_MIN_HEADER_LEN,
                TlvShape::TCP_OPTIONS,
            ) {
                let record = record?;
                layer.option(
                    record.kind,
                    tok2str(OPTION_VALUES, u32::from(record.kind)),
                    record.length,
                    option_value(&record)?,
                );
            }
        }

        Ok(Decoded::new(
            header_len,
            Handoff::Ports {
                transport: Transport::Tcp,
                src: src_port,
                dst: dst_port,
            },
        ))
    }
}

/// Decode the value of one option; kinds with an unexpected length are kept
/// as raw bytes.
fn option_value<'a>(record: &TlvRecord<'a>) -> Result<FieldValue<'a>, DissectError> {
    let value = record.value_cursor();
    Ok(match (record.kind, value.captured()) {
        (option_kind::EOL | option_kind::NOP, _) => FieldValue::Null,
        (option_kind::MSS, 2) => FieldValue::UInt16(value.read_u16(0)?),
        (option_kind::WINDOW_SCALE, 1) => FieldValue::UInt8(value.read_u8(0)?),
        (option_kind::SACK_PERMITTED, 0) => FieldValue::Bool(true),
        (option_kind::SACK, len) if len % 8 == 0 => FieldValue::List(
            (0..len)
                .step_by(8)
                .map(|at| {
                    let left = value.read_u32(at)?;
                    let right = value.read_u32(at + 4)?;
                    Ok(FieldValue::OwnedString(format_compact!("{left}-{right}")))
                })
                .collect::<Result<_, DissectError>>()?,
        ),
        (option_kind::TIMESTAMP, 8) => FieldValue::List(vec![
            FieldValue::UInt32(value.read_u32(0)?),
            FieldValue::UInt32(value.read_u32(4)?),
        ]),
        (option_kind::USER_TIMEOUT, 2) => FieldValue::UInt16(value.read_u16(0)?),
        _ => FieldValue::Bytes(record.value),
    })
}
