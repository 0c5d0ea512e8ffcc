//! Dissection context and per-layer result types.

use std::borrow::Cow;

use compact_str::CompactString;
use smallvec::SmallVec;

use super::registry::{DispatchKey, Transport};
use super::FieldValue;
use crate::checksum::{ChecksumStatus, PseudoHeader};
use crate::config::DissectConfig;

/// Field entry for a decoded layer: (field_name, value).
/// Field names are always static strings (protocol-defined).
pub type FieldEntry<'data> = (&'static str, FieldValue<'data>);

/// Type of encapsulating tunnel protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TunnelType {
    /// No tunnel encapsulation (outer layer).
    #[default]
    None,
    /// GRE encapsulation.
    Gre,
    /// IPv4-in-IP encapsulation (IP protocol 4).
    IpInIp,
    /// IPv6-in-IP encapsulation (IP protocol 41).
    Ip6InIp,
}

impl TunnelType {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            TunnelType::None => None,
            TunnelType::Gre => Some("gre"),
            TunnelType::IpInIp => Some("ipinip"),
            TunnelType::Ip6InIp => Some("ip6inip"),
        }
    }
}

/// Information about a single tunnel encapsulation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunnelLayer {
    pub tunnel_type: TunnelType,
    /// Tunnel identifier (GRE key), if the tunnel carries one.
    pub tunnel_id: Option<u64>,
    /// Byte offset where the tunnelled payload starts.
    pub offset: usize,
}

/// Context passed through the dissection chain.
#[derive(Debug, Clone)]
pub struct DissectContext<'c> {
    pub config: &'c DissectConfig,

    /// Link type of the frame (e.g., 1 = Ethernet).
    pub link_type: u16,

    /// Protocol that handed off to the current layer.
    pub parent_protocol: Option<&'static str>,

    /// Absolute offset of the current layer in the frame.
    pub offset: usize,

    /// Layers decoded so far.
    pub depth: usize,

    /// Current encapsulation depth (0 = outer/no tunnel, 1+ = inside tunnel).
    pub encap_depth: u8,

    /// Stack of enclosing tunnel layers (innermost last).
    pub tunnel_stack: SmallVec<[TunnelLayer; 4]>,

    /// Addresses of the innermost IP layer, for transport checksums.
    pub pseudo_header: Option<PseudoHeader>,
}

impl<'c> DissectContext<'c> {
    pub fn new(config: &'c DissectConfig, link_type: u16) -> Self {
        Self {
            config,
            link_type,
            parent_protocol: None,
            offset: 0,
            depth: 0,
            encap_depth: 0,
            tunnel_stack: SmallVec::new(),
            pseudo_header: None,
        }
    }

    /// Push a new tunnel layer onto the stack and increment encap_depth.
    pub fn push_tunnel(&mut self, tunnel_type: TunnelType, tunnel_id: Option<u64>) {
        self.tunnel_stack.push(TunnelLayer {
            tunnel_type,
            tunnel_id,
            offset: self.offset,
        });
        self.encap_depth = self.encap_depth.saturating_add(1);
    }

    /// Get the innermost tunnel type, if inside a tunnel.
    pub fn current_tunnel_type(&self) -> TunnelType {
        self.tunnel_stack
            .last()
            .map(|t| t.tunnel_type)
            .unwrap_or_default()
    }

    /// Whether the covered checksum bytes can be checked.
    ///
    /// `covered` is the length the header says the checksum spans;
    /// `captured` how many of those bytes are actually present.
    pub fn can_verify(&self, covered: usize, captured: usize) -> bool {
        self.config.verify_checksums && captured >= covered
    }

    /// Check if we're at the start of the frame (no parent protocol).
    pub fn is_root(&self) -> bool {
        self.parent_protocol.is_none()
    }
}

/// A decoded option or TLV record.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry<'data> {
    pub kind: u16,
    pub name: Cow<'static, str>,
    /// Whole record length, header included.
    pub length: usize,
    pub value: FieldValue<'data>,
}

/// Advisory findings that do not stop decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    ChecksumMismatch {
        field: &'static str,
        found: u16,
        expected: u16,
    },
    Info(CompactString),
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Note::ChecksumMismatch {
                field,
                found,
                expected,
            } => write!(
                f,
                "[bad {field} checksum {found:#06x} (computed {expected:#06x})]"
            ),
            Note::Info(text) => write!(f, "[{text}]"),
        }
    }
}

/// Everything decoded for one protocol layer.
///
/// Dissectors push fields as they read them, so a layer that stops with an
/// error still carries what was decoded before the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<'data> {
    pub protocol: &'static str,
    pub display_name: &'static str,
    /// Absolute offset of the layer in the frame.
    pub offset: usize,
    pub fields: SmallVec<[FieldEntry<'data>; 16]>,
    pub options: Vec<OptionEntry<'data>>,
    pub notes: SmallVec<[Note; 2]>,
    /// Header bytes consumed; `None` when the layer stopped with an error.
    pub consumed: Option<usize>,
    /// Encapsulation depth when this layer was decoded (0 = outer layer).
    pub encap_depth: u8,
}

impl<'data> Layer<'data> {
    pub fn new(protocol: &'static str, display_name: &'static str, offset: usize) -> Self {
        Self {
            protocol,
            display_name,
            offset,
            fields: SmallVec::new(),
            options: Vec::new(),
            notes: SmallVec::new(),
            consumed: None,
            encap_depth: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, name: &'static str, value: FieldValue<'data>) {
        self.fields.push((name, value));
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue<'data>> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn option(
        &mut self,
        kind: u16,
        name: impl Into<Cow<'static, str>>,
        length: usize,
        value: FieldValue<'data>,
    ) {
        self.options.push(OptionEntry {
            kind,
            name: name.into(),
            length,
            value,
        });
    }

    pub fn find_option(&self, kind: u16) -> Option<&OptionEntry<'data>> {
        self.options.iter().find(|o| o.kind == kind)
    }

    pub fn note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn info(&mut self, text: impl Into<CompactString>) {
        self.notes.push(Note::Info(text.into()));
    }

    /// Record the `checksum` field and the outcome of checking it.
    ///
    /// `label` names the checksum in a mismatch note ("ip header", "udp").
    pub fn checksum(&mut self, label: &'static str, found: u16, status: ChecksumStatus) {
        self.push("checksum", FieldValue::Hex16(found));
        self.push("checksum_status", FieldValue::Str(status.as_str()));
        if let ChecksumStatus::Bad { expected } = status {
            self.note(Note::ChecksumMismatch {
                field: label,
                found,
                expected,
            });
        }
    }

    pub fn has_checksum_mismatch(&self) -> bool {
        self.notes
            .iter()
            .any(|n| matches!(n, Note::ChecksumMismatch { .. }))
    }
}

/// What follows a decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Nothing further is decoded; any remaining bytes are opaque payload.
    Leaf,
    /// The payload is the protocol registered under this key.
    Protocol(DispatchKey),
    /// Port-addressed payload; dispatch tries the registered port.
    Ports {
        transport: Transport,
        src: u16,
        dst: u16,
    },
}

/// Addresses a layer puts in scope for the transport checksums below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Addressing {
    /// Not an addressing layer; the enclosing addresses still apply.
    #[default]
    Inherit,
    Pseudo(PseudoHeader),
    /// Fragmented payload; nothing below can be verified.
    Unverifiable,
}

/// A dissector's successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Bytes of this layer's header, options included.
    pub consumed: usize,
    /// Length the header declares for the payload; when `None` the payload
    /// runs to the end of this layer's claimed length.
    pub payload_len: Option<usize>,
    pub next: Handoff,
    /// The payload is a tunnelled packet.
    pub tunnel: Option<(TunnelType, Option<u64>)>,
    /// Addresses for the transport checksum of the payload.
    pub addressing: Addressing,
}

impl Decoded {
    pub fn new(consumed: usize, next: Handoff) -> Self {
        Self {
            consumed,
            payload_len: None,
            next,
            tunnel: None,
            addressing: Addressing::Inherit,
        }
    }

    pub fn leaf(consumed: usize) -> Self {
        Self::new(consumed, Handoff::Leaf)
    }

    pub fn to(consumed: usize, key: DispatchKey) -> Self {
        Self::new(consumed, Handoff::Protocol(key))
    }

    pub fn with_payload_len(mut self, len: usize) -> Self {
        self.payload_len = Some(len);
        self
    }

    pub fn with_tunnel(mut self, tunnel_type: TunnelType, tunnel_id: Option<u64>) -> Self {
        self.tunnel = Some((tunnel_type, tunnel_id));
        self
    }

    pub fn with_pseudo_header(mut self, pseudo_header: PseudoHeader) -> Self {
        self.addressing = Addressing::Pseudo(pseudo_header);
        self
    }

    /// Drop any enclosing addresses: the payload is a fragment.
    pub fn without_pseudo_header(mut self) -> Self {
        self.addressing = Addressing::Unverifiable;
        self
    }
}
