//! Protocol dissection framework.
//!
//! This module provides:
//! - [`Dissector`] trait for implementing per-protocol decoders
//! - [`DissectorRegistry`] mapping [`DispatchKey`]s to dissectors
//! - [`dissect_packet`], the encapsulation walk from link layer to leaf
//! - Built-in dissectors for the protocols below
//!
//! ## Supported Protocols
//!
//! | Layer | Protocols |
//! |-------|-----------|
//! | Link | Ethernet II / 802.3, Linux cooked (SLL), raw IP, 802.1Q/802.1ad VLAN, LLDP |
//! | Network | IPv4, IPv6 (extension headers), ARP, ICMP |
//! | Transport | TCP, UDP, GRE |
//! | Application | DHCP/BOOTP |
//!
//! ## Example
//!
//! ```rust
//! use pktdissect_core::{dissect_packet, default_registry, CaptureBuffer, DissectConfig, Stop};
//!
//! let frame: &[u8] = &[
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff,  // dst mac
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55,  // src mac
//!     0x88, 0xb5,                          // local experimental ethertype
//!     0xde, 0xad,
//! ];
//!
//! let config = DissectConfig::default();
//! let dissection = dissect_packet(default_registry(), &config, 1, CaptureBuffer::from_slice(frame));
//! assert_eq!(dissection.protocols(), ["ethernet"]);
//! assert!(matches!(dissection.stop, Stop::UnknownProtocol { remaining: 2, .. }));
//! ```

use std::sync::OnceLock;

use compact_str::format_compact;
use tracing::{debug, trace};

use crate::capture::CaptureBuffer;
use crate::config::DissectConfig;
use crate::error::DissectError;

mod context;
mod dissection;
mod field;
mod registry;

// Dissector implementations
mod arp;
mod dhcp;
mod ethernet;
mod gre;
mod icmp;
mod ipv4;
mod ipv6;
mod linux_sll;
mod lldp;
mod raw;
mod tcp;
mod udp;
mod vlan;

// Test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

pub use context::{
    Addressing, Decoded, DissectContext, FieldEntry, Handoff, Layer, Note, OptionEntry, TunnelLayer,
    TunnelType,
};
pub use dissection::{Dissection, FrameInfo, Stop};
pub use field::FieldValue;
pub use registry::{BuiltinDissector, DispatchKey, Dissector, DissectorRegistry, Transport};

// Re-export dissector implementations
pub use arp::ArpDissector;
pub use dhcp::DhcpDissector;
pub use ethernet::EthernetDissector;
pub use gre::GreDissector;
pub use icmp::IcmpDissector;
pub use ipv4::Ipv4Dissector;
pub use ipv6::Ipv6Dissector;
pub use linux_sll::LinuxSllDissector;
pub use lldp::LldpDissector;
pub use raw::RawIpDissector;
pub use tcp::TcpDissector;
pub use udp::UdpDissector;
pub use vlan::VlanDissector;

// Re-export protocol constants
pub use arp::opcode as arp_opcode;
pub use dhcp::{message_type as dhcp_message_type, option as dhcp_option};
pub use ethernet::ethertype;
pub use icmp::icmp_type;
pub use ipv4::ip_protocol;
pub use ipv6::next_header;
pub use lldp::tlv_type as lldp_tlv_type;
pub use tcp::{option_kind as tcp_option_kind, tcp_flags};

/// Create a registry with all built-in dissectors.
pub fn builtin_registry() -> DissectorRegistry {
    let mut registry = DissectorRegistry::new();

    // Link layer
    registry.register(EthernetDissector);
    registry.register(LinuxSllDissector);
    registry.register(RawIpDissector);
    registry.register(VlanDissector);
    registry.register(LldpDissector);
    registry.register(ArpDissector);

    // Network layer
    registry.register(Ipv4Dissector);
    registry.register(Ipv6Dissector);
    registry.register(IcmpDissector);

    // Transport and tunnels
    registry.register(UdpDissector);
    registry.register(TcpDissector);
    registry.register(GreDissector);

    // Application layer
    registry.register(DhcpDissector);

    registry
}

/// Process-wide registry of the built-in dissectors, built on first use.
pub fn default_registry() -> &'static DissectorRegistry {
    static REGISTRY: OnceLock<DissectorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(builtin_registry)
}

/// Walk a frame's encapsulation chain, from the link layer to a leaf.
///
/// Starts at `DispatchKey::Link(link_type)` with the frame's on-wire length
/// as the claimed length. Each dissector consumes its header and names what
/// follows; the payload region it hands on is bounded by both the length
/// its header declares and the bytes actually captured.
///
/// Never panics. Errors inside a layer end the walk with a
/// [`Stop::Truncated`] or [`Stop::Malformed`] naming that layer; the layers
/// decoded before it are kept as they were.
pub fn dissect_packet<'a>(
    registry: &DissectorRegistry,
    config: &DissectConfig,
    link_type: u16,
    capture: CaptureBuffer<'a>,
) -> Dissection<'a> {
    let frame = FrameInfo {
        link_type,
        captured_length: capture.captured_length(),
        on_wire_length: capture.on_wire_length(),
    };

    // Typical packet has 3-4 protocol layers (Eth/IP/UDP/App)
    let mut layers = Vec::with_capacity(4);
    let mut ctx = DissectContext::new(config, link_type);
    let mut cursor = capture.cursor();
    let mut claimed = capture.on_wire_length();
    let mut key = DispatchKey::Link(link_type);

    let stop = loop {
        if layers.len() >= config.max_layers {
            debug!(limit = config.max_layers, offset = ctx.offset, "layer limit reached");
            break Stop::DepthLimit {
                limit: config.max_layers,
                offset: ctx.offset,
            };
        }

        let Some(dissector) = registry.lookup(key) else {
            debug!(%key, offset = ctx.offset, "no dissector registered");
            break Stop::UnknownProtocol {
                key,
                offset: ctx.offset,
                remaining: claimed,
            };
        };
        let protocol = dissector.name();

        let mut layer = Layer::new(protocol, dissector.display_name(), ctx.offset);
        layer.encap_depth = ctx.encap_depth;

        let result = cursor
            .ensure(0, dissector.min_header_len())
            .and_then(|()| dissector.dissect(&cursor, claimed, &ctx, &mut layer))
            .and_then(|decoded| {
                if decoded.consumed > claimed {
                    Err(DissectError::malformed(format_compact!(
                        "header length {} exceeds {} claimed bytes",
                        decoded.consumed,
                        claimed
                    )))
                } else {
                    Ok(decoded)
                }
            });

        let decoded = match result {
            Ok(decoded) => decoded,
            Err(error) => {
                debug!(protocol, offset = ctx.offset, %error, "layer stopped");
                layers.push(layer);
                break if error.is_truncated() {
                    Stop::Truncated { protocol, error }
                } else {
                    Stop::Malformed { protocol, error }
                };
            }
        };

        trace!(protocol, offset = ctx.offset, consumed = decoded.consumed, "decoded layer");
        layer.consumed = Some(decoded.consumed);
        layers.push(layer);

        let available = claimed - decoded.consumed;
        let payload_claimed = decoded.payload_len.map_or(available, |len| len.min(available));
        cursor = cursor.narrow(decoded.consumed, payload_claimed);
        claimed = payload_claimed;

        ctx.parent_protocol = Some(protocol);
        ctx.offset += decoded.consumed;
        ctx.depth += 1;
        match decoded.addressing {
            Addressing::Inherit => {}
            Addressing::Pseudo(pseudo_header) => ctx.pseudo_header = Some(pseudo_header),
            Addressing::Unverifiable => ctx.pseudo_header = None,
        }
        if let Some((tunnel_type, tunnel_id)) = decoded.tunnel {
            ctx.push_tunnel(tunnel_type, tunnel_id);
        }

        let next = match decoded.next {
            Handoff::Leaf => None,
            Handoff::Protocol(next) => Some(next),
            Handoff::Ports {
                transport,
                src,
                dst,
            } => port_dispatch(registry, transport, src, dst),
        };

        match next {
            Some(next) if claimed > 0 => key = next,
            _ => {
                break Stop::Complete {
                    offset: ctx.offset,
                    payload: cursor.rest(0),
                    claimed,
                }
            }
        }
    };

    Dissection {
        frame,
        layers,
        stop,
        verbosity: config.verbosity,
        payload_preview: config.payload_preview,
    }
}

/// Dissect a fully captured frame with the built-in registry and defaults.
pub fn dissect(link_type: u16, data: &[u8]) -> Dissection<'_> {
    static CONFIG: DissectConfig = DissectConfig::new();
    dissect_packet(
        default_registry(),
        &CONFIG,
        link_type,
        CaptureBuffer::from_slice(data),
    )
}

/// Key of the registered application dissector for a port pair.
///
/// The lower-numbered port is tried first, since the service side of a
/// conversation is usually the well-known one.
fn port_dispatch(
    registry: &DissectorRegistry,
    transport: Transport,
    src: u16,
    dst: u16,
) -> Option<DispatchKey> {
    let (low, high) = if src <= dst { (src, dst) } else { (dst, src) };
    [low, high]
        .into_iter()
        .map(|port| DispatchKey::port(transport, port))
        .find(|key| registry.lookup(*key).is_some())
}
