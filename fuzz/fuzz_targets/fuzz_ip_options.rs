//! Fuzz target for IPv4 options and IPv6 extension headers.
//!
//! The input becomes the options area of an IPv4 header, and separately
//! the payload of an IPv6 header whose next header is hop-by-hop.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdissect_core::{default_registry, dissect_packet, linktype, CaptureBuffer, DissectConfig};

/// IPv4 header carrying `options`, padded to a 4-byte boundary.
fn ipv4_with_options(options: &[u8]) -> Vec<u8> {
    let options_len = options.len().div_ceil(4) * 4;
    let header_len = 20 + options_len;

    let mut packet = Vec::with_capacity(header_len);
    packet.push(0x40 | (header_len / 4) as u8);
    packet.push(0x00);
    packet.extend_from_slice(&(header_len as u16).to_be_bytes());
    packet.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]);
    packet.push(64);
    packet.push(17);
    packet.extend_from_slice(&[0x00, 0x00]); // Checksum
    packet.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);
    packet.extend_from_slice(options);
    packet.resize(header_len, 0);
    packet
}

fn ipv6_with_extensions(payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x60, 0, 0, 0];
    packet.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    packet.push(0); // Hop-by-hop
    packet.push(64);
    packet.extend_from_slice(&[0u8; 32]);
    packet.extend_from_slice(payload);
    packet
}

fuzz_target!(|data: &[u8]| {
    let registry = default_registry();
    let config = DissectConfig::default();

    if data.len() <= 40 {
        let packet = ipv4_with_options(data);
        let _ = dissect_packet(registry, &config, linktype::RAW, CaptureBuffer::from_slice(&packet));
    }

    if data.len() <= usize::from(u16::MAX) {
        let packet = ipv6_with_extensions(data);
        let _ = dissect_packet(registry, &config, linktype::RAW, CaptureBuffer::from_slice(&packet));
    }
});
