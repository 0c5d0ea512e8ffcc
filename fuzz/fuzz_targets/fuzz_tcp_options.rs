//! Fuzz target for TCP options parsing.
//!
//! Fuzz data becomes the TCP options area of an Ethernet/IPv4/TCP frame,
//! not the payload after the TCP header.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdissect_core::{default_registry, dissect_packet, linktype, CaptureBuffer, DissectConfig};

fn build_frame(options: &[u8]) -> Vec<u8> {
    let options_len = options.len().div_ceil(4) * 4;
    let tcp_len = 20 + options_len;
    let ip_total = (20 + tcp_len) as u16;

    let mut frame = Vec::with_capacity(14 + 20 + tcp_len);
    frame.extend_from_slice(&[0xff; 6]);
    frame.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    frame.extend_from_slice(&[0x08, 0x00]);

    frame.extend_from_slice(&[0x45, 0x00]);
    frame.extend_from_slice(&ip_total.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 64, 6, 0x00, 0x00]);
    frame.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);

    frame.extend_from_slice(&[0x30, 0x39, 0x00, 0x50]); // Ports 12345 -> 80
    frame.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0]); // Seq, ack
    frame.push(((tcp_len / 4) as u8) << 4);
    frame.push(0x02); // SYN
    frame.extend_from_slice(&[0xff, 0xff, 0x00, 0x00, 0x00, 0x00]);
    frame.extend_from_slice(options);
    frame.resize(14 + 20 + tcp_len, 0);
    frame
}

fuzz_target!(|data: &[u8]| {
    // TCP options can be 0-40 bytes (header is 20-60 bytes total)
    if data.is_empty() || data.len() > 40 {
        return;
    }

    let frame = build_frame(data);
    let config = DissectConfig::default();
    let _ = dissect_packet(default_registry(), &config, linktype::ETHERNET, CaptureBuffer::from_slice(&frame));
});
