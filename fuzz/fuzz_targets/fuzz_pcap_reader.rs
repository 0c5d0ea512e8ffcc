//! Fuzz target for PCAP/PCAPNG file parsing.
//!
//! Malformed files must produce errors, never panics, and every packet
//! that is read must dissect.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdissect_core::{default_registry, dissect_packet, CaptureReader, DissectConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = CaptureReader::from_reader(data) else {
        return;
    };
    let config = DissectConfig::default();
    while let Ok(Some(packet)) = reader.next_packet() {
        let _ = dissect_packet(default_registry(), &config, packet.link_type, packet.capture());
    }
});
