//! Fuzz target for the full encapsulation walk.
//!
//! Every input is dissected under each supported link type, fully
//! captured and with the last byte cut off by a pretend snaplen. The walk
//! must end in a terminal state without panicking, and rendering it must
//! not panic either.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdissect_core::{default_registry, dissect_packet, linktype, CaptureBuffer, DissectConfig, Verbosity};

fuzz_target!(|data: &[u8]| {
    let registry = default_registry();
    let config = DissectConfig::default().with_verbosity(Verbosity::Verbose);

    for link_type in [linktype::ETHERNET, linktype::LINUX_SLL, linktype::RAW] {
        let dissection = dissect_packet(registry, &config, link_type, CaptureBuffer::from_slice(data));
        let _ = dissection.to_string();

        let short = CaptureBuffer::new(data, data.len().saturating_sub(1), data.len());
        let dissection = dissect_packet(registry, &config, link_type, short);
        let _ = dissection.to_string();
    }
});
