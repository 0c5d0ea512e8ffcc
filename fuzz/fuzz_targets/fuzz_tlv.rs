//! Fuzz target for the TLV walker.
//!
//! Walks the input under every record shape and checks that the walk
//! stays inside the region and stops yielding after an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdissect_core::cursor::Cursor;
use pktdissect_core::tlv::{walk, TlvShape};

const SHAPES: [TlvShape; 5] = [
    TlvShape::IP_OPTIONS,
    TlvShape::DHCP_OPTIONS,
    TlvShape::Ipv6Option,
    TlvShape::PackedTypeLength,
    TlvShape::TypeLength16,
];

fuzz_target!(|data: &[u8]| {
    let cursor = Cursor::new(data);

    for shape in SHAPES {
        let mut walker = walk(&cursor, 0, data.len(), shape);
        let mut failed = false;
        for record in walker.by_ref() {
            assert!(!failed, "record yielded after an error");
            match record {
                Ok(record) => assert!(record.offset + record.length <= data.len()),
                Err(_) => failed = true,
            }
        }
        assert!(walker.consumed() <= data.len());
    }
});
