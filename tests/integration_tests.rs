//! Integration tests for pktdissect.
//!
//! Packets come from `etherparse::PacketBuilder`, which fills in lengths
//! and checksums independently of the dissectors under test.

use std::io::Write;

use etherparse::{PacketBuilder, SlicedPacket, TcpOptionElement, TransportSlice};
use tempfile::NamedTempFile;

use pktdissect::cli::PacketPrinter;
use pktdissect::core::cursor::Cursor;
use pktdissect::core::tlv::{walk, TlvShape};
use pktdissect::core::{
    default_registry, dissect, dissect_packet, linktype, CaptureBuffer, CaptureReader,
    DissectConfig, DissectError, Dissection, FieldEntry, FieldValue, Layer, Stop, Verbosity,
};

const SRC_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
const DST_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];

fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([192, 168, 1, 1], [192, 168, 1, 2], 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn tcp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 128)
        .tcp(49152, 443, 0x01020304, 29200)
        .syn()
        .options(&[
            TcpOptionElement::MaximumSegmentSize(1460),
            TcpOptionElement::SelectiveAcknowledgementPermitted,
            TcpOptionElement::Timestamp(100, 0),
            TcpOptionElement::Noop,
            TcpOptionElement::WindowScale(7),
        ])
        .unwrap();
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn ipv6_udp_frame(payload: &[u8]) -> Vec<u8> {
    let src = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
    let dst = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2];
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv6(src, dst, 32)
        .udp(5000, 5001);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn icmp_echo_frame() -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([192, 168, 1, 1], [8, 8, 8, 8], 64)
        .icmpv4_echo_request(0x1234, 7);
    let payload: Vec<u8> = (0..56).collect();
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, &payload).unwrap();
    frame
}

/// BOOTP request from a client with no address yet, DHCP Discover.
fn dhcp_discover_frame() -> Vec<u8> {
    let mut bootp = vec![0u8; 236];
    bootp[0] = 1; // BOOTREQUEST
    bootp[1] = 1; // Ethernet
    bootp[2] = 6;
    bootp[4..8].copy_from_slice(&0x3903f326u32.to_be_bytes());
    bootp[28..34].copy_from_slice(&SRC_MAC);
    bootp.extend_from_slice(&[0x63, 0x82, 0x53, 0x63]);
    bootp.extend_from_slice(&[53, 1, 1]); // Message type: Discover
    bootp.extend_from_slice(&[55, 3, 1, 3, 6]); // Parameter request list
    bootp.push(255);

    let builder = PacketBuilder::ethernet2(SRC_MAC, [0xff; 6])
        .ipv4([0, 0, 0, 0], [255, 255, 255, 255], 64)
        .udp(68, 67);
    let mut frame = Vec::with_capacity(builder.size(bootp.len()));
    builder.write(&mut frame, &bootp).unwrap();
    frame
}

fn arp_request_frame() -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&[0xff; 6]);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&[0x08, 0x06]);
    frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&[192, 168, 1, 1]);
    frame.extend_from_slice(&[0; 6]);
    frame.extend_from_slice(&[192, 168, 1, 2]);
    frame.resize(60, 0); // Ethernet minimum
    frame
}

fn all_frames() -> Vec<Vec<u8>> {
    vec![
        udp_frame(1234, 5678, b"ping"),
        tcp_frame(b"hello"),
        ipv6_udp_frame(b"six"),
        icmp_echo_frame(),
        dhcp_discover_frame(),
        arp_request_frame(),
    ]
}

fn assert_good_checksums(dissection: &Dissection<'_>) {
    for layer in &dissection.layers {
        if let Some(status) = layer.get("checksum_status") {
            assert_eq!(
                status,
                &FieldValue::Str("good"),
                "{} checksum in {dissection}",
                layer.protocol
            );
        }
    }
}

#[test]
fn test_udp_scenario_full_capture() {
    let frame = udp_frame(1234, 5678, b"ping");
    assert_eq!(frame.len(), 46);

    let dissection = dissect(linktype::ETHERNET, &frame);
    assert_eq!(dissection.protocols(), ["ethernet", "ipv4", "udp"]);
    let consumed: Vec<_> = dissection.layers.iter().map(|l| l.consumed).collect();
    assert_eq!(consumed, [Some(14), Some(20), Some(8)]);
    assert_eq!(dissection.payload(), Some(&b"ping"[..]));
    assert!(dissection.layers.iter().all(|l| l.notes.is_empty()));
    assert_good_checksums(&dissection);
}

#[test]
fn test_udp_scenario_captured_20() {
    let frame = udp_frame(1234, 5678, b"ping");
    let config = DissectConfig::default();
    let capture = CaptureBuffer::new(&frame, 20, frame.len());
    let dissection = dissect_packet(default_registry(), &config, linktype::ETHERNET, capture);

    assert_eq!(dissection.protocols(), ["ethernet", "ipv4"]);
    assert_eq!(dissection.layers[0].consumed, Some(14));
    assert!(matches!(
        dissection.stop,
        Stop::Truncated {
            protocol: "ipv4",
            ..
        }
    ));
    assert!(dissection.layer("udp").is_none());
}

#[test]
fn test_over_length_tlv_record() {
    // 10-byte options region whose second record claims 255 bytes.
    let region = [0x01, 0x83, 0xff, 10, 0, 0, 1, 0, 0, 0];
    let mut records = walk(&Cursor::new(&region), 0, region.len(), TlvShape::IP_OPTIONS);

    assert_eq!(records.next().unwrap().unwrap().kind, 1);
    let err = records.next().unwrap().unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(
        err,
        DissectError::malformed("TLV length 255 exceeds remaining 9")
    );
    assert!(records.next().is_none());
    assert!(records.consumed() <= region.len());
}

#[test]
fn test_tcp_against_etherparse() {
    let frame = tcp_frame(b"hello");
    let oracle = SlicedPacket::from_ethernet(&frame).unwrap();
    let Some(TransportSlice::Tcp(tcp)) = oracle.transport else {
        panic!("etherparse did not see TCP");
    };

    let dissection = dissect(linktype::ETHERNET, &frame);
    assert_eq!(dissection.protocols(), ["ethernet", "ipv4", "tcp"]);
    let layer = dissection.layer("tcp").unwrap();

    assert_eq!(layer.get("src_port"), Some(&FieldValue::UInt16(tcp.source_port())));
    assert_eq!(layer.get("dst_port"), Some(&FieldValue::UInt16(tcp.destination_port())));
    assert_eq!(layer.get("seq"), Some(&FieldValue::UInt32(tcp.sequence_number())));
    assert_eq!(layer.get("window"), Some(&FieldValue::UInt16(tcp.window_size())));
    assert_eq!(
        layer.consumed,
        Some(usize::from(tcp.data_offset()) * 4)
    );

    assert_eq!(layer.find_option(2).unwrap().value, FieldValue::UInt16(1460));
    assert_eq!(layer.find_option(3).unwrap().value, FieldValue::UInt8(7));
    assert_eq!(layer.find_option(4).unwrap().value, FieldValue::Bool(true));
    assert_eq!(
        layer.find_option(8).unwrap().value,
        FieldValue::List(vec![FieldValue::UInt32(100), FieldValue::UInt32(0)])
    );
    assert_eq!(dissection.payload(), Some(&b"hello"[..]));
    assert_good_checksums(&dissection);
}

#[test]
fn test_ipv6_udp_checksum() {
    let frame = ipv6_udp_frame(b"six");
    let dissection = dissect(linktype::ETHERNET, &frame);

    assert_eq!(dissection.protocols(), ["ethernet", "ipv6", "udp"]);
    assert_eq!(dissection.layer("ipv6").unwrap().consumed, Some(40));
    assert_eq!(
        dissection.layer("udp").unwrap().get("checksum_status"),
        Some(&FieldValue::Str("good"))
    );
}

#[test]
fn test_icmp_echo() {
    let frame = icmp_echo_frame();
    let dissection = dissect(linktype::ETHERNET, &frame);

    assert_eq!(dissection.protocols(), ["ethernet", "ipv4", "icmp"]);
    let icmp = dissection.layer("icmp").unwrap();
    assert_eq!(icmp.get("identifier"), Some(&FieldValue::UInt16(0x1234)));
    assert_eq!(icmp.get("sequence"), Some(&FieldValue::UInt16(7)));
    assert_eq!(dissection.payload().map(<[u8]>::len), Some(56));
    assert_good_checksums(&dissection);
}

#[test]
fn test_dhcp_by_port() {
    let frame = dhcp_discover_frame();
    let dissection = dissect(linktype::ETHERNET, &frame);

    assert_eq!(dissection.protocols(), ["ethernet", "ipv4", "udp", "dhcp"]);
    let dhcp = dissection.layer("dhcp").unwrap();
    assert_eq!(dhcp.get("message_type"), Some(&FieldValue::Str("Discover")));
    assert_eq!(dhcp.get("xid"), Some(&FieldValue::Hex32(0x3903f326)));
    assert!(dissection.is_complete());
    assert_good_checksums(&dissection);
}

#[test]
fn test_arp_with_ethernet_padding() {
    let frame = arp_request_frame();
    let dissection = dissect(linktype::ETHERNET, &frame);

    assert_eq!(dissection.protocols(), ["ethernet", "arp"]);
    let arp = dissection.layer("arp").unwrap();
    assert_eq!(arp.consumed, Some(28));
    assert_eq!(arp.get("operation"), Some(&FieldValue::Str("Request")));
}

#[test]
fn test_fixed_headers_consume_header_size() {
    let frame = udp_frame(1, 2, &[]);
    let dissection = dissect(linktype::ETHERNET, &frame);
    for (protocol, size) in [("ethernet", 14), ("ipv4", 20), ("udp", 8)] {
        assert_eq!(dissection.layer(protocol).unwrap().consumed, Some(size));
    }
}

fn decoded_fields<'a, 'd>(layer: &'a Layer<'d>) -> Vec<&'a FieldEntry<'d>> {
    layer
        .fields
        .iter()
        .filter(|(name, _)| *name != "checksum_status")
        .collect()
}

#[test]
fn test_every_prefix_terminates() {
    let config = DissectConfig::default().with_verbosity(Verbosity::Verbose);

    for frame in all_frames() {
        let full = dissect_packet(
            default_registry(),
            &config,
            linktype::ETHERNET,
            CaptureBuffer::from_slice(&frame),
        );

        for len in 0..=frame.len() {
            let capture = CaptureBuffer::new(&frame, len, frame.len());
            let dissection = dissect_packet(default_registry(), &config, linktype::ETHERNET, capture);
            let _ = dissection.to_string();

            if let Stop::Truncated { .. } = dissection.stop {
                // Layers before the short one match the full capture, apart
                // from checksums whose covered bytes are now missing.
                let outer = dissection.layers.len() - 1;
                for (cut, whole) in dissection.layers[..outer].iter().zip(&full.layers) {
                    assert_eq!(cut.protocol, whole.protocol);
                    assert_eq!(cut.consumed, whole.consumed, "{} cut at {len}", cut.protocol);
                    assert_eq!(
                        decoded_fields(cut),
                        decoded_fields(whole),
                        "{} cut at {len}",
                        cut.protocol
                    );
                }
            }
            assert!(
                !matches!(dissection.stop, Stop::Malformed { .. }),
                "cut at {len}: {}",
                dissection
            );
        }
    }
}

#[test]
fn test_idempotent_rendering() {
    let config = DissectConfig::default().with_verbosity(Verbosity::Verbose);
    for frame in all_frames() {
        let first = dissect_packet(
            default_registry(),
            &config,
            linktype::ETHERNET,
            CaptureBuffer::from_slice(&frame),
        );
        let second = dissect_packet(
            default_registry(),
            &config,
            linktype::ETHERNET,
            CaptureBuffer::from_slice(&frame),
        );
        assert_eq!(first.to_string(), second.to_string());
    }
}

#[test]
fn test_pcap_file_end_to_end() {
    let frames = all_frames();

    let mut file = Vec::new();
    file.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
    file.extend_from_slice(&2u16.to_le_bytes());
    file.extend_from_slice(&4u16.to_le_bytes());
    file.extend_from_slice(&[0; 8]);
    file.extend_from_slice(&96u32.to_le_bytes()); // Snaplen cuts the ICMP and DHCP frames
    file.extend_from_slice(&1u32.to_le_bytes());
    for (i, frame) in frames.iter().enumerate() {
        let captured = frame.len().min(96);
        file.extend_from_slice(&(1_700_000_000 + i as u32).to_le_bytes());
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(&(captured as u32).to_le_bytes());
        file.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        file.extend_from_slice(&frame[..captured]);
    }
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(&file).unwrap();
    temp.flush().unwrap();

    let config = DissectConfig::default().with_verbosity(Verbosity::Brief);
    let mut printer = PacketPrinter::new(Vec::new(), Verbosity::Brief);
    let mut chains = Vec::new();
    for packet in CaptureReader::open(temp.path()).unwrap() {
        let packet = packet.unwrap();
        let dissection = dissect_packet(default_registry(), &config, packet.link_type, packet.capture());
        chains.push(dissection.protocols().join("/"));
        printer.print(&packet, &dissection).unwrap();
    }

    assert_eq!(
        chains,
        [
            "ethernet/ipv4/udp",
            "ethernet/ipv4/tcp",
            "ethernet/ipv6/udp",
            "ethernet/ipv4/icmp",
            "ethernet/ipv4/udp/dhcp",
            "ethernet/arp",
        ]
    );
    let summary = printer.summary();
    assert_eq!(summary.packets, 6);
    // The DHCP frame is longer than the snaplen and stops inside BOOTP.
    assert_eq!(summary.truncated, 1);
    assert_eq!(summary.complete, 5);
}
