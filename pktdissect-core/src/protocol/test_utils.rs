//! Test utilities for protocol dissection.
//!
//! Provides builders for constructing test packets and helper functions
//! for running a single dissector and checking its layer.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Decoded, DissectContext, Dissector, FieldValue, Layer};
use crate::checksum::{internet_checksum, PseudoHeader};
use crate::config::DissectConfig;
use crate::cursor::Cursor;
use crate::error::DissectError;

/// Pad an options area with zero (end-of-list) bytes to a 4-byte boundary.
fn padded(options: &[u8]) -> Vec<u8> {
    let mut out = options.to_vec();
    out.resize(options.len().div_ceil(4) * 4, 0);
    out
}

/// Builder for constructing Ethernet frames.
#[derive(Debug, Clone)]
pub struct EthernetBuilder {
    src_mac: [u8; 6],
    dst_mac: [u8; 6],
    ethertype: u16,
    payload: Vec<u8>,
}

impl Default for EthernetBuilder {
    fn default() -> Self {
        Self {
            src_mac: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            dst_mac: [0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            ethertype: 0x0800, // IPv4
            payload: Vec::new(),
        }
    }
}

impl EthernetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(mut self, mac: [u8; 6]) -> Self {
        self.src_mac = mac;
        self
    }

    pub fn dst(mut self, mac: [u8; 6]) -> Self {
        self.dst_mac = mac;
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(14 + self.payload.len());
        frame.extend_from_slice(&self.dst_mac);
        frame.extend_from_slice(&self.src_mac);
        frame.extend_from_slice(&self.ethertype.to_be_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Builder for 802.1Q tags (TCI + inner EtherType).
#[derive(Debug, Clone)]
pub struct VlanBuilder {
    vid: u16,
    ethertype: u16,
    payload: Vec<u8>,
}

impl VlanBuilder {
    pub fn new(vid: u16) -> Self {
        Self {
            vid,
            ethertype: 0x0800,
            payload: Vec::new(),
        }
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut tag = Vec::with_capacity(4 + self.payload.len());
        tag.extend_from_slice(&(self.vid & 0x0fff).to_be_bytes());
        tag.extend_from_slice(&self.ethertype.to_be_bytes());
        tag.extend_from_slice(&self.payload);
        tag
    }
}

/// Builder for constructing IPv4 packets.
///
/// Total length and header checksum are computed on build unless
/// overridden.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    dscp_ecn: u8,
    total_length: Option<u16>,
    identification: u16,
    flags_fragment: u16,
    ttl: u8,
    protocol: u8,
    checksum: Option<u16>,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    options: Vec<u8>,
    payload: Vec<u8>,
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self {
            dscp_ecn: 0x00,
            total_length: None,
            identification: 0x0001,
            flags_fragment: 0x0000,
            ttl: 64,
            protocol: 6, // TCP
            checksum: None,
            src_ip: [192, 168, 1, 1],
            dst_ip: [192, 168, 1, 2],
            options: Vec::new(),
            payload: Vec::new(),
        }
    }
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn src(mut self, ip: [u8; 4]) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dst(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip = ip;
        self
    }

    pub fn identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Raw flags/fragment-offset halfword (0x4000 = DF, 0x2000 = MF).
    pub fn flags_fragment(mut self, value: u16) -> Self {
        self.flags_fragment = value;
        self
    }

    pub fn total_length(mut self, length: u16) -> Self {
        self.total_length = Some(length);
        self
    }

    pub fn checksum(mut self, checksum: u16) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn options(mut self, options: &[u8]) -> Self {
        self.options = padded(options);
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let header_len = 20 + self.options.len();
        let total_length = self
            .total_length
            .unwrap_or((header_len + self.payload.len()) as u16);
        let mut packet = Vec::with_capacity(header_len + self.payload.len());

        packet.push(0x40 | (header_len / 4) as u8);
        packet.push(self.dscp_ecn);
        packet.extend_from_slice(&total_length.to_be_bytes());
        packet.extend_from_slice(&self.identification.to_be_bytes());
        packet.extend_from_slice(&self.flags_fragment.to_be_bytes());
        packet.push(self.ttl);
        packet.push(self.protocol);
        packet.extend_from_slice(&[0x00, 0x00]); // Checksum
        packet.extend_from_slice(&self.src_ip);
        packet.extend_from_slice(&self.dst_ip);
        packet.extend_from_slice(&self.options);

        let checksum = self
            .checksum
            .unwrap_or_else(|| internet_checksum(&packet[..header_len]));
        packet[10..12].copy_from_slice(&checksum.to_be_bytes());

        packet.extend_from_slice(&self.payload);
        packet
    }
}

/// Builder for constructing IPv6 packets.
#[derive(Debug, Clone)]
pub struct Ipv6Builder {
    traffic_class: u8,
    flow_label: u32,
    next_header: u8,
    hop_limit: u8,
    src_ip: [u8; 16],
    dst_ip: [u8; 16],
    payload: Vec<u8>,
}

impl Default for Ipv6Builder {
    fn default() -> Self {
        Self {
            traffic_class: 0,
            flow_label: 0,
            next_header: 59, // No next header
            hop_limit: 64,
            src_ip: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1).octets(),
            dst_ip: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2).octets(),
            payload: Vec::new(),
        }
    }
}

impl Ipv6Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traffic_class(mut self, tc: u8) -> Self {
        self.traffic_class = tc;
        self
    }

    pub fn flow_label(mut self, label: u32) -> Self {
        self.flow_label = label & 0x000f_ffff;
        self
    }

    pub fn next_header(mut self, next_header: u8) -> Self {
        self.next_header = next_header;
        self
    }

    pub fn src(mut self, ip: [u8; 16]) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dst(mut self, ip: [u8; 16]) -> Self {
        self.dst_ip = ip;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let word = (6u32 << 28) | (u32::from(self.traffic_class) << 20) | self.flow_label;
        let mut packet = Vec::with_capacity(40 + self.payload.len());
        packet.extend_from_slice(&word.to_be_bytes());
        packet.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        packet.push(self.next_header);
        packet.push(self.hop_limit);
        packet.extend_from_slice(&self.src_ip);
        packet.extend_from_slice(&self.dst_ip);
        packet.extend_from_slice(&self.payload);
        packet
    }
}

/// Builder for constructing UDP datagrams.
///
/// `build` leaves the checksum zero; `build_v4`/`build_v6` fill it in for
/// the given addresses.
#[derive(Debug, Clone, Default)]
pub struct UdpBuilder {
    src_port: u16,
    dst_port: u16,
    payload: Vec<u8>,
}

impl UdpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let length = 8 + self.payload.len() as u16;
        let mut datagram = Vec::with_capacity(8 + self.payload.len());

        datagram.extend_from_slice(&self.src_port.to_be_bytes());
        datagram.extend_from_slice(&self.dst_port.to_be_bytes());
        datagram.extend_from_slice(&length.to_be_bytes());
        datagram.extend_from_slice(&[0x00, 0x00]); // Checksum
        datagram.extend_from_slice(&self.payload);

        datagram
    }

    pub fn build_v4(self, src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
        let pseudo_header = PseudoHeader::V4 {
            src: Ipv4Addr::from(src),
            dst: Ipv4Addr::from(dst),
        };
        with_transport_checksum(self.build(), pseudo_header, 17, 6)
    }

    pub fn build_v6(self, src: [u8; 16], dst: [u8; 16]) -> Vec<u8> {
        let pseudo_header = PseudoHeader::V6 {
            src: Ipv6Addr::from(src),
            dst: Ipv6Addr::from(dst),
        };
        with_transport_checksum(self.build(), pseudo_header, 17, 6)
    }
}

/// Builder for constructing TCP segments.
#[derive(Debug, Clone)]
pub struct TcpBuilder {
    src_port: u16,
    dst_port: u16,
    seq: u32,
    ack: u32,
    flags: u16,
    window: u16,
    options: Vec<u8>,
    payload: Vec<u8>,
}

impl Default for TcpBuilder {
    fn default() -> Self {
        Self {
            src_port: 12345,
            dst_port: 80,
            seq: 1,
            ack: 0,
            flags: 0x010, // ACK
            window: 65535,
            options: Vec::new(),
            payload: Vec::new(),
        }
    }
}

impl TcpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    pub fn ack_num(mut self, ack: u32) -> Self {
        self.ack = ack;
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags & 0x01ff;
        self
    }

    pub fn window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    pub fn options(mut self, options: &[u8]) -> Self {
        self.options = padded(options);
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let header_len = 20 + self.options.len();
        let offset_flags = ((header_len as u16 / 4) << 12) | self.flags;
        let mut segment = Vec::with_capacity(header_len + self.payload.len());

        segment.extend_from_slice(&self.src_port.to_be_bytes());
        segment.extend_from_slice(&self.dst_port.to_be_bytes());
        segment.extend_from_slice(&self.seq.to_be_bytes());
        segment.extend_from_slice(&self.ack.to_be_bytes());
        segment.extend_from_slice(&offset_flags.to_be_bytes());
        segment.extend_from_slice(&self.window.to_be_bytes());
        segment.extend_from_slice(&[0x00, 0x00]); // Checksum
        segment.extend_from_slice(&[0x00, 0x00]); // Urgent pointer
        segment.extend_from_slice(&self.options);
        segment.extend_from_slice(&self.payload);

        segment
    }

    pub fn build_v4(self, src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
        let pseudo_header = PseudoHeader::V4 {
            src: Ipv4Addr::from(src),
            dst: Ipv4Addr::from(dst),
        };
        with_transport_checksum(self.build(), pseudo_header, 6, 16)
    }
}

fn with_transport_checksum(
    mut segment: Vec<u8>,
    pseudo_header: PseudoHeader,
    protocol: u8,
    checksum_offset: usize,
) -> Vec<u8> {
    let mut checksum = pseudo_header.checksum(protocol, &segment);
    // A computed zero is sent as all ones; zero means "none" for UDP.
    if checksum == 0 {
        checksum = 0xffff;
    }
    segment[checksum_offset..checksum_offset + 2].copy_from_slice(&checksum.to_be_bytes());
    segment
}

/// Builder for constructing ICMP messages with a valid checksum.
#[derive(Debug, Clone)]
pub struct IcmpBuilder {
    icmp_type: u8,
    code: u8,
    rest: [u8; 4],
    checksum: Option<u16>,
    payload: Vec<u8>,
}

impl IcmpBuilder {
    pub fn new(icmp_type: u8, code: u8) -> Self {
        Self {
            icmp_type,
            code,
            rest: [0; 4],
            checksum: None,
            payload: Vec::new(),
        }
    }

    pub fn echo_request(id: u16, seq: u16) -> Self {
        let [a, b] = id.to_be_bytes();
        let [c, d] = seq.to_be_bytes();
        Self::new(8, 0).rest_of_header([a, b, c, d])
    }

    pub fn rest_of_header(mut self, rest: [u8; 4]) -> Self {
        self.rest = rest;
        self
    }

    pub fn checksum(mut self, checksum: u16) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut message = Vec::with_capacity(8 + self.payload.len());

        message.push(self.icmp_type);
        message.push(self.code);
        message.extend_from_slice(&[0x00, 0x00]); // Checksum
        message.extend_from_slice(&self.rest);
        message.extend_from_slice(&self.payload);

        let checksum = self
            .checksum
            .unwrap_or_else(|| internet_checksum(&message));
        message[2..4].copy_from_slice(&checksum.to_be_bytes());
        message
    }
}

const TEST_SRC_IP: [u8; 4] = [192, 168, 1, 1];
const TEST_DST_IP: [u8; 4] = [192, 168, 1, 2];

/// Build a complete Ethernet/IPv4/UDP packet with valid checksums.
pub fn build_udp_packet(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let udp = UdpBuilder::new()
        .src_port(src_port)
        .dst_port(dst_port)
        .payload(payload)
        .build_v4(TEST_SRC_IP, TEST_DST_IP);

    let ipv4 = Ipv4Builder::new()
        .src(TEST_SRC_IP)
        .dst(TEST_DST_IP)
        .protocol(17)
        .payload(&udp)
        .build();

    EthernetBuilder::new().ethertype(0x0800).payload(&ipv4).build()
}

/// Build a complete Ethernet/IPv4/TCP packet with valid checksums.
pub fn build_tcp_packet(flags: u16, options: &[u8], payload: &[u8]) -> Vec<u8> {
    let tcp = TcpBuilder::new()
        .flags(flags)
        .options(options)
        .payload(payload)
        .build_v4(TEST_SRC_IP, TEST_DST_IP);

    let ipv4 = Ipv4Builder::new()
        .src(TEST_SRC_IP)
        .dst(TEST_DST_IP)
        .protocol(6)
        .payload(&tcp)
        .build();

    EthernetBuilder::new().ethertype(0x0800).payload(&ipv4).build()
}

/// Run one dissector over a fully captured region, the way dispatch does.
pub fn dissect_one<'a, D: Dissector>(
    dissector: &D,
    data: &'a [u8],
) -> (Result<Decoded, DissectError>, Layer<'a>) {
    let config = DissectConfig::default();
    dissect_one_with(dissector, data, &config)
}

/// Like [`dissect_one`], with only the first `captured` bytes available.
pub fn dissect_one_captured<'a, D: Dissector>(
    dissector: &D,
    data: &'a [u8],
    captured: usize,
) -> (Result<Decoded, DissectError>, Layer<'a>) {
    let config = DissectConfig::default();
    let ctx = DissectContext::new(&config, 1);
    run(dissector, Cursor::new(&data[..captured.min(data.len())]), data.len(), &ctx)
}

pub fn dissect_one_with<'a, D: Dissector>(
    dissector: &D,
    data: &'a [u8],
    config: &DissectConfig,
) -> (Result<Decoded, DissectError>, Layer<'a>) {
    let ctx = DissectContext::new(config, 1);
    run(dissector, Cursor::new(data), data.len(), &ctx)
}

/// Run one dissector with a prepared context (pseudo-header, tunnels).
pub fn dissect_one_in<'a, D: Dissector>(
    dissector: &D,
    data: &'a [u8],
    ctx: &DissectContext<'_>,
) -> (Result<Decoded, DissectError>, Layer<'a>) {
    run(dissector, Cursor::new(data), data.len(), ctx)
}

fn run<'a, D: Dissector>(
    dissector: &D,
    cursor: Cursor<'a>,
    claimed: usize,
    ctx: &DissectContext<'_>,
) -> (Result<Decoded, DissectError>, Layer<'a>) {
    let mut layer = Layer::new(dissector.name(), dissector.display_name(), 0);
    let result = cursor
        .ensure(0, dissector.min_header_len())
        .and_then(|()| dissector.dissect(&cursor, claimed, ctx, &mut layer));
    (result, layer)
}

/// Helper to assert a field value equals expected.
pub fn assert_field_eq(layer: &Layer<'_>, field: &str, expected: FieldValue<'_>) {
    let actual = layer
        .get(field)
        .unwrap_or_else(|| panic!("Field '{}' not found in {} layer", field, layer.protocol));
    assert_eq!(
        *actual, expected,
        "Field '{}' mismatch: expected {:?}, got {:?}",
        field, expected, actual
    );
}
