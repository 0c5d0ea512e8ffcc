//! Saved-capture reader for legacy PCAP and PCAPNG files.
//!
//! Format detection looks at the first four bytes; the records themselves
//! are parsed by `pcap_parser`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use pcap_parser::pcapng::Block;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError as ParserError, PcapNGReader};
use tracing::{debug, trace, warn};

use crate::capture::CaptureBuffer;
use crate::error::{Error, PcapError};

/// Buffer size for pcap_parser readers (256KB).
const BUFFER_SIZE: usize = 262144;

/// Format of the capture file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcapFormat {
    /// Classic PCAP, microsecond timestamps (either byte order)
    LegacyMicro,
    /// Classic PCAP, nanosecond timestamps (either byte order)
    LegacyNano,
    PcapNg,
}

impl PcapFormat {
    /// Detect the format from the file's magic number.
    pub fn detect(data: &[u8]) -> Result<Self, Error> {
        let Some(magic) = data.get(..4) else {
            return Err(invalid("file too short for PCAP magic"));
        };

        match u32::from_le_bytes([magic[0], magic[1], magic[2], magic[3]]) {
            0xa1b2c3d4 | 0xd4c3b2a1 => Ok(PcapFormat::LegacyMicro),
            0xa1b23c4d | 0x4d3cb2a1 => Ok(PcapFormat::LegacyNano),
            0x0a0d0d0a => Ok(PcapFormat::PcapNg),
            other => Err(invalid(format!("unknown PCAP magic 0x{other:08x}"))),
        }
    }

    pub fn is_pcapng(&self) -> bool {
        matches!(self, PcapFormat::PcapNg)
    }
}

/// One record read from a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// 1-based position in the file.
    pub frame_number: u64,
    pub timestamp_us: i64,
    pub captured_length: u32,
    pub original_length: u32,
    pub link_type: u16,
    pub data: Bytes,
}

impl RawPacket {
    /// The record as a dissection input.
    pub fn capture(&self) -> CaptureBuffer<'_> {
        CaptureBuffer::new(
            &self.data,
            self.captured_length as usize,
            self.original_length as usize,
        )
    }
}

enum ReaderInner<R: Read> {
    Legacy(LegacyPcapReader<BufReader<R>>),
    Ng(PcapNGReader<BufReader<R>>),
}

/// Streaming reader over a PCAP or PCAPNG source.
///
/// # Example
///
/// ```no_run
/// use pktdissect_core::pcap::CaptureReader;
/// use pktdissect_core::{dissect_packet, default_registry, DissectConfig};
///
/// let config = DissectConfig::default();
/// for packet in CaptureReader::open("capture.pcap")? {
///     let packet = packet?;
///     let dissection = dissect_packet(default_registry(), &config, packet.link_type, packet.capture());
///     println!("{}: {}", packet.frame_number, dissection);
/// }
/// # Ok::<(), pktdissect_core::Error>(())
/// ```
pub struct CaptureReader<R: Read> {
    inner: ReaderInner<R>,
    format: PcapFormat,
    frame_number: u64,
    /// Link type of each PCAPNG interface, by interface id. Legacy files
    /// have exactly one.
    link_types: Vec<u16>,
}

impl CaptureReader<File> {
    /// Open a capture file, detecting its format.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::Pcap(PcapError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => Error::Io(e),
        })?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => invalid("file too short for PCAP magic"),
            _ => Error::Io(e),
        })?;
        let format = PcapFormat::detect(&magic)?;

        // Seek back to start
        file.seek(SeekFrom::Start(0))?;

        debug!(path = %path.display(), ?format, "opening capture");
        Self::with_format(file, format)
    }
}

impl<R: Read> CaptureReader<R> {
    /// Detect the format of `source` and parse it. The magic is peeked
    /// from the buffer, so nothing is consumed before the file header.
    pub fn from_reader(source: R) -> Result<Self, Error> {
        let mut buf_reader = BufReader::with_capacity(BUFFER_SIZE, source);
        let format = PcapFormat::detect(buf_reader.fill_buf()?)?;
        Self::from_buffered(buf_reader, format)
    }

    /// Create a reader for a source whose format is already known. The
    /// source must still start at the file header.
    pub fn with_format(source: R, format: PcapFormat) -> Result<Self, Error> {
        Self::from_buffered(BufReader::with_capacity(BUFFER_SIZE, source), format)
    }

    fn from_buffered(buf_reader: BufReader<R>, format: PcapFormat) -> Result<Self, Error> {
        let inner = if format.is_pcapng() {
            let reader = PcapNGReader::new(BUFFER_SIZE, buf_reader)
                .map_err(|e| invalid(format!("failed to parse PCAPNG: {e}")))?;
            ReaderInner::Ng(reader)
        } else {
            let reader = LegacyPcapReader::new(BUFFER_SIZE, buf_reader)
                .map_err(|e| invalid(format!("failed to parse legacy PCAP: {e}")))?;
            ReaderInner::Legacy(reader)
        };

        Ok(CaptureReader {
            inner,
            format,
            frame_number: 0,
            link_types: Vec::new(),
        })
    }

    pub fn format(&self) -> PcapFormat {
        self.format
    }

    /// Link type of the first interface, once its header has been read.
    pub fn link_type(&self) -> Option<u16> {
        self.link_types.first().copied()
    }

    /// Records returned so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Read the next packet record.
    ///
    /// Returns `Ok(None)` at end of file.
    pub fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        loop {
            let step = match &mut self.inner {
                ReaderInner::Legacy(reader) => next_block(reader, |block| match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        Record::Interface(header.network.0 as u16)
                    }
                    PcapBlockOwned::Legacy(packet) => Record::Packet {
                        interface: 0,
                        seconds: i64::from(packet.ts_sec),
                        fraction: i64::from(packet.ts_usec),
                        captured_length: packet.caplen,
                        original_length: packet.origlen,
                        data: Bytes::copy_from_slice(packet.data),
                    },
                    _ => Record::Skip,
                }),
                ReaderInner::Ng(reader) => next_block(reader, |block| match block {
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => Record::Section,
                    PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                        Record::Interface(idb.linktype.0 as u16)
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => Record::Packet {
                        interface: epb.if_id as usize,
                        seconds: 0,
                        fraction: (i64::from(epb.ts_high) << 32) | i64::from(epb.ts_low),
                        captured_length: epb.caplen,
                        original_length: epb.origlen,
                        data: Bytes::copy_from_slice(unpadded(epb.data, epb.caplen)),
                    },
                    PcapBlockOwned::NG(Block::SimplePacket(spb)) => Record::Packet {
                        interface: 0,
                        seconds: 0,
                        fraction: 0,
                        captured_length: unpadded(spb.data, spb.origlen).len() as u32,
                        original_length: spb.origlen,
                        data: Bytes::copy_from_slice(unpadded(spb.data, spb.origlen)),
                    },
                    _ => Record::Skip,
                }),
            }?;

            match step {
                None => return Ok(None),
                Some(Record::Skip) => {
                    warn!(frame = self.frame_number, "skipping unsupported capture block");
                }
                Some(Record::Section) => self.link_types.clear(),
                Some(Record::Interface(link_type)) => {
                    trace!(link_type, "interface");
                    self.link_types.push(link_type);
                }
                Some(Record::Packet {
                    interface,
                    seconds,
                    fraction,
                    captured_length,
                    original_length,
                    data,
                }) => {
                    let link_type = *self.link_types.get(interface).ok_or_else(|| {
                        invalid(format!("packet refers to undeclared interface {interface}"))
                    })?;
                    let fraction = match self.format {
                        PcapFormat::LegacyNano => fraction / 1_000,
                        _ => fraction,
                    };
                    self.frame_number += 1;
                    return Ok(Some(RawPacket {
                        frame_number: self.frame_number,
                        timestamp_us: seconds * 1_000_000 + fraction,
                        captured_length,
                        original_length,
                        link_type,
                        data,
                    }));
                }
            }
        }
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<RawPacket, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

/// What one block contributed, detached from the parser's buffer.
enum Record {
    /// Start of a PCAPNG section; interface ids restart.
    Section,
    Interface(u16),
    Packet {
        interface: usize,
        seconds: i64,
        /// Sub-second part (legacy) or whole timestamp (PCAPNG) in the
        /// file's resolution.
        fraction: i64,
        captured_length: u32,
        original_length: u32,
        data: Bytes,
    },
    Skip,
}

/// Pull one block, refilling the parser's buffer as needed.
fn next_block<P, F>(reader: &mut P, mut convert: F) -> Result<Option<Record>, Error>
where
    P: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Record,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let record = convert(block);
                reader.consume(offset);
                return Ok(Some(record));
            }
            Err(ParserError::Eof) => return Ok(None),
            Err(ParserError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| invalid(format!("capture refill error: {e}")))?;
            }
            Err(e) => return Err(invalid(format!("capture parse error: {e}"))),
        }
    }
}

/// PCAPNG packet data is padded to 32 bits; keep the recorded bytes only.
fn unpadded(data: &[u8], len: u32) -> &[u8] {
    &data[..data.len().min(len as usize)]
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::Pcap(PcapError::InvalidFormat {
        reason: reason.into(),
    })
}
