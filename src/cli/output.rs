//! Per-packet output and run statistics.

use std::fmt;
use std::io::{self, Write};

use pktdissect_core::tokens::{tok2str, LINKTYPE_VALUES};
use pktdissect_core::{Dissection, RawPacket, Stop, Verbosity};

/// Counts of how each packet's dissection ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub packets: u64,
    pub complete: u64,
    pub unknown: u64,
    pub truncated: u64,
    pub malformed: u64,
    pub depth_limit: u64,
    /// Packets with at least one checksum mismatch.
    pub bad_checksums: u64,
}

impl Summary {
    pub fn record(&mut self, dissection: &Dissection<'_>) {
        self.packets += 1;
        match dissection.stop {
            Stop::Complete { .. } => self.complete += 1,
            Stop::UnknownProtocol { .. } => self.unknown += 1,
            Stop::Truncated { .. } => self.truncated += 1,
            Stop::Malformed { .. } => self.malformed += 1,
            Stop::DepthLimit { .. } => self.depth_limit += 1,
        }
        if dissection.checksum_errors() > 0 {
            self.bad_checksums += 1;
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packets: {} complete, {} unknown, {} truncated, {} malformed",
            self.packets, self.complete, self.unknown, self.truncated, self.malformed
        )?;
        if self.depth_limit > 0 {
            write!(f, ", {} at layer limit", self.depth_limit)?;
        }
        if self.bad_checksums > 0 {
            write!(f, ", {} with bad checksums", self.bad_checksums)?;
        }
        Ok(())
    }
}

/// Writes one block of text per packet and keeps the [`Summary`].
pub struct PacketPrinter<W: Write> {
    out: W,
    verbosity: Verbosity,
    summary: Summary,
}

impl<W: Write> PacketPrinter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            verbosity,
            summary: Summary::default(),
        }
    }

    pub fn print(&mut self, packet: &RawPacket, dissection: &Dissection<'_>) -> io::Result<()> {
        self.summary.record(dissection);

        if self.verbosity == Verbosity::Brief {
            return writeln!(self.out, "{} {dissection}", packet.frame_number);
        }

        let seconds = packet.timestamp_us.div_euclid(1_000_000);
        let micros = packet.timestamp_us.rem_euclid(1_000_000);
        writeln!(
            self.out,
            "frame {} {seconds}.{micros:06} {} bytes on wire, {} captured ({})",
            packet.frame_number,
            dissection.frame.on_wire_length,
            dissection.frame.captured_length,
            tok2str(LINKTYPE_VALUES, u32::from(packet.link_type)),
        )?;
        writeln!(self.out, "{dissection}")?;
        writeln!(self.out)
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
