//! Command-line argument definitions.

use clap::Parser;
use std::path::PathBuf;

use pktdissect_core::{DissectConfig, Verbosity};

/// Print protocol dissections of a PCAP or PCAPNG capture.
#[derive(Parser, Debug)]
#[command(name = "pktdissect")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture file to dissect
    #[arg(value_name = "FILE", required_unless_present = "list_protocols")]
    pub file: Option<PathBuf>,

    /// More detail: offsets and payload previews; repeat for debug logging
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// One line per packet
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Stop after this many packets
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub count: Option<u64>,

    /// Do not verify IP, ICMP, TCP, UDP and GRE checksums
    #[arg(long = "no-checksum")]
    pub no_checksum: bool,

    /// Maximum layers decoded per packet
    #[arg(long = "max-layers", value_name = "N", default_value_t = DissectConfig::DEFAULT_MAX_LAYERS)]
    pub max_layers: usize,

    /// Hex bytes of leaf payload shown with -v (0 disables)
    #[arg(long = "payload-preview", value_name = "BYTES", default_value_t = 16)]
    pub payload_preview: usize,

    /// List registered dissectors and exit
    #[arg(long = "list-protocols")]
    pub list_protocols: bool,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Brief
        } else {
            Verbosity::from_count(self.verbose)
        }
    }

    /// Dissection settings for this run.
    pub fn config(&self) -> DissectConfig {
        DissectConfig::new()
            .with_verbosity(self.verbosity())
            .with_checksums(!self.no_checksum)
            .with_max_layers(self.max_layers)
            .with_payload_preview(self.payload_preview)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
