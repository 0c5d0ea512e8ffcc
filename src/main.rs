//! pktdissect CLI entry point.

use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pktdissect::cli::{Args, PacketPrinter};
use pktdissect::core::{default_registry, dissect_packet, CaptureReader, Dissector};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level().into()),
        )
        .init();

    if args.list_protocols {
        list_protocols();
        return Ok(());
    }

    let path = args
        .file
        .as_deref()
        .context("capture file required. Use --help for usage.")?;
    let reader = CaptureReader::open(path)
        .with_context(|| format!("Failed to open capture file: {}", path.display()))?;

    let config = args.config();
    let registry = default_registry();
    let stdout = io::stdout();
    let mut printer = PacketPrinter::new(BufWriter::new(stdout.lock()), config.verbosity);

    for packet in reader.take(args.count.map_or(usize::MAX, |n| n as usize)) {
        let packet = packet.with_context(|| format!("Failed to read {}", path.display()))?;
        let dissection = dissect_packet(registry, &config, packet.link_type, packet.capture());
        printer.print(&packet, &dissection)?;
    }
    printer.flush()?;

    let summary = printer.summary();
    info!(packets = summary.packets, "done");
    eprintln!("{summary}");
    Ok(())
}

fn list_protocols() {
    let registry = default_registry();

    println!("Registered Dissectors:");
    println!("{:-<50}", "");

    for dissector in registry.all_dissectors() {
        println!("  {} ({})", dissector.display_name(), dissector.name());
        let keys: Vec<String> = dissector.keys().iter().map(ToString::to_string).collect();
        println!("    <- {}", keys.join(", "));
    }
}
