//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Per-packet text output and the end-of-run summary

mod args;
mod output;

pub use args::Args;
pub use output::{PacketPrinter, Summary};
