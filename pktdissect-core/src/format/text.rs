//! Text rendering of a [`Dissection`].
//!
//! Layers are written one per line in encapsulation order, indented two
//! spaces per tunnel level, and followed by a line for the terminal state.
//! [`Verbosity::Brief`] collapses everything onto a single line.

use std::fmt::{self, Write};

use super::address::format_hex_preview;
use crate::config::Verbosity;
use crate::error::DissectError;
use crate::protocol::{Dissection, FieldValue, Layer, Stop};

/// Write `dissection` at the verbosity it was produced with.
pub fn write_dissection(f: &mut impl Write, dissection: &Dissection<'_>) -> fmt::Result {
    if dissection.verbosity == Verbosity::Brief {
        return write_brief(f, dissection);
    }

    let verbose = dissection.verbosity >= Verbosity::Verbose;
    for layer in &dissection.layers {
        write_layer(f, layer, verbose)?;
        f.write_char('\n')?;
    }

    let depth = dissection.layers.last().map_or(0, |l| l.encap_depth);
    write_indent(f, depth)?;
    write_stop(f, &dissection.stop)?;
    if verbose && dissection.payload_preview > 0 {
        if let Stop::Complete { payload, .. } = dissection.stop {
            if !payload.is_empty() {
                write!(f, " {}", format_hex_preview(payload, dissection.payload_preview))?;
            }
        }
    }
    Ok(())
}

fn write_brief(f: &mut impl Write, dissection: &Dissection<'_>) -> fmt::Result {
    for (i, layer) in dissection.layers.iter().enumerate() {
        if i > 0 {
            f.write_str(" / ")?;
        }
        f.write_str(layer.protocol)?;
    }
    if !dissection.layers.is_empty() {
        f.write_str(", ")?;
    }
    write_stop(f, &dissection.stop)?;

    let bad = dissection.checksum_errors();
    if bad > 0 {
        write!(f, " [{bad} bad checksum{}]", if bad == 1 { "" } else { "s" })?;
    }
    Ok(())
}

fn write_layer(f: &mut impl Write, layer: &Layer<'_>, verbose: bool) -> fmt::Result {
    write_indent(f, layer.encap_depth)?;
    f.write_str(layer.protocol)?;
    if verbose {
        match layer.consumed {
            Some(consumed) => write!(f, " [offset {}, {consumed} bytes]", layer.offset)?,
            None => write!(f, " [offset {}]", layer.offset)?,
        }
    }

    for (i, (name, value)) in layer.fields.iter().enumerate() {
        f.write_str(if i == 0 { ": " } else { ", " })?;
        write!(f, "{name}={value}")?;
    }
    for note in &layer.notes {
        write!(f, " {note}")?;
    }

    if !layer.options.is_empty() {
        f.write_char('\n')?;
        write_indent(f, layer.encap_depth)?;
        f.write_str("  options:")?;
        for (i, option) in layer.options.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            match option.value {
                FieldValue::Null => f.write_str(&option.name)?,
                ref value => write!(f, "{}={value}", option.name)?,
            }
        }
    }
    Ok(())
}

fn write_stop(f: &mut impl Write, stop: &Stop<'_>) -> fmt::Result {
    match stop {
        Stop::Complete {
            payload, claimed, ..
        } => {
            write!(f, "payload: {claimed} bytes")?;
            if payload.len() < *claimed {
                write!(f, ", {} captured", payload.len())?;
            }
            Ok(())
        }
        Stop::UnknownProtocol { key, remaining, .. } => {
            write!(f, "unknown {key}, {remaining} bytes")
        }
        Stop::Truncated { protocol, error } => match error {
            DissectError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "[truncated {protocol}] need {needed} bytes at offset {offset}, {available} captured"
            ),
            other => write!(f, "[truncated {protocol}] {other}"),
        },
        Stop::Malformed { protocol, error } => match error {
            DissectError::Malformed { reason } => write!(f, "[malformed {protocol}: {reason}]"),
            other => write!(f, "[malformed {protocol}: {other}]"),
        },
        Stop::DepthLimit { limit, .. } => write!(f, "[depth limit {limit} reached]"),
    }
}

fn write_indent(f: &mut impl Write, depth: u8) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}
