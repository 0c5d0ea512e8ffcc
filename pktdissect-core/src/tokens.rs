//! Code-to-name lookup tables.
//!
//! A [`TokenTable`] is a static slice of `(code, name)` pairs. Lookups never
//! fail: an unlisted code renders as `unknown (N)`.

use std::borrow::Cow;
use std::fmt::Write;

pub type TokenTable = &'static [(u32, &'static str)];

/// Name for `key`, if listed.
#[inline]
pub fn lookup(table: TokenTable, key: u32) -> Option<&'static str> {
    table
        .iter()
        .find_map(|&(code, name)| (code == key).then_some(name))
}

/// Name for `key`, or `unknown (KEY)`.
pub fn tok2str(table: TokenTable, key: u32) -> Cow<'static, str> {
    match lookup(table, key) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("unknown ({key})")),
    }
}

/// Name for `key`, or a caller-chosen fallback.
pub fn tok2str_or(table: TokenTable, key: u32, fallback: &'static str) -> &'static str {
    lookup(table, key).unwrap_or(fallback)
}

/// Names of the bits set in `value`, joined by `,`.
///
/// The table maps single-bit masks to names. Set bits without a name are
/// appended in hex. A zero value renders as `none`.
pub fn bittok2str(table: TokenTable, value: u32) -> String {
    let mut out = String::new();
    let mut unnamed = value;

    for &(bit, name) in table {
        if bit != 0 && value & bit == bit {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(name);
            unnamed &= !bit;
        }
    }

    if unnamed != 0 {
        if !out.is_empty() {
            out.push(',');
        }
        let _ = write!(out, "{unnamed:#04x}");
    }

    if out.is_empty() {
        out.push_str("none");
    }
    out
}

/// Link-layer header types.
pub const LINKTYPE_VALUES: TokenTable = &[
    (0, "BSD loopback"),
    (1, "EN10MB"),
    (101, "RAW"),
    (113, "LINUX_SLL"),
    (228, "IPV4"),
    (229, "IPV6"),
];
