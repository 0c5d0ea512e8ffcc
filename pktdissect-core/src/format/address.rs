//! Address and byte-string formatting.

use std::fmt::Write;

/// Format 6 bytes as a MAC address string in colon-separated hex format.
///
/// # Example
///
/// ```
/// use pktdissect_core::format::format_mac;
///
/// assert_eq!(format_mac(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]), "aa:bb:cc:dd:ee:ff");
/// ```
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Lowercase hex, no separators.
///
/// ```
/// use pktdissect_core::format::format_hex;
///
/// assert_eq!(format_hex(&[0x00, 0x1f, 0xa0]), "001fa0");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Hex of at most `limit` bytes, with `..` when cut short.
pub fn format_hex_preview(bytes: &[u8], limit: usize) -> String {
    match bytes.get(..limit) {
        Some(head) if head.len() < bytes.len() => format!("{}..", format_hex(head)),
        _ => format_hex(bytes),
    }
}

/// Colon-separated IEEE OUI.
pub fn format_oui(oui: u32) -> String {
    let [_, a, b, c] = oui.to_be_bytes();
    format!("{a:02x}:{b:02x}:{c:02x}")
}
