//! Mask-and-shift helpers for packed header fields.
//!
//! Values are read big-endian through the cursor first, then split here.
//! Shifts count from the least significant bit, so the IPv4 version nibble
//! of byte 0 is `field(byte0, 4, 4)`.

/// A mask of the low `width` bits.
#[inline]
pub const fn mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Extract `width` bits starting `shift` bits above the LSB.
#[inline]
pub const fn field(value: u32, shift: u32, width: u32) -> u32 {
    if shift >= 32 {
        0
    } else {
        (value >> shift) & mask(width)
    }
}

/// Test a single bit, counted from the LSB.
#[inline]
pub const fn flag(value: u32, bit: u32) -> bool {
    field(value, bit, 1) == 1
}
