//! Binary coded decimal helpers for RTC register values

/// Decode a BCD register value.
///
/// `mask` selects the bits that belong to the field, every other bit (clock
/// halt, 12/24 hour select and the like) is dropped first. A mask of `0x00`
/// stands for a field that needs no masking and keeps the full byte.
pub fn to_decimal(raw: u8, mask: u8) -> u8 {
    let raw = if mask == 0 { raw } else { raw & mask };
    (raw >> 4) * 10 + (raw & 0x0F)
}

/// Encode a decimal value in the range `0..=99` as BCD, or `None` when it
/// needs more than two digits.
pub fn checked_to_bcd(decimal: u8) -> Option<u8> {
    if decimal > 99 {
        None
    } else {
        Some(to_bcd(decimal))
    }
}

/// Encode a decimal value in the range `0..=99` as BCD.
///
/// # Panics
///
/// In debug builds, if `decimal` is larger than 99. Release builds return a
/// byte with an invalid tens nibble; use [`checked_to_bcd`] when the value is
/// not known to fit.
pub fn to_bcd(decimal: u8) -> u8 {
    debug_assert!(decimal <= 99, "{} does not fit in two BCD digits", decimal);
    ((decimal / 10) << 4) | (decimal % 10)
}
