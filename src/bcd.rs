//! Binary-coded decimal helpers.
//!
//! Every DS3231 time, date and alarm field stores its value as packed BCD: the
//! tens digit in the high nibble and the ones digit in the low nibble. These
//! functions do no range checking. Callers mask the value to the field width
//! before encoding and strip control bits before decoding.

/// Packs a decimal value into BCD.
///
/// Values above 99 are not rejected; the tens digit overflows the high nibble
/// and is truncated to 8 bits.
#[must_use]
pub const fn encode(decimal: u8) -> u8 {
    ((decimal / 10) << 4) | (decimal % 10)
}

/// Unpacks a BCD byte into its decimal value (high nibble × 10 + low nibble).
#[must_use]
pub const fn decode(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}
