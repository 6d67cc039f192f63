// Fossil delta integer encoding.
//
// Base-64, big-endian: most-significant digit first, no leading zeros.
// Zero is the single digit `0`.  A digit run ends at the first byte
// outside the alphabet, so the grammar separators (`\n`, `@`, `:`, `;`)
// terminate a number without any length prefix.

/// The 64 digit symbols, in value order.
pub const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz~";

/// Maximum encoded length for a 64-bit value (ceil(64/6) = 11).
pub const MAX_DIGITS: usize = 11;

/// Marker for bytes outside the alphabet in [`DIGIT_VALUE`].
const NOT_A_DIGIT: u8 = 0xFF;

/// Overflow guard: if these bits are set before a shift, the next `<< 6`
/// would lose bits.
const U64_OVERFLOW_MASK: u64 = 0xFC00_0000_0000_0000;

/// Reverse lookup: byte -> digit value, or `NOT_A_DIGIT`.
const DIGIT_VALUE: [u8; 256] = build_digit_values();

const fn build_digit_values() -> [u8; 256] {
    let mut table = [NOT_A_DIGIT; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into the tail of `buf`.
/// Returns the number of digits written (1..=11); they occupy
/// `buf[MAX_DIGITS - len..]`.
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_DIGITS]) -> usize {
    let mut i = MAX_DIGITS;
    loop {
        i -= 1;
        buf[i] = ALPHABET[(num & 0x3F) as usize];
        num >>= 6;
        if num == 0 {
            break;
        }
    }
    MAX_DIGITS - i
}

/// Append the digits of `num` to `out`.
pub fn push_u64(out: &mut Vec<u8>, num: u64) {
    let mut buf = [0u8; MAX_DIGITS];
    let len = encode_u64(num, &mut buf);
    out.extend_from_slice(&buf[MAX_DIGITS - len..]);
}

/// Append the digits of a `usize` to `out`.
pub fn push_usize(out: &mut Vec<u8>, num: usize) {
    push_u64(out, num as u64);
}

/// Append the digits of a `u32` to `out`.
pub fn push_u32(out: &mut Vec<u8>, num: u32) {
    push_u64(out, u64::from(num));
}

/// Encode a value as an owned string (handy for diagnostics and tests).
pub fn to_string(num: u64) -> String {
    let mut buf = [0u8; MAX_DIGITS];
    let len = encode_u64(num, &mut buf);
    buf[MAX_DIGITS - len..].iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Value of a single digit symbol, or `None` for any other byte.
#[inline(always)]
pub fn digit_value(byte: u8) -> Option<u8> {
    match DIGIT_VALUE[byte as usize] {
        NOT_A_DIGIT => None,
        v => Some(v),
    }
}

/// Decode the digit run at the start of `data`.
/// Returns `(value, digits_consumed)`; decoding stops at the first byte
/// outside the alphabet, which is not consumed.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), DigitError> {
    let mut val: u64 = 0;
    let mut consumed = 0;
    for &byte in data {
        let Some(digit) = digit_value(byte) else {
            break;
        };
        if val & U64_OVERFLOW_MASK != 0 {
            return Err(DigitError::Overflow);
        }
        val = (val << 6) | u64::from(digit);
        consumed += 1;
    }
    if consumed == 0 {
        return Err(DigitError::Empty);
    }
    Ok((val, consumed))
}

/// Decode a digit run into a `usize`.
pub fn read_usize(data: &[u8]) -> Result<(usize, usize), DigitError> {
    let (val, len) = read_u64(data)?;
    let val = usize::try_from(val).map_err(|_| DigitError::Overflow)?;
    Ok((val, len))
}

/// Decode a digit run into a `u32`.
pub fn read_u32(data: &[u8]) -> Result<(u32, usize), DigitError> {
    let (val, len) = read_u64(data)?;
    let val = u32::try_from(val).map_err(|_| DigitError::Overflow)?;
    Ok((val, len))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Number of digits needed to encode `num`.
#[inline]
pub fn digit_count(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    bits.max(1).div_ceil(6) as usize
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DigitError {
    /// The input does not start with a digit.
    #[error("expected a base-64 digit")]
    Empty,
    /// Value does not fit the target integer type.
    #[error("integer overflow in digit run")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
