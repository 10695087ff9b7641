//! Strict decimal conversion.
//!
//! Accepts only ASCII digits: no sign, no whitespace, no radix prefix, and
//! overflow is an error instead of wrapping.

use crate::error::{CommandError, Result};

/// Most digits a `u32` can need.
pub const MAX_U32_DIGITS: usize = 10;

/// Longest input accepted by the 8-bit conversion.
pub const MAX_U8_INPUT_LEN: usize = 4;

/// Convert the first `len` bytes of `input` to a `u32`, requiring the input
/// to be terminated right after them.
///
/// ```
/// use multilog_command::safe_atoi_u32;
///
/// assert_eq!(safe_atoi_u32("4294967295", 10), Ok(u32::MAX));
/// assert!(safe_atoi_u32("4294967296", 10).is_err());
/// ```
pub fn safe_atoi_u32(input: impl AsRef<[u8]>, len: usize) -> Result<u32> {
    safe_atoi_u32_with(input, len, true)
}

/// Convert the first `len` bytes of `input` to a `u32`.
///
/// - `len` outside `1..=10`, or longer than `input`: `InvalidInput`
/// - with `check_null_terminated`, the byte after `len` must be absent or
///   NUL: otherwise `InvalidInput`
/// - any non-digit: `BadInput`
/// - value above `u32::MAX`: `BadInput`
pub fn safe_atoi_u32_with(
    input: impl AsRef<[u8]>,
    len: usize,
    check_null_terminated: bool,
) -> Result<u32> {
    let input = input.as_ref();

    if !(1..=MAX_U32_DIGITS).contains(&len) {
        return Err(CommandError::InvalidInput(format!(
            "length {len} outside 1..={MAX_U32_DIGITS}"
        )));
    }
    if len > input.len() {
        return Err(CommandError::InvalidInput(format!(
            "length {len} exceeds input of {} bytes",
            input.len()
        )));
    }
    if check_null_terminated && input.get(len).is_some_and(|&b| b != 0) {
        return Err(CommandError::InvalidInput(format!(
            "input not terminated at length {len}"
        )));
    }

    let digits = &input[..len];
    if let Some(bad) = digits.iter().find(|b| !b.is_ascii_digit()) {
        return Err(CommandError::BadInput(format!(
            "non-digit byte 0x{bad:02x}"
        )));
    }

    let value = digits
        .iter()
        .fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));
    u32::try_from(value)
        .map_err(|_| CommandError::BadInput(format!("{value} overflows u32")))
}

/// Convert up to four bytes to a `u8`, keeping the low byte of the value.
///
/// `"300"` yields 44: the 32-bit result is masked, not range-checked.
pub fn safe_atoi_u8(input: impl AsRef<[u8]>, len: usize) -> Result<u8> {
    safe_atoi_u8_with(input, len, true)
}

/// 8-bit conversion with explicit termination checking.
pub fn safe_atoi_u8_with(
    input: impl AsRef<[u8]>,
    len: usize,
    check_null_terminated: bool,
) -> Result<u8> {
    if len > MAX_U8_INPUT_LEN {
        return Err(CommandError::InvalidInput(format!(
            "length {len} exceeds {MAX_U8_INPUT_LEN} for u8"
        )));
    }
    let value = safe_atoi_u32_with(input, len, check_null_terminated)?;
    Ok((value & 0xFF) as u8)
}
