//! Implicit conversions between Integer, String, and Buffer.
//!
//! AML mandates automatic coercion when an operand's kind differs from
//! the kind an opcode requires. Only the three data kinds participate:
//! a conversion source outside {Integer, String, Buffer} is a resolver
//! bug, never reachable from well-formed dispatch.
//!
//! The conversion rules are the ones ACPI fixes for implicit (not
//! explicit `To*` operator) conversion: strings convert
//! to integers as unprefixed hexadecimal, integers render as uppercase
//! hexadecimal, and buffers render as comma-separated hex byte pairs.

use alloc::string::String;
use alloc::vec::Vec;

use crate::ExecError;
use crate::context::IntegerWidth;
use crate::object::Object;

/// Converts a data object to an integer at the given width.
///
/// Strings parse as unprefixed hexadecimal: leading whitespace is
/// skipped, conversion stops at the first non-hex character or once the
/// width is full, and an empty digit run yields zero. Buffers
/// reinterpret their leading bytes little-endian.
///
/// # Errors
///
/// Returns [`ExecError::Internal`] if the source is not a data object;
/// the resolver checks membership before converting.
pub fn to_integer(source: &Object, width: IntegerWidth) -> Result<u64, ExecError> {
    match source {
        Object::Integer(v) => Ok(width.mask(*v)),
        Object::String(s) => Ok(parse_hex(s, width)),
        Object::Buffer(bytes) => Ok(bytes_to_integer(bytes, width)),
        _ => Err(ExecError::Internal),
    }
}

/// Converts a data object to a buffer.
///
/// Integers serialize to their little-endian byte image at the given
/// width; strings contribute their raw bytes.
///
/// # Errors
///
/// Returns [`ExecError::Internal`] if the source is not a data object.
pub fn to_buffer(source: &Object, width: IntegerWidth) -> Result<Vec<u8>, ExecError> {
    match source {
        Object::Integer(v) => Ok(integer_to_bytes(*v, width)),
        Object::String(s) => Ok(s.as_bytes().to_vec()),
        Object::Buffer(bytes) => Ok(bytes.clone()),
        _ => Err(ExecError::Internal),
    }
}

/// Converts a data object to a string, bounded by `max_len` bytes.
///
/// Integers render as uppercase hexadecimal without leading zeros;
/// buffers render each byte as two uppercase hex digits, separated by
/// commas.
///
/// # Errors
///
/// Returns [`ExecError::LimitExceeded`] if the rendered string would
/// exceed `max_len`, and [`ExecError::Internal`] if the source is not
/// a data object.
pub fn to_string(source: &Object, width: IntegerWidth, max_len: usize) -> Result<String, ExecError> {
    let rendered = match source {
        Object::String(s) => s.clone(),
        Object::Integer(v) => integer_to_hex(width.mask(*v)),
        Object::Buffer(bytes) => {
            // Rendered length is 3 bytes per source byte minus the
            // final separator; check before building the string.
            let needed = bytes.len().saturating_mul(3).saturating_sub(1);
            if needed > max_len {
                return Err(ExecError::LimitExceeded);
            }
            let mut out = String::with_capacity(needed);
            for (i, byte) in bytes.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(hex_digit(byte >> 4));
                out.push(hex_digit(byte & 0x0F));
            }
            out
        }
        _ => return Err(ExecError::Internal),
    };

    if rendered.len() > max_len {
        return Err(ExecError::LimitExceeded);
    }
    Ok(rendered)
}

/// Serializes an integer to its little-endian byte image.
#[must_use]
pub fn integer_to_bytes(value: u64, width: IntegerWidth) -> Vec<u8> {
    value.to_le_bytes()[..width.bytes()].to_vec()
}

/// Reinterprets up to one integer's worth of buffer bytes,
/// little-endian. Short buffers zero-extend; an empty buffer is zero.
#[must_use]
pub fn bytes_to_integer(bytes: &[u8], width: IntegerWidth) -> u64 {
    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().take(width.bytes()).enumerate() {
        value |= u64::from(b) << (8 * i);
    }
    value
}

/// Renders an integer as uppercase hexadecimal with no prefix and no
/// leading zeros.
fn integer_to_hex(value: u64) -> String {
    let mut digits = [0u8; 16];
    let mut n = 0;
    let mut rest = value;
    loop {
        digits[n] = rest as u8 & 0x0F;
        n += 1;
        rest >>= 4;
        if rest == 0 {
            break;
        }
    }

    let mut out = String::with_capacity(n);
    for &d in digits[..n].iter().rev() {
        out.push(hex_digit(d));
    }
    out
}

/// Parses an unprefixed hexadecimal string, implicit-conversion style:
/// skip leading whitespace, consume hex digits, stop at the first
/// non-digit or when the width is full. No digits means zero.
fn parse_hex(s: &str, width: IntegerWidth) -> u64 {
    let mut value: u64 = 0;
    let mut consumed = 0;
    let max_digits = width.bytes() * 2;

    for c in s.trim_start().chars() {
        let Some(digit) = c.to_digit(16) else {
            break;
        };
        if consumed == max_digits {
            break;
        }
        value = (value << 4) | u64::from(digit);
        consumed += 1;
    }
    width.mask(value)
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16)
        .unwrap_or('0')
        .to_ascii_uppercase()
}
