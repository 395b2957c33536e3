//! Compact-target ("nBits") expansion.
//!
//! A block header carries its proof-of-work threshold as a 4-byte compact
//! form: a one-byte exponent and a three-byte big-endian mantissa. The
//! expanded target is `mantissa * 256^(exponent - 3)`; exponents below 3
//! shift the mantissa right instead.

use num_bigint::BigUint;

use crate::error::SpvError;

/// Expand compact bits to the fixed 64-character hex target.
pub fn expand_target(bits_hex: &str) -> Result<String, SpvError> {
    let target = expand_target_int(bits_hex)?;
    Ok(format!("{:0>64}", target.to_str_radix(16)))
}

/// Expand compact bits to the 32 big-endian target bytes.
pub fn expand_target_bytes(bits_hex: &str) -> Result<Vec<u8>, SpvError> {
    let raw = expand_target_int(bits_hex)?.to_bytes_be();
    let mut out = vec![0u8; 32 - raw.len()];
    out.extend_from_slice(&raw);
    Ok(out)
}

/// Expand compact bits to an arbitrary-precision target integer.
pub fn expand_target_int(bits_hex: &str) -> Result<BigUint, SpvError> {
    if bits_hex.len() != 8 {
        return Err(SpvError::InvalidTarget);
    }
    let raw = hex::decode(bits_hex)?;

    let exponent = raw[0] as u32;
    let mantissa = ((raw[1] as u32) << 16) | ((raw[2] as u32) << 8) | raw[3] as u32;

    // The sign-bit convention for negative targets is invalid in a header.
    if mantissa & 0x0080_0000 != 0 {
        return Err(SpvError::InvalidTarget);
    }
    // Anything wider than 256 bits cannot be a hash threshold.
    if exponent > 32 {
        return Err(SpvError::InvalidTarget);
    }

    let mantissa = BigUint::from(mantissa);
    let target = if exponent >= 3 {
        mantissa << (8 * (exponent - 3))
    } else {
        mantissa >> (8 * (3 - exponent))
    };
    Ok(target)
}
