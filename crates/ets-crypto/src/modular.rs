//! # Modular Arithmetic
//!
//! Residue operations over a public modulus. Exponentiation uses a
//! Montgomery ladder: every exponent bit costs exactly one multiplication
//! and one squaring regardless of its value, so there is no early-exit or
//! bit-dependent fast path when the exponent is a secret (the Schnorr
//! witness or nonce).
//!
//! Big-integer multiplication itself is not constant time; the ladder only
//! removes the data-dependent operation count.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use ets_core::CryptoError;

fn check_modulus(modulus: &BigUint) -> Result<(), CryptoError> {
    if *modulus <= BigUint::one() {
        return Err(CryptoError::InvalidModulus(modulus.to_string()));
    }
    Ok(())
}

/// `base^exponent mod modulus`, result in `[0, modulus)`.
///
/// # Errors
///
/// `CryptoError::InvalidModulus` if `modulus <= 1`.
pub fn modpow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint, CryptoError> {
    check_modulus(modulus)?;

    let mut r0 = BigUint::one();
    let mut r1 = base % modulus;
    for i in (0..exponent.bits()).rev() {
        if exponent.bit(i) {
            r0 = (&r0 * &r1) % modulus;
            r1 = (&r1 * &r1) % modulus;
        } else {
            r1 = (&r0 * &r1) % modulus;
            r0 = (&r0 * &r0) % modulus;
        }
    }
    Ok(r0)
}

/// `(a * b) mod modulus`.
pub fn mod_mul(a: &BigUint, b: &BigUint, modulus: &BigUint) -> Result<BigUint, CryptoError> {
    check_modulus(modulus)?;
    Ok((a * b) % modulus)
}

/// `(a + b) mod modulus`.
pub fn mod_add(a: &BigUint, b: &BigUint, modulus: &BigUint) -> Result<BigUint, CryptoError> {
    check_modulus(modulus)?;
    Ok((a + b) % modulus)
}

/// True when `value` is a canonical residue, i.e. in `[0, modulus)`.
pub fn is_residue(value: &BigUint, modulus: &BigUint) -> bool {
    !modulus.is_zero() && value < modulus
}
