//! Field helpers shared by the algebraic permutations.
//!
//! Everything here is plain (out-of-circuit) arithmetic: byte import/export of
//! digests, the fractional exponents needed by the inverse S-boxes and the
//! deterministic parameter stream every permutation draws its constants from.

use ark_ff::{BigInteger, Field, One, PrimeField, Zero};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Bytes needed to hold one canonical field element.
pub fn field_bytes<F: PrimeField>() -> usize {
    (F::MODULUS_BIT_SIZE as usize + 7) / 8
}

/// Big-endian import, reduced mod p.
pub fn fe_from_be_bytes<F: PrimeField>(bytes: &[u8]) -> F {
    F::from_be_bytes_mod_order(bytes)
}

/// Canonical big-endian export, right-aligned and zero-padded to `out.len()`.
pub fn fe_to_be_bytes<F: PrimeField>(x: &F, out: &mut [u8]) {
    let bytes = x.into_bigint().to_bytes_be();
    let src = &bytes[bytes.len().saturating_sub(out.len())..];
    let pad = out.len() - src.len();
    out[..pad].fill(0);
    out[pad..].copy_from_slice(src);
}

/// `e = d^{-1} mod (p - 1)` as little-endian u64 limbs, so that `(x^e)^d = x`.
pub fn inverse_exponent<F: PrimeField>(d: u64) -> Result<Vec<u64>> {
    if d < 2 {
        return Err(Error::ExponentNotInvertible(d));
    }
    let p_minus_one = Into::<BigUint>::into(F::MODULUS) - 1u32;
    let d_big = BigUint::from(d);
    // e*d = k*(p-1) + 1 for exactly one k in [1, d) when gcd(d, p-1) = 1
    for k in 1..d {
        let candidate = &p_minus_one * k + 1u32;
        if (&candidate % &d_big).bits() == 0 {
            return Ok((candidate / &d_big).to_u64_digits());
        }
    }
    Err(Error::ExponentNotInvertible(d))
}

/// Legendre symbol via Euler's criterion: 0, 1 or -1.
pub fn legendre<F: PrimeField>(x: &F) -> i8 {
    if x.is_zero() {
        return 0;
    }
    if x.pow(F::MODULUS_MINUS_ONE_DIV_TWO).is_one() {
        1
    } else {
        -1
    }
}

pub fn pow_u64<F: Field>(x: &F, e: u64) -> F {
    x.pow([e])
}

/// Deterministic stream of non-zero field elements:
/// `Sha256(domain || 0x00 || tag || ctr_le)` reduced little-endian mod p.
pub fn prng_field_stream<F: PrimeField>(domain: &[u8], tag: &[u8], count: usize) -> Vec<F> {
    let mut out = Vec::with_capacity(count);
    let mut ctr: u64 = 0;
    while out.len() < count {
        let mut h = Sha256::new();
        h.update(domain);
        h.update([0x00]);
        h.update(tag);
        h.update(ctr.to_le_bytes());
        let fe = F::from_le_bytes_mod_order(&h.finalize());
        if !fe.is_zero() {
            out.push(fe);
        }
        ctr = ctr.wrapping_add(1);
    }
    out
}

/// First pair `(a, b)` of the stream for which `X^2 + aX + b` has no root,
/// i.e. the discriminant `a^2 - 4b` is a non-residue.
pub fn irreducible_pair<F: PrimeField>(domain: &[u8], tag: &[u8]) -> (F, F) {
    let four = F::from(4u64);
    let mut attempt: u64 = 0;
    loop {
        let mut sub_tag = tag.to_vec();
        sub_tag.extend_from_slice(&attempt.to_le_bytes());
        let stream = prng_field_stream::<F>(domain, &sub_tag, 32);
        for pair in stream.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            if legendre(&(a.square() - four * b)) == -1 {
                return (a, b);
            }
        }
        attempt += 1;
    }
}
