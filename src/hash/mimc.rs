//! MiMC over the cube map.
//!
//! Both variants run keyed round chains `h <- (h + k + c_r)^3`, where the first
//! round of every chain carries no constant (`c_0 = 0`) and the remaining
//! `rounds - 1` constants come from the parameter stream.
//!
//! - [`Mimc256`]: `H(x, y) = E_y(E_0(x))`, with `E_k(m) = rounds(m, k) + k`.
//! - [`Mimc512F`]: a two-word Feistel state `(h0, h1)` keyed successively by
//!   the four input words, `(h0, h1) <- ((h0 + k + c_r)^3 + h1, h0)`.

use ark_bls12_381::Fr;
use ark_ff::{Field, PrimeField};
use once_cell::sync::Lazy;

use super::{block_to_words, field_hash_add, words_to_digest, Permutation};
use crate::field_utils::{field_bytes, prng_field_stream};

const DOMAIN: &[u8] = b"mtree-gadgets/mimc/v1";

pub const MIMC256_ROUNDS: usize = 161;
pub const MIMC512F_ROUNDS: usize = 322;

#[derive(Clone, Debug)]
pub struct MimcParams<F: PrimeField> {
    pub rounds: usize,
    /// `rounds - 1` constants, used by rounds `1..rounds`.
    pub round_c: Vec<F>,
}

impl<F: PrimeField> MimcParams<F> {
    pub fn new(rounds: usize) -> Self {
        let rounds = rounds.max(1);
        Self {
            rounds,
            round_c: prng_field_stream(DOMAIN, b"round_c", rounds - 1),
        }
    }

    /// Constant added in round `r` of every keyed chain.
    pub fn constant(&self, r: usize) -> F {
        if r == 0 {
            F::ZERO
        } else {
            self.round_c[r - 1]
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mimc256<F: PrimeField> {
    pub params: MimcParams<F>,
}

impl<F: PrimeField> Default for Mimc256<F> {
    fn default() -> Self {
        Self::with_rounds(MIMC256_ROUNDS)
    }
}

impl<F: PrimeField> Mimc256<F> {
    pub fn with_rounds(rounds: usize) -> Self {
        Self {
            params: MimcParams::new(rounds),
        }
    }

    fn keyed(&self, mut h: F, key: F) -> F {
        for r in 0..self.params.rounds {
            let t = h + key + self.params.constant(r);
            h = t.square() * t;
        }
        h
    }

    pub fn hash_field(&self, x: F, y: F) -> F {
        let h = self.keyed(x, F::ZERO);
        self.keyed(h, y) + y
    }
}

impl<F: PrimeField> Permutation for Mimc256<F> {
    fn rate(&self) -> usize {
        2
    }

    fn capacity(&self) -> usize {
        0
    }

    fn digest_size(&self) -> usize {
        field_bytes::<F>()
    }

    fn block_size(&self) -> usize {
        2 * field_bytes::<F>()
    }

    fn hash_oneblock(&self, digest: &mut [u8], block: &[u8]) {
        let words = block_to_words::<F>(block, 2);
        let out = self.hash_field(words[0], words[1]);
        words_to_digest(&[out], digest);
    }

    fn hash_add(&self, x: &mut [u8], y: &[u8]) {
        field_hash_add::<F>(x, y)
    }
}

#[derive(Clone, Debug)]
pub struct Mimc512F<F: PrimeField> {
    pub params: MimcParams<F>,
}

impl<F: PrimeField> Default for Mimc512F<F> {
    fn default() -> Self {
        Self::with_rounds(MIMC512F_ROUNDS)
    }
}

impl<F: PrimeField> Mimc512F<F> {
    pub fn with_rounds(rounds: usize) -> Self {
        Self {
            params: MimcParams::new(rounds),
        }
    }

    /// Feistel chain keyed by `x0, x1, y0, y1`; returns `[h0, h1]`.
    pub fn hash_field(&self, words: &[F; 4]) -> [F; 2] {
        let (mut h0, mut h1) = (F::ZERO, F::ZERO);
        for key in words {
            for r in 0..self.params.rounds {
                let t = h0 + key + self.params.constant(r);
                let next = t.square() * t + h1;
                h1 = h0;
                h0 = next;
            }
        }
        [h0, h1]
    }
}

impl<F: PrimeField> Permutation for Mimc512F<F> {
    fn rate(&self) -> usize {
        4
    }

    fn capacity(&self) -> usize {
        0
    }

    fn digest_size(&self) -> usize {
        2 * field_bytes::<F>()
    }

    fn block_size(&self) -> usize {
        4 * field_bytes::<F>()
    }

    fn hash_oneblock(&self, digest: &mut [u8], block: &[u8]) {
        let w = block_to_words::<F>(block, 4);
        let out = self.hash_field(&[w[0], w[1], w[2], w[3]]);
        words_to_digest(&out, digest);
    }

    fn hash_add(&self, x: &mut [u8], y: &[u8]) {
        field_hash_add::<F>(x, y)
    }
}

pub static MIMC256_FR381: Lazy<Mimc256<Fr>> = Lazy::new(Mimc256::default);
pub static MIMC512F_FR381: Lazy<Mimc512F<Fr>> = Lazy::new(Mimc512F::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mimc256_unrolls_as_two_keyed_chains() {
        let h = Mimc256::<Fr>::with_rounds(4);
        let (x, y) = (Fr::from(3u64), Fr::from(7u64));
        let cube = |t: Fr| t * t * t;
        let c = &h.params.round_c;
        let mut m = cube(x);
        for ci in c {
            m = cube(m + ci);
        }
        m = cube(m + y);
        for ci in c {
            m = cube(m + y + ci);
        }
        assert_eq!(h.hash_field(x, y), m + y);
    }

    #[test]
    fn mimc512f_first_round_is_a_plain_cube() {
        let h = Mimc512F::<Fr>::with_rounds(1);
        let x0 = Fr::from(5u64);
        let zero = Fr::from(0u64);
        // one round per key: h0 = x0^3, then Feistel steps with the remaining zero keys
        let r1 = x0 * x0 * x0;
        let r2 = r1 * r1 * r1;
        let r3 = r2 * r2 * r2 + r1;
        let r4 = r3 * r3 * r3 + r2;
        assert_eq!(h.hash_field(&[x0, zero, zero, zero]), [r4, r3]);
    }

    #[test]
    fn digest_sizes() {
        assert_eq!(MIMC256_FR381.digest_size(), 32);
        assert_eq!(MIMC256_FR381.arity(), 2);
        assert_eq!(MIMC512F_FR381.digest_size(), 64);
        assert_eq!(MIMC512F_FR381.arity(), 2);
        assert_eq!(MIMC256_FR381.params.round_c.len(), MIMC256_ROUNDS - 1);
    }
}
