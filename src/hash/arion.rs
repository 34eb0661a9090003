//! Arion: circulant mixing around a generalized triangular dynamical system
//! (GTDS).
//!
//! The last lane is inverted through `x^(1/d2)`; every other lane is
//!
//! ```text
//! f_i = x_i^d1 * (s^2 + a1*s + a2) + (s^2 + b1*s),   s = sum_{j > i} (x_j + f_j)
//! ```
//!
//! The ArionV2 instance keeps the layout and raises `d2` to 257 with fewer
//! rounds.

use ark_bls12_381::Fr;
use ark_ff::{Field, PrimeField};
use once_cell::sync::Lazy;

use super::{block_to_words, circulant, field_hash_add, mat_vec, words_to_digest, Permutation};
use crate::error::{Error, Result};
use crate::field_utils::{field_bytes, inverse_exponent, irreducible_pair, pow_u64, prng_field_stream};

const DOMAIN: &[u8] = b"mtree-gadgets/arion/v1";

pub const ARION_D1: u64 = 5;
pub const ARION_D2: u64 = 5;
pub const ARION_ROUNDS: usize = 9;
pub const ARION_V2_D2: u64 = 257;
pub const ARION_V2_ROUNDS: usize = 6;

#[derive(Clone, Debug)]
pub struct ArionParams<F: PrimeField> {
    pub rate: usize,
    pub capacity: usize,
    pub rounds: usize,
    pub d1: u64,
    pub d2: u64,
    pub d2_inv: Vec<u64>,
    pub alpha: (F, F),
    pub beta: F,
    pub round_c: Vec<F>,
    pub mat: Vec<Vec<F>>,
}

impl<F: PrimeField> ArionParams<F> {
    pub fn new(rate: usize, capacity: usize, rounds: usize, d2: u64) -> Result<Self> {
        let width = rate + capacity;
        if rate == 0 || width < 2 {
            return Err(Error::UnsupportedWidth(width));
        }
        let row: Vec<u64> = (1..=width as u64).collect();
        let tag = [width.to_le_bytes(), d2.to_le_bytes()].concat();
        Ok(Self {
            rate,
            capacity,
            rounds,
            d1: ARION_D1,
            d2,
            d2_inv: inverse_exponent::<F>(d2)?,
            alpha: irreducible_pair(DOMAIN, &[b"alpha".as_slice(), &tag].concat()),
            beta: prng_field_stream(DOMAIN, &[b"beta".as_slice(), &tag].concat(), 1)[0],
            round_c: prng_field_stream(
                DOMAIN,
                &[b"round_c".as_slice(), &tag].concat(),
                rounds * width,
            ),
            mat: circulant(&row),
        })
    }

    pub fn width(&self) -> usize {
        self.rate + self.capacity
    }
}

#[derive(Clone, Debug)]
pub struct Arion<F: PrimeField> {
    pub params: ArionParams<F>,
}

impl<F: PrimeField> Arion<F> {
    pub fn new(rate: usize, capacity: usize, rounds: usize, d2: u64) -> Result<Self> {
        Ok(Self {
            params: ArionParams::new(rate, capacity, rounds, d2)?,
        })
    }

    /// The `d2 = 257`, six-round instance.
    pub fn v2() -> Result<Self> {
        Self::new(2, 1, ARION_V2_ROUNDS, ARION_V2_D2)
    }

    pub fn gtds(&self, x: &[F]) -> Vec<F> {
        let p = &self.params;
        let t = x.len();
        let mut f = vec![F::ZERO; t];
        f[t - 1] = x[t - 1].pow(&p.d2_inv);
        let mut sigma = F::ZERO;
        for i in (0..t - 1).rev() {
            sigma += x[i + 1] + f[i + 1];
            let sq = sigma.square();
            let g = sq + p.alpha.0 * sigma + p.alpha.1;
            let h = sq + p.beta * sigma;
            f[i] = pow_u64(&x[i], p.d1) * g + h;
        }
        f
    }

    pub fn permute(&self, state: &mut Vec<F>) {
        let p = &self.params;
        let t = p.width();
        *state = mat_vec(&p.mat, state);
        for r in 0..p.rounds {
            *state = mat_vec(&p.mat, &self.gtds(state));
            for (j, s) in state.iter_mut().enumerate() {
                *s += p.round_c[r * t + j];
            }
        }
    }

    pub fn hash_field(&self, input: &[F]) -> F {
        let mut state = vec![F::ZERO; self.params.width()];
        state[..input.len()].copy_from_slice(input);
        self.permute(&mut state);
        state[0]
    }
}

impl<F: PrimeField> Default for Arion<F> {
    fn default() -> Self {
        Self::new(2, 1, ARION_ROUNDS, ARION_D2).unwrap_or_else(|e| panic!("arion parameters: {e}"))
    }
}

impl<F: PrimeField> Permutation for Arion<F> {
    fn rate(&self) -> usize {
        self.params.rate
    }

    fn capacity(&self) -> usize {
        self.params.capacity
    }

    fn digest_size(&self) -> usize {
        field_bytes::<F>()
    }

    fn block_size(&self) -> usize {
        self.params.rate * field_bytes::<F>()
    }

    fn hash_oneblock(&self, digest: &mut [u8], block: &[u8]) {
        let words = block_to_words::<F>(block, self.params.rate);
        words_to_digest(&[self.hash_field(&words)], digest);
    }

    fn hash_add(&self, x: &mut [u8], y: &[u8]) {
        field_hash_add::<F>(x, y)
    }
}

pub static ARION_FR381: Lazy<Arion<Fr>> = Lazy::new(Arion::default);
pub static ARION_V2_FR381: Lazy<Arion<Fr>> =
    Lazy::new(|| Arion::v2().unwrap_or_else(|e| panic!("arion v2 parameters: {e}")));
