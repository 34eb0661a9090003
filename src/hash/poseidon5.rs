//! Poseidon over the quintic S-box (`R_F = 2 * 4` full rounds around `R_P = 57`
//! partial rounds).

use ark_bls12_381::Fr;
use ark_ff::{Field, PrimeField};
use once_cell::sync::Lazy;

use super::{block_to_words, field_hash_add, mat_vec, words_to_digest, Permutation};
use crate::error::{Error, Result};
use crate::field_utils::{field_bytes, pow_u64, prng_field_stream};

const DOMAIN: &[u8] = b"mtree-gadgets/poseidon5/v1";

pub const POSEIDON5_ALPHA: u64 = 5;
pub const POSEIDON5_HALF_FULL_ROUNDS: usize = 4;
pub const POSEIDON5_PARTIAL_ROUNDS: usize = 57;

#[derive(Clone, Debug)]
pub struct Poseidon5Params<F: PrimeField> {
    pub rate: usize,
    pub capacity: usize,
    /// Full rounds on each side of the partial rounds.
    pub half_full_rounds: usize,
    pub partial_rounds: usize,
    pub round_c: Vec<F>,
    pub mds: Vec<Vec<F>>,
}

impl<F: PrimeField> Poseidon5Params<F> {
    pub fn new(
        rate: usize,
        capacity: usize,
        half_full_rounds: usize,
        partial_rounds: usize,
    ) -> Result<Self> {
        let width = rate + capacity;
        if rate == 0 || width < 2 {
            return Err(Error::UnsupportedWidth(width));
        }
        Ok(Self::build(rate, capacity, half_full_rounds, partial_rounds))
    }

    fn build(rate: usize, capacity: usize, half_full_rounds: usize, partial_rounds: usize) -> Self {
        let width = rate + capacity;
        let rounds = 2 * half_full_rounds + partial_rounds;
        let tag = width.to_le_bytes();
        Self {
            rate,
            capacity,
            half_full_rounds,
            partial_rounds,
            round_c: prng_field_stream(DOMAIN, &[b"ark".as_slice(), &tag].concat(), rounds * width),
            mds: generate_mds_cauchy(width),
        }
    }

    pub fn width(&self) -> usize {
        self.rate + self.capacity
    }

    pub fn rounds(&self) -> usize {
        2 * self.half_full_rounds + self.partial_rounds
    }

    pub fn is_full_round(&self, r: usize) -> bool {
        r < self.half_full_rounds || r >= self.half_full_rounds + self.partial_rounds
    }
}

/// Cauchy matrix `m[i][j] = 1 / (x_i + y_j)` over two parameter streams.
fn generate_mds_cauchy<F: PrimeField>(width: usize) -> Vec<Vec<F>> {
    let tag = width.to_le_bytes();
    let mut xs: Vec<F> = prng_field_stream(DOMAIN, &[b"mds/x".as_slice(), &tag].concat(), width * 4);
    let mut ys: Vec<F> = prng_field_stream(DOMAIN, &[b"mds/y".as_slice(), &tag].concat(), width * 4);
    xs.dedup();
    ys.dedup();
    for xw in xs.windows(width) {
        for yw in ys.windows(width) {
            let m: Option<Vec<Vec<F>>> = xw
                .iter()
                .map(|x| yw.iter().map(|y| (*x + y).inverse()).collect())
                .collect();
            if let Some(m) = m {
                return m;
            }
        }
    }
    (0..width)
        .map(|i| (0..width).map(|j| if i == j { F::ONE } else { F::ZERO }).collect())
        .collect()
}

#[derive(Clone, Debug)]
pub struct Poseidon5<F: PrimeField> {
    pub params: Poseidon5Params<F>,
}

impl<F: PrimeField> Poseidon5<F> {
    pub fn new(
        rate: usize,
        capacity: usize,
        half_full_rounds: usize,
        partial_rounds: usize,
    ) -> Result<Self> {
        Ok(Self {
            params: Poseidon5Params::new(rate, capacity, half_full_rounds, partial_rounds)?,
        })
    }

    pub fn permute(&self, state: &mut Vec<F>) {
        let p = &self.params;
        let t = p.width();
        for r in 0..p.rounds() {
            for (j, s) in state.iter_mut().enumerate() {
                *s += p.round_c[r * t + j];
            }
            if p.is_full_round(r) {
                for s in state.iter_mut() {
                    *s = pow_u64(s, POSEIDON5_ALPHA);
                }
            } else {
                state[0] = pow_u64(&state[0], POSEIDON5_ALPHA);
            }
            *state = mat_vec(&p.mds, state);
        }
    }

    pub fn hash_field(&self, input: &[F]) -> F {
        let mut state = vec![F::ZERO; self.params.width()];
        state[..input.len()].copy_from_slice(input);
        self.permute(&mut state);
        state[0]
    }
}

impl<F: PrimeField> Default for Poseidon5<F> {
    fn default() -> Self {
        Self {
            params: Poseidon5Params::build(
                2,
                1,
                POSEIDON5_HALF_FULL_ROUNDS,
                POSEIDON5_PARTIAL_ROUNDS,
            ),
        }
    }
}

impl<F: PrimeField> Permutation for Poseidon5<F> {
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

pub static POSEIDON5_FR381: Lazy<Poseidon5<Fr>> = Lazy::new(Poseidon5::default);
