//! Griffin permutation used as a one-block compression.
//!
//! State width `t = rate + capacity`. The non-linear layer is the
//! Horst-style map
//!
//! ```text
//! y0 = x0^(1/d)
//! y1 = x1^d
//! yi = xi * (Li^2 + a1*Li + a2),   Li = gamma*y0 + y1 + x(i-1)   (i >= 2, no x(i-1) for i = 2)
//! ```
//!
//! followed by the linear layer and the round constants. A single linear layer
//! is applied before the first round.

use ark_bls12_381::Fr;
use ark_ff::{Field, PrimeField};
use once_cell::sync::Lazy;

use super::{block_to_words, circulant, field_hash_add, mat_vec, words_to_digest, Permutation};
use crate::error::{Error, Result};
use crate::field_utils::{field_bytes, inverse_exponent, irreducible_pair, prng_field_stream};

const DOMAIN: &[u8] = b"mtree-gadgets/griffin/v1";

pub const GRIFFIN_D: u64 = 5;
pub const GRIFFIN_ROUNDS: usize = 12;

const M4: [[u64; 4]; 4] = [[5, 7, 1, 3], [4, 6, 1, 1], [1, 3, 5, 7], [1, 1, 4, 6]];

#[derive(Clone, Debug)]
pub struct GriffinParams<F: PrimeField> {
    pub rate: usize,
    pub capacity: usize,
    pub rounds: usize,
    pub d: u64,
    /// `d^{-1} mod (p - 1)`
    pub d_inv: Vec<u64>,
    pub alpha: (F, F),
    pub gamma: F,
    /// `rounds * width` constants, row-major by round.
    pub round_c: Vec<F>,
    pub mat: Vec<Vec<F>>,
}

impl<F: PrimeField> GriffinParams<F> {
    pub fn new(rate: usize, capacity: usize, rounds: usize) -> Result<Self> {
        let width = rate + capacity;
        let mat = linear_layer::<F>(width)?;
        let tag = width.to_le_bytes();
        Ok(Self {
            rate,
            capacity,
            rounds,
            d: GRIFFIN_D,
            d_inv: inverse_exponent::<F>(GRIFFIN_D)?,
            alpha: irreducible_pair(DOMAIN, &[b"alpha".as_slice(), &tag].concat()),
            gamma: prng_field_stream(DOMAIN, &[b"gamma".as_slice(), &tag].concat(), 1)[0],
            round_c: prng_field_stream(
                DOMAIN,
                &[b"round_c".as_slice(), &tag].concat(),
                rounds * width,
            ),
            mat,
        })
    }

    pub fn width(&self) -> usize {
        self.rate + self.capacity
    }
}

/// `circ(2,1,1)` for width 3, `circ(3,2,1,1)` for width 4 and the
/// `[2*M4, M4, ...; M4, 2*M4, ...]` block matrix for larger multiples of 4.
fn linear_layer<F: PrimeField>(width: usize) -> Result<Vec<Vec<F>>> {
    match width {
        3 => Ok(circulant(&[2, 1, 1])),
        4 => Ok(circulant(&[3, 2, 1, 1])),
        w if w >= 8 && w % 4 == 0 => Ok((0..w)
            .map(|i| {
                (0..w)
                    .map(|k| {
                        let scale = if i / 4 == k / 4 { 2 } else { 1 };
                        F::from(scale * M4[i % 4][k % 4])
                    })
                    .collect()
            })
            .collect()),
        w => Err(Error::UnsupportedWidth(w)),
    }
}

#[derive(Clone, Debug)]
pub struct Griffin<F: PrimeField> {
    pub params: GriffinParams<F>,
}

impl<F: PrimeField> Griffin<F> {
    pub fn new(rate: usize, capacity: usize, rounds: usize) -> Result<Self> {
        Ok(Self {
            params: GriffinParams::new(rate, capacity, rounds)?,
        })
    }

    fn sbox(&self, x: &mut [F]) {
        let p = &self.params;
        let x0 = x[0].pow(&p.d_inv);
        let x1 = x[1].pow([p.d]);
        let mut prev = F::ZERO;
        for i in 2..x.len() {
            let l = p.gamma * x0 + x1 + prev;
            prev = x[i];
            x[i] *= l.square() + p.alpha.0 * l + p.alpha.1;
        }
        x[0] = x0;
        x[1] = x1;
    }

    pub fn permute(&self, state: &mut Vec<F>) {
        let p = &self.params;
        let t = p.width();
        *state = mat_vec(&p.mat, state);
        for r in 0..p.rounds {
            self.sbox(state);
            *state = mat_vec(&p.mat, state);
            for (j, s) in state.iter_mut().enumerate() {
                *s += p.round_c[r * t + j];
            }
        }
    }

    /// Rate words in, first state word out.
    pub fn hash_field(&self, input: &[F]) -> F {
        let mut state = vec![F::ZERO; self.params.width()];
        state[..input.len()].copy_from_slice(input);
        self.permute(&mut state);
        state[0]
    }
}

impl<F: PrimeField> Default for Griffin<F> {
    fn default() -> Self {
        // width 3 is always a supported layer; only the exponent can fail
        Self::new(2, 1, GRIFFIN_ROUNDS).unwrap_or_else(|e| panic!("griffin parameters: {e}"))
    }
}

impl<F: PrimeField> Permutation for Griffin<F> {
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

pub static GRIFFIN_FR381: Lazy<Griffin<Fr>> = Lazy::new(Griffin::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_four_layer_matches_unrolled_mix() {
        let m = linear_layer::<Fr>(4).unwrap();
        let x: Vec<Fr> = (1..=4u64).map(Fr::from).collect();
        let y = mat_vec(&m, &x);
        // rows [3,2,1,1], [1,3,2,1], [1,1,3,2], [2,1,1,3]
        assert_eq!(y[0], Fr::from(3 + 4 + 3 + 4u64));
        assert_eq!(y[1], Fr::from(1 + 6 + 6 + 4u64));
        assert_eq!(y[2], Fr::from(1 + 2 + 9 + 8u64));
        assert_eq!(y[3], Fr::from(2 + 2 + 3 + 12u64));
    }

    #[test]
    fn unsupported_width_is_rejected() {
        assert!(matches!(
            GriffinParams::<Fr>::new(4, 1, 12),
            Err(Error::UnsupportedWidth(5))
        ));
        assert!(GriffinParams::<Fr>::new(6, 2, 12).is_ok());
    }

    #[test]
    fn sbox_first_lane_is_fifth_root() {
        let g = Griffin::<Fr>::new(2, 1, 1).unwrap();
        let mut x = vec![Fr::from(2u64), Fr::from(3u64), Fr::from(4u64)];
        let orig = x.clone();
        g.sbox(&mut x);
        assert_eq!(x[0].pow([5u64]), orig[0]);
        assert_eq!(x[1], orig[1].pow([5u64]));
        let l = g.params.gamma * x[0] + x[1];
        assert_eq!(x[2], orig[2] * (l * l + g.params.alpha.0 * l + g.params.alpha.1));
    }

    #[test]
    fn parameters_are_reproducible() {
        let a = Griffin::<Fr>::default();
        assert_eq!(a.params.round_c, GRIFFIN_FR381.params.round_c);
        assert_eq!(a.params.gamma, GRIFFIN_FR381.params.gamma);
        let block = [7u8; 64];
        assert_eq!(a.hash(&block), GRIFFIN_FR381.hash(&block));
    }
}
