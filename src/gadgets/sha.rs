//! Bit-sliced SHA-2 compression gadgets.
//!
//! Words are little-endian `Boolean` vectors, so rotations and shifts are pure
//! rewiring. Modular additions pack every operand into one field sum, witness
//! its `w + carry` bits and close with a single recomposition row.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::PermutationGadget;
use crate::digest::BitDigestVar;
use crate::hash::sha::{SHA256_IV, SHA256_K, SHA512_IV, SHA512_K};
use crate::hash::{Sha256, Sha512};

type Word<F> = Vec<Boolean<F>>;

#[derive(Clone, Copy, Debug)]
struct Sha2Config {
    word: usize,
    rounds: usize,
    big_sigma0: [usize; 3],
    big_sigma1: [usize; 3],
    /// rotr, rotr, shr
    small_sigma0: [usize; 3],
    small_sigma1: [usize; 3],
}

const SHA256_CONFIG: Sha2Config = Sha2Config {
    word: 32,
    rounds: 64,
    big_sigma0: [2, 13, 22],
    big_sigma1: [6, 11, 25],
    small_sigma0: [7, 18, 3],
    small_sigma1: [17, 19, 10],
};

const SHA512_CONFIG: Sha2Config = Sha2Config {
    word: 64,
    rounds: 80,
    big_sigma0: [28, 34, 39],
    big_sigma1: [14, 18, 41],
    small_sigma0: [1, 8, 7],
    small_sigma1: [19, 61, 6],
};

fn rotr<F: PrimeField>(x: &[Boolean<F>], n: usize) -> Word<F> {
    let w = x.len();
    (0..w).map(|i| x[(i + n) % w].clone()).collect()
}

fn shr<F: PrimeField>(x: &[Boolean<F>], n: usize) -> Word<F> {
    let w = x.len();
    (0..w)
        .map(|i| x.get(i + n).cloned().unwrap_or(Boolean::FALSE))
        .collect()
}

fn xor3<F: PrimeField>(a: &[Boolean<F>], b: &[Boolean<F>], c: &[Boolean<F>]) -> Word<F> {
    a.iter()
        .zip(b)
        .zip(c)
        .map(|((a, b), c)| &(a ^ b) ^ c)
        .collect()
}

fn big_sigma<F: PrimeField>(x: &[Boolean<F>], r: [usize; 3]) -> Word<F> {
    xor3(&rotr(x, r[0]), &rotr(x, r[1]), &rotr(x, r[2]))
}

fn small_sigma<F: PrimeField>(x: &[Boolean<F>], r: [usize; 3]) -> Word<F> {
    xor3(&rotr(x, r[0]), &rotr(x, r[1]), &shr(x, r[2]))
}

/// `(e & f) ^ (!e & g)`, written as `g ^ (e & (f ^ g))`.
fn ch<F: PrimeField>(e: &[Boolean<F>], f: &[Boolean<F>], g: &[Boolean<F>]) -> Word<F> {
    e.iter()
        .zip(f)
        .zip(g)
        .map(|((e, f), g)| g ^ &(e & &(f ^ g)))
        .collect()
}

/// `(a & b) ^ (c & (a ^ b))`
fn maj<F: PrimeField>(a: &[Boolean<F>], b: &[Boolean<F>], c: &[Boolean<F>]) -> Word<F> {
    a.iter()
        .zip(b)
        .zip(c)
        .map(|((a, b), c)| &(a & b) ^ &(c & &(a ^ b)))
        .collect()
}

fn pack<F: PrimeField>(bits: &[Boolean<F>]) -> FpVar<F> {
    bits.iter().enumerate().fold(FpVar::zero(), |acc, (i, b)| {
        acc + FpVar::from(b.clone()) * F::from(1u128 << i)
    })
}

fn constant_word<F: PrimeField>(v: u64, w: usize) -> Word<F> {
    (0..w).map(|i| Boolean::constant((v >> i) & 1 == 1)).collect()
}

/// `sum(operands) + constant mod 2^w`.
fn add_mod<F: PrimeField>(
    operands: &[&[Boolean<F>]],
    constant: u64,
    w: usize,
) -> Result<Word<F>, SynthesisError> {
    let sum = operands
        .iter()
        .fold(FpVar::constant(F::from(constant)), |acc, op| acc + pack(op));
    let max = operands.len() as u128 * ((1u128 << w) - 1) + constant as u128;
    let total_bits = (128 - max.leading_zeros() as usize).max(w);

    let cs = sum.cs();
    let value = sum.value().ok().map(|v| v.into_bigint());
    if cs.is_none() {
        let v = value.ok_or(SynthesisError::AssignmentMissing)?;
        return Ok((0..w).map(|i| Boolean::constant(v.get_bit(i))).collect());
    }
    let mut bits = (0..total_bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value
                    .map(|v| v.get_bit(i))
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    pack(&bits).enforce_equal(&sum)?;
    bits.truncate(w);
    Ok(bits)
}

fn compress_var<F: PrimeField>(
    cfg: &Sha2Config,
    k: &[u64],
    iv: &[u64],
    block: &[Boolean<F>],
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let w = cfg.word;
    if block.len() != 16 * w {
        return Err(SynthesisError::Unsatisfiable);
    }
    // big-endian bytes, MSB-first bits: each word reversed into little-endian order
    let mut schedule: Vec<Word<F>> = block
        .chunks(w)
        .map(|c| c.iter().rev().cloned().collect())
        .collect();
    for t in 16..cfg.rounds {
        let s0 = small_sigma(&schedule[t - 15], cfg.small_sigma0);
        let s1 = small_sigma(&schedule[t - 2], cfg.small_sigma1);
        let next = add_mod(&[&s1, &schedule[t - 7], &s0, &schedule[t - 16]], 0, w)?;
        schedule.push(next);
    }

    let init: Vec<Word<F>> = iv.iter().map(|v| constant_word(*v, w)).collect();
    let mut s = init.clone();
    for t in 0..cfg.rounds {
        let (a, b, c, d) = (&s[0], &s[1], &s[2], &s[3]);
        let (e, f, g, h) = (&s[4], &s[5], &s[6], &s[7]);
        let sig1 = big_sigma(e, cfg.big_sigma1);
        let ch = ch(e, f, g);
        let sig0 = big_sigma(a, cfg.big_sigma0);
        let maj = maj(a, b, c);
        let new_e = add_mod(&[d, h, &sig1, &ch, &schedule[t]], k[t], w)?;
        let new_a = add_mod(&[h, &sig1, &ch, &schedule[t], &sig0, &maj], k[t], w)?;
        s.pop();
        s.insert(0, new_a);
        s[4] = new_e;
    }

    let mut out = Vec::with_capacity(8 * w);
    for (word, v) in s.iter().zip(iv) {
        let sum = add_mod(&[word], *v, w)?;
        out.extend(sum.into_iter().rev());
    }
    Ok(out)
}

fn concat_bits<F: PrimeField>(block: &[BitDigestVar<F>]) -> Vec<Boolean<F>> {
    block.iter().flat_map(|d| d.bits.iter().cloned()).collect()
}

impl Sha256 {
    /// Compression of a raw 512-bit block (MSB-first per byte).
    pub fn compress_var<F: PrimeField>(
        block: &[Boolean<F>],
    ) -> Result<Vec<Boolean<F>>, SynthesisError> {
        let k: Vec<u64> = SHA256_K.iter().map(|v| u64::from(*v)).collect();
        let iv: Vec<u64> = SHA256_IV.iter().map(|v| u64::from(*v)).collect();
        compress_var(&SHA256_CONFIG, &k, &iv, block)
    }
}

impl Sha512 {
    /// Compression of a raw 1024-bit block (MSB-first per byte).
    pub fn compress_var<F: PrimeField>(
        block: &[Boolean<F>],
    ) -> Result<Vec<Boolean<F>>, SynthesisError> {
        compress_var(&SHA512_CONFIG, &SHA512_K, &SHA512_IV, block)
    }
}

impl<F: PrimeField> PermutationGadget<F> for Sha256 {
    type Digest = BitDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        Ok(BitDigestVar::from_bits(Self::compress_var(&concat_bits(block))?))
    }
}

impl<F: PrimeField> PermutationGadget<F> for Sha512 {
    type Digest = BitDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        Ok(BitDigestVar::from_bits(Self::compress_var(&concat_bits(block))?))
    }
}
