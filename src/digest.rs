//! In-circuit digests.
//!
//! Algebraic permutations carry digests as field words ([`FieldDigestVar`]);
//! the SHA-2 compressions carry them as bits ([`BitDigestVar`], MSB-first
//! within each byte). Both read back to the same bytes the plain permutation
//! produces.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

use crate::field_utils::{fe_from_be_bytes, fe_to_be_bytes, field_bytes};
use crate::gadgets::xor::{long_add, long_xor};
use crate::r1cs::cs_of;

pub trait DigestVar<F: PrimeField>:
    R1CSVar<F, Value = Vec<u8>> + EqGadget<F> + CondSelectGadget<F> + Clone + core::fmt::Debug
{
    /// Allocate a digest of `size` bytes. `f` is only evaluated once, and only
    /// its result is consumed by the per-element closures.
    fn new_bytes(
        cs: impl Into<Namespace<F>>,
        size: usize,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError>;

    fn constant_bytes(bytes: &[u8]) -> Self;

    /// In-circuit counterpart of `Permutation::hash_add`.
    fn combine(&self, other: &Self) -> Result<Self, SynthesisError>;

    /// Field elements a verifier passes for a digest allocated with
    /// `AllocationMode::Input`.
    fn public_inputs(bytes: &[u8]) -> Vec<F>;

    fn new_witness_bytes(
        cs: impl Into<Namespace<F>>,
        size: usize,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
    ) -> Result<Self, SynthesisError> {
        Self::new_bytes(cs, size, f, AllocationMode::Witness)
    }

    fn new_input_bytes(
        cs: impl Into<Namespace<F>>,
        size: usize,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
    ) -> Result<Self, SynthesisError> {
        Self::new_bytes(cs, size, f, AllocationMode::Input)
    }
}

fn slice_of(
    bytes: &Result<Vec<u8>, SynthesisError>,
    start: usize,
    len: usize,
) -> Result<&[u8], SynthesisError> {
    bytes
        .as_ref()
        .map_err(|_| SynthesisError::AssignmentMissing)?
        .get(start..start + len)
        .ok_or(SynthesisError::AssignmentMissing)
}

#[derive(Clone, Debug)]
pub struct FieldDigestVar<F: PrimeField> {
    pub words: Vec<FpVar<F>>,
}

impl<F: PrimeField> FieldDigestVar<F> {
    pub fn from_words(words: Vec<FpVar<F>>) -> Self {
        Self { words }
    }

    /// Allocate `n` words directly from field values.
    pub fn new_words(
        cs: impl Into<Namespace<F>>,
        n: usize,
        f: impl FnOnce() -> Result<Vec<F>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let values = f();
        let words = (0..n)
            .map(|i| {
                FpVar::new_variable(
                    cs.clone(),
                    || {
                        values
                            .as_ref()
                            .map_err(|_| SynthesisError::AssignmentMissing)?
                            .get(i)
                            .copied()
                            .ok_or(SynthesisError::AssignmentMissing)
                    },
                    mode,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { words })
    }
}

impl<F: PrimeField> R1CSVar<F> for FieldDigestVar<F> {
    type Value = Vec<u8>;

    fn cs(&self) -> ConstraintSystemRef<F> {
        cs_of(&self.words.iter().collect::<Vec<_>>())
    }

    fn value(&self) -> Result<Vec<u8>, SynthesisError> {
        let n = field_bytes::<F>();
        let mut out = vec![0u8; n * self.words.len()];
        for (w, chunk) in self.words.iter().zip(out.chunks_exact_mut(n)) {
            fe_to_be_bytes(&w.value()?, chunk);
        }
        Ok(out)
    }
}

impl<F: PrimeField> EqGadget<F> for FieldDigestVar<F> {
    fn is_eq(&self, other: &Self) -> Result<Boolean<F>, SynthesisError> {
        if self.words.len() != other.words.len() {
            return Err(SynthesisError::Unsatisfiable);
        }
        let eqs = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a.is_eq(b))
            .collect::<Result<Vec<_>, _>>()?;
        Boolean::kary_and(&eqs)
    }

    fn conditional_enforce_equal(
        &self,
        other: &Self,
        should_enforce: &Boolean<F>,
    ) -> Result<(), SynthesisError> {
        if self.words.len() != other.words.len() {
            return Err(SynthesisError::Unsatisfiable);
        }
        for (a, b) in self.words.iter().zip(&other.words) {
            a.conditional_enforce_equal(b, should_enforce)?;
        }
        Ok(())
    }
}

impl<F: PrimeField> CondSelectGadget<F> for FieldDigestVar<F> {
    fn conditionally_select(
        cond: &Boolean<F>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        let words = true_value
            .words
            .iter()
            .zip(&false_value.words)
            .map(|(t, f)| FpVar::conditionally_select(cond, t, f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { words })
    }
}

impl<F: PrimeField> DigestVar<F> for FieldDigestVar<F> {
    fn new_bytes(
        cs: impl Into<Namespace<F>>,
        size: usize,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let n = field_bytes::<F>();
        // a trailing partial word is not allocated
        let count = size / n;
        Self::new_words(
            cs,
            count,
            || {
                let bytes = f();
                (0..count)
                    .map(|i| slice_of(&bytes, i * n, n).map(fe_from_be_bytes::<F>))
                    .collect()
            },
            mode,
        )
    }

    fn constant_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks_exact(field_bytes::<F>())
            .map(|c| FpVar::constant(fe_from_be_bytes(c)))
            .collect();
        Self { words }
    }

    fn combine(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self {
            words: long_add(&self.words, &other.words)?,
        })
    }

    fn public_inputs(bytes: &[u8]) -> Vec<F> {
        bytes
            .chunks_exact(field_bytes::<F>())
            .map(fe_from_be_bytes)
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct BitDigestVar<F: PrimeField> {
    /// `8 * len` bits, MSB-first within each byte.
    pub bits: Vec<Boolean<F>>,
}

impl<F: PrimeField> BitDigestVar<F> {
    pub fn from_bits(bits: Vec<Boolean<F>>) -> Self {
        Self { bits }
    }

    pub fn len_bytes(&self) -> usize {
        self.bits.len() / 8
    }
}

impl<F: PrimeField> R1CSVar<F> for BitDigestVar<F> {
    type Value = Vec<u8>;

    fn cs(&self) -> ConstraintSystemRef<F> {
        cs_of(&self.bits.iter().collect::<Vec<_>>())
    }

    fn value(&self) -> Result<Vec<u8>, SynthesisError> {
        self.bits
            .chunks(8)
            .map(|byte| {
                byte.iter()
                    .try_fold(0u8, |acc, b| Ok::<_, SynthesisError>((acc << 1) | b.value()? as u8))
            })
            .collect()
    }
}

impl<F: PrimeField> EqGadget<F> for BitDigestVar<F> {
    fn is_eq(&self, other: &Self) -> Result<Boolean<F>, SynthesisError> {
        if self.bits.len() != other.bits.len() {
            return Err(SynthesisError::Unsatisfiable);
        }
        let eqs = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| a.is_eq(b))
            .collect::<Result<Vec<_>, _>>()?;
        Boolean::kary_and(&eqs)
    }

    fn conditional_enforce_equal(
        &self,
        other: &Self,
        should_enforce: &Boolean<F>,
    ) -> Result<(), SynthesisError> {
        if self.bits.len() != other.bits.len() {
            return Err(SynthesisError::Unsatisfiable);
        }
        for (a, b) in self.bits.iter().zip(&other.bits) {
            a.conditional_enforce_equal(b, should_enforce)?;
        }
        Ok(())
    }
}

impl<F: PrimeField> CondSelectGadget<F> for BitDigestVar<F> {
    fn conditionally_select(
        cond: &Boolean<F>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        let bits = true_value
            .bits
            .iter()
            .zip(&false_value.bits)
            .map(|(t, f)| Boolean::conditionally_select(cond, t, f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }
}

fn bit_of(byte: u8, j: usize) -> bool {
    (byte >> (7 - j)) & 1 == 1
}

impl<F: PrimeField> DigestVar<F> for BitDigestVar<F> {
    fn new_bytes(
        cs: impl Into<Namespace<F>>,
        size: usize,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let bytes = f();
        let bits = (0..8 * size)
            .map(|k| {
                Boolean::new_variable(
                    cs.clone(),
                    || slice_of(&bytes, k / 8, 1).map(|b| bit_of(b[0], k % 8)),
                    mode,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }

    fn constant_bytes(bytes: &[u8]) -> Self {
        let bits = bytes
            .iter()
            .flat_map(|b| (0..8).map(move |j| Boolean::constant(bit_of(*b, j))))
            .collect();
        Self { bits }
    }

    fn combine(&self, other: &Self) -> Result<Self, SynthesisError> {
        Ok(Self {
            bits: long_xor(&self.bits, &other.bits)?,
        })
    }

    fn public_inputs(bytes: &[u8]) -> Vec<F> {
        bytes
            .iter()
            .flat_map(|b| (0..8).map(move |j| F::from(bit_of(*b, j))))
            .collect()
    }
}
