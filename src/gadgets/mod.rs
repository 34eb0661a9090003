//! R1CS gadgets: permutation gadgets, the XOR/add glue and the tree gadgets
//! composed over them.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{Namespace, SynthesisError};

use crate::digest::{DigestVar, FieldDigestVar};
use crate::hash::Permutation;

pub mod abr;
pub mod arion;
pub mod fixed_mtree;
pub mod griffin;
pub mod mimc;
pub mod mtree;
pub mod poseidon5;
pub mod pow;
pub mod sha;
pub mod xor;

pub use abr::{locate_entry, AbrEntry, AbrEntryKind, AbrGadget};
pub use fixed_mtree::FixedMTreeGadget;
pub use mtree::MTreeGadget;
pub use pow::PowGadget;

/// A permutation that can also be synthesized. The gadget consumes exactly
/// `arity()` digests and yields one digest that reads back to
/// `Permutation::hash_oneblock` of the concatenated bytes.
pub trait PermutationGadget<F: PrimeField>: Permutation {
    type Digest: DigestVar<F>;

    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError>;

    fn hash_add_var(
        &self,
        x: &Self::Digest,
        y: &Self::Digest,
    ) -> Result<Self::Digest, SynthesisError> {
        x.combine(y)
    }

    fn new_digest(
        &self,
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<Vec<u8>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self::Digest, SynthesisError> {
        Self::Digest::new_bytes(cs, self.digest_size(), f, mode)
    }
}

/// Flatten field digests into exactly `rate` state words.
pub(crate) fn block_words<F: PrimeField>(
    block: &[FieldDigestVar<F>],
    rate: usize,
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    let words: Vec<FpVar<F>> = block.iter().flat_map(|d| d.words.iter().cloned()).collect();
    if words.len() != rate {
        return Err(SynthesisError::Unsatisfiable);
    }
    Ok(words)
}

/// Linear layer `m * x`; constant coefficients, so no rows are added.
pub(crate) fn mat_vec_var<F: PrimeField>(m: &[Vec<F>], x: &[FpVar<F>]) -> Vec<FpVar<F>> {
    m.iter()
        .map(|row| {
            row.iter()
                .zip(x)
                .fold(FpVar::zero(), |acc, (c, v)| acc + v * *c)
        })
        .collect()
}

pub(crate) fn add_round_constants<F: PrimeField>(state: &mut [FpVar<F>], rc: &[F]) {
    for (s, c) in state.iter_mut().zip(rc) {
        *s += *c;
    }
}
