//! MiMC gadgets: two rows per cube, keys and constants are linear.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::{block_words, PermutationGadget};
use crate::digest::FieldDigestVar;
use crate::hash::mimc::MimcParams;
use crate::hash::{Mimc256, Mimc512F};

fn cube<F: PrimeField>(t: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    Ok(t.square()? * t)
}

fn keyed_var<F: PrimeField>(
    params: &MimcParams<F>,
    mut h: FpVar<F>,
    key: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    for r in 0..params.rounds {
        h = cube(&(&h + key + params.constant(r)))?;
    }
    Ok(h)
}

impl<F: PrimeField> Mimc256<F> {
    pub fn hash_field_var(&self, x: &FpVar<F>, y: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        let h = keyed_var(&self.params, x.clone(), &FpVar::zero())?;
        Ok(keyed_var(&self.params, h, y)? + y)
    }
}

impl<F: PrimeField> PermutationGadget<F> for Mimc256<F> {
    type Digest = FieldDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        let w = block_words(block, 2)?;
        Ok(FieldDigestVar::from_words(vec![self.hash_field_var(&w[0], &w[1])?]))
    }
}

impl<F: PrimeField> Mimc512F<F> {
    pub fn hash_field_var(&self, words: &[FpVar<F>]) -> Result<[FpVar<F>; 2], SynthesisError> {
        let (mut h0, mut h1) = (FpVar::zero(), FpVar::zero());
        for key in words {
            for r in 0..self.params.rounds {
                let next = cube(&(&h0 + key + self.params.constant(r)))? + &h1;
                h1 = h0;
                h0 = next;
            }
        }
        Ok([h0, h1])
    }
}

impl<F: PrimeField> PermutationGadget<F> for Mimc512F<F> {
    type Digest = FieldDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        let w = block_words(block, 4)?;
        let [h0, h1] = self.hash_field_var(&w)?;
        Ok(FieldDigestVar::from_words(vec![h0, h1]))
    }
}
