//! Arion / ArionV2 gadget.
//!
//! Per round the last lane costs the root check (3 rows for `d2 = 5`, 9 for
//! `d2 = 257`); every other lane costs `x^2, x^4, x^5, s^2` and the product
//! `x^5 * g` (5 rows).

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::pow::{root_var, PowGadget};
use super::{add_round_constants, block_words, mat_vec_var, PermutationGadget};
use crate::digest::FieldDigestVar;
use crate::hash::Arion;

impl<F: PrimeField> Arion<F> {
    pub fn gtds_var(&self, x: &[FpVar<F>]) -> Result<Vec<FpVar<F>>, SynthesisError> {
        let p = &self.params;
        let t = x.len();
        let pow_d1 = PowGadget::new(p.d1);
        let mut f = vec![FpVar::zero(); t];
        f[t - 1] = root_var(&x[t - 1], p.d2, &p.d2_inv)?;
        let mut sigma = FpVar::<F>::zero();
        for i in (0..t - 1).rev() {
            sigma += &x[i + 1] + &f[i + 1];
            let xd = pow_d1.pow(&x[i])?;
            let sq = sigma.square()?;
            let g = &sq + &sigma * p.alpha.0 + p.alpha.1;
            let h = sq + &sigma * p.beta;
            f[i] = xd * g + h;
        }
        Ok(f)
    }

    pub fn permute_var(&self, state: &mut Vec<FpVar<F>>) -> Result<(), SynthesisError> {
        let p = &self.params;
        let t = p.width();
        *state = mat_vec_var(&p.mat, state);
        for r in 0..p.rounds {
            *state = mat_vec_var(&p.mat, &self.gtds_var(state)?);
            add_round_constants(state, &p.round_c[r * t..(r + 1) * t]);
        }
        Ok(())
    }

    pub fn hash_field_var(&self, input: &[FpVar<F>]) -> Result<FpVar<F>, SynthesisError> {
        let mut state = input.to_vec();
        state.resize(self.params.width(), FpVar::zero());
        self.permute_var(&mut state)?;
        Ok(state.swap_remove(0))
    }
}

impl<F: PrimeField> PermutationGadget<F> for Arion<F> {
    type Digest = FieldDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        let words = block_words(block, self.params.rate)?;
        Ok(FieldDigestVar::from_words(vec![self.hash_field_var(&words)?]))
    }
}
