//! Griffin gadget.
//!
//! Per round: lane 0 witnesses the fifth root and checks it (3 rows), lane 1
//! is a plain fifth power (3 rows), every further lane costs `L^2` and the
//! final product (2 rows).

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::pow::{root_var, PowGadget};
use super::{add_round_constants, block_words, mat_vec_var, PermutationGadget};
use crate::digest::FieldDigestVar;
use crate::hash::Griffin;

impl<F: PrimeField> Griffin<F> {
    fn sbox_var(&self, x: &mut [FpVar<F>]) -> Result<(), SynthesisError> {
        let p = &self.params;
        let y0 = root_var(&x[0], p.d, &p.d_inv)?;
        let y1 = PowGadget::new(p.d).pow(&x[1])?;
        let mut prev: Option<FpVar<F>> = None;
        for i in 2..x.len() {
            let mut l = &y0 * p.gamma + &y1;
            if let Some(prev) = &prev {
                l += prev;
            }
            let q = l.square()? + &l * p.alpha.0 + p.alpha.1;
            let yi = &x[i] * &q;
            prev = Some(core::mem::replace(&mut x[i], yi));
        }
        x[0] = y0;
        x[1] = y1;
        Ok(())
    }

    pub fn permute_var(&self, state: &mut Vec<FpVar<F>>) -> Result<(), SynthesisError> {
        let p = &self.params;
        let t = p.width();
        *state = mat_vec_var(&p.mat, state);
        for r in 0..p.rounds {
            self.sbox_var(state)?;
            *state = mat_vec_var(&p.mat, state);
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

impl<F: PrimeField> PermutationGadget<F> for Griffin<F> {
    type Digest = FieldDigestVar<F>;

    #[tracing::instrument(target = "r1cs", skip_all)]
    fn hash_block_var(&self, block: &[Self::Digest]) -> Result<Self::Digest, SynthesisError> {
        let words = block_words(block, self.params.rate)?;
        Ok(FieldDigestVar::from_words(vec![self.hash_field_var(&words)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestVar;
    use crate::hash::griffin::GRIFFIN_FR381;
    use crate::hash::Permutation;
    use ark_bls12_381::Fr;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::UniformRand;

    #[test]
    fn width_three_matches_plain() {
        let h = &*GRIFFIN_FR381;
        let mut rng = ark_std::test_rng();
        let words = [Fr::rand(&mut rng), Fr::rand(&mut rng)];
        let cs = ConstraintSystem::<Fr>::new_ref();
        let block = FieldDigestVar::new_words(cs.clone(), 2, || Ok(words.to_vec()), AllocationMode::Witness)
            .unwrap();
        let out = h.hash_field_var(&block.words).unwrap();
        assert_eq!(out.value().unwrap(), h.hash_field(&words));
        // (3 + 3 + 2) rows per round
        assert_eq!(cs.num_constraints(), 12 * 8);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn wide_state_matches_plain() {
        let h = Griffin::<Fr>::new(6, 2, 4).unwrap();
        let block: Vec<u8> = (0..192u8).map(|b| b & 0x3f).collect();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let digests: Vec<_> = block
            .chunks(32)
            .map(|c| FieldDigestVar::new_witness_bytes(cs.clone(), 32, || Ok(c.to_vec())).unwrap())
            .collect();
        let out = h.hash_block_var(&digests).unwrap();
        assert_eq!(out.value().unwrap(), h.hash(&block));
        assert!(cs.is_satisfied().unwrap());
    }
}
