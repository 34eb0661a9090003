//! Binary Merkle path with the leaf position fixed at synthesis time.
//!
//! Bit `i` of the index decides whether the running digest is the left or
//! the right child at level `i`, so no selector rows are emitted; the circuit
//! shape depends on the index.

use core::marker::PhantomData;

use ark_ff::PrimeField;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::PermutationGadget;
use crate::error::Error;

pub struct FixedMTreeGadget<'a, F: PrimeField, H: PermutationGadget<F>> {
    hasher: &'a H,
    height: usize,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, H: PermutationGadget<F>> FixedMTreeGadget<'a, F, H> {
    pub fn new(hasher: &'a H, height: usize) -> Result<Self, Error> {
        if hasher.arity() != 2 {
            return Err(Error::UnsupportedArity {
                arity: hasher.arity(),
                expected: 2,
            });
        }
        if !(2..=64).contains(&height) {
            return Err(Error::InvalidHeight { height, min: 2, max: 64 });
        }
        Ok(Self {
            hasher,
            height,
            _field: PhantomData,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Root reached from `leaf` at position `index` with one sibling per level.
    #[tracing::instrument(target = "r1cs", skip_all, fields(index))]
    pub fn root(
        &self,
        leaf: &H::Digest,
        siblings: &[H::Digest],
        index: usize,
    ) -> Result<H::Digest, SynthesisError> {
        let levels = self.height - 1;
        if siblings.len() != levels || (levels < 64 && index >> levels != 0) {
            return Err(SynthesisError::Unsatisfiable);
        }
        let mut prev = leaf.clone();
        for (i, sib) in siblings.iter().enumerate() {
            let block = if (index >> i) & 1 == 1 {
                [sib.clone(), prev]
            } else {
                [prev, sib.clone()]
            };
            prev = self.hasher.hash_block_var(&block)?;
        }
        Ok(prev)
    }

    pub fn enforce_root(
        &self,
        leaf: &H::Digest,
        siblings: &[H::Digest],
        index: usize,
        root: &H::Digest,
    ) -> Result<(), SynthesisError> {
        self.root(leaf, siblings, index)?.enforce_equal(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestVar;
    use crate::hash::{Permutation, Poseidon5, Sha256};
    use crate::tree::FixedMTree;
    use ark_bls12_381::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn right_child_positions_swap_the_block() {
        let h = Poseidon5::<Fr>::new(2, 1, 1, 2).unwrap();
        let data: Vec<u8> = (0..4 * 64).map(|i| (i * 7 % 251) as u8).collect();
        let tree = FixedMTree::new(&h, 3, &data).unwrap();
        let gadget = FixedMTreeGadget::new(&h, 3).unwrap();
        for idx in 0..4 {
            let proof = tree.path(idx).unwrap();
            let cs = ConstraintSystem::<Fr>::new_ref();
            let leaf = h.new_digest(cs.clone(), || Ok(proof.leaf.clone()), AllocationMode::Witness).unwrap();
            let sibs = proof
                .siblings
                .iter()
                .map(|s| h.new_digest(cs.clone(), || Ok(s.clone()), AllocationMode::Witness).unwrap())
                .collect::<Vec<_>>();
            let root = h.new_digest(cs.clone(), || Ok(tree.digest()), AllocationMode::Input).unwrap();
            gadget.enforce_root(&leaf, &sibs, idx, &root).unwrap();
            assert!(cs.is_satisfied().unwrap(), "idx {idx}");

            // the same witnesses under the neighbouring index do not verify
            let cs = ConstraintSystem::<Fr>::new_ref();
            let leaf = h.new_digest(cs.clone(), || Ok(proof.leaf.clone()), AllocationMode::Witness).unwrap();
            let sibs = proof
                .siblings
                .iter()
                .map(|s| h.new_digest(cs.clone(), || Ok(s.clone()), AllocationMode::Witness).unwrap())
                .collect::<Vec<_>>();
            let root = h.new_digest(cs.clone(), || Ok(tree.digest()), AllocationMode::Input).unwrap();
            gadget.enforce_root(&leaf, &sibs, idx ^ 1, &root).unwrap();
            assert!(!cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        let h = Sha256;
        assert!(FixedMTreeGadget::<Fr, _>::new(&h, 1).is_err());
        let gadget = FixedMTreeGadget::<Fr, _>::new(&h, 3).unwrap();
        let d = <Sha256 as PermutationGadget<Fr>>::Digest::constant_bytes(&[0u8; 32]);
        assert!(matches!(
            gadget.root(&d, &[d.clone()], 0),
            Err(SynthesisError::Unsatisfiable)
        ));
        assert!(matches!(
            gadget.root(&d, &[d.clone(), d.clone()], 4),
            Err(SynthesisError::Unsatisfiable)
        ));
        assert_eq!(Permutation::arity(&h), 2);
    }
}
