//! Merkle path gadget over an arbitrary-arity permutation.
//!
//! Level `i` carries `arity` boolean selectors (exactly one set) and the
//! `arity` siblings of the path node. Each child slot of the hashed block is
//! `sel ? prev : sibling`, and the selectors are tied to the leaf index by a
//! single row `sum_i sum_j sel[i][j] * j * arity^i = index`.

use core::marker::PhantomData;

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::PermutationGadget;
use crate::error::Error;
use crate::tree::max_levels;

pub struct MTreeGadget<'a, F: PrimeField, H: PermutationGadget<F>> {
    hasher: &'a H,
    height: usize,
    _field: PhantomData<F>,
}

/// Selectors of every level, `selectors[level][slot]`.
pub type Selectors<F> = Vec<Vec<Boolean<F>>>;

impl<'a, F: PrimeField, H: PermutationGadget<F>> MTreeGadget<'a, F, H> {
    pub fn new(hasher: &'a H, height: usize) -> Result<Self, Error> {
        let arity = hasher.arity();
        if arity < 2 {
            return Err(Error::UnsupportedArity { arity, expected: 2 });
        }
        // every index weight `j * arity^i` must fit the u64 index word
        let max = max_levels(arity) + 1;
        if height < 2 || height > max {
            return Err(Error::InvalidHeight { height, min: 2, max });
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

    pub fn arity(&self) -> usize {
        self.hasher.arity()
    }

    pub fn levels(&self) -> usize {
        self.height - 1
    }

    /// Root of the path from `leaf`; `siblings[level]` holds all `arity`
    /// children of that level (the path slot is ignored).
    pub fn root(
        &self,
        leaf: &H::Digest,
        siblings: &[Vec<H::Digest>],
        index: &FpVar<F>,
    ) -> Result<(H::Digest, Selectors<F>), SynthesisError> {
        self.root_with_selectors(leaf, siblings, index, None)
    }

    /// As [`Self::root`], but with the selector witnesses supplied by the
    /// caller instead of decoded from `index`.
    #[tracing::instrument(target = "r1cs", skip_all)]
    pub fn root_with_selectors(
        &self,
        leaf: &H::Digest,
        siblings: &[Vec<H::Digest>],
        index: &FpVar<F>,
        selector_values: Option<&[Vec<bool>]>,
    ) -> Result<(H::Digest, Selectors<F>), SynthesisError> {
        let arity = self.arity();
        if siblings.len() != self.levels() || siblings.iter().any(|l| l.len() != arity) {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cs = index.cs().or(leaf.cs());
        let index_value = index
            .value()
            .ok()
            .map(|v| v.into_bigint().as_ref()[0]);

        let mut prev = leaf.clone();
        let mut selectors = Vec::with_capacity(self.levels());
        let mut weighted = FpVar::<F>::zero();
        let arity_word = arity as u64;
        let mut coeff = 1u64;
        for (i, level) in siblings.iter().enumerate() {
            let sel = (0..arity)
                .map(|j| {
                    Boolean::new_witness(cs.clone(), || match selector_values {
                        Some(v) => v
                            .get(i)
                            .and_then(|l| l.get(j))
                            .copied()
                            .ok_or(SynthesisError::AssignmentMissing),
                        None => index_value
                            .map(|idx| (idx / coeff) % arity_word == j as u64)
                            .ok_or(SynthesisError::AssignmentMissing),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            // exactly one slot takes the running digest
            let active = sel
                .iter()
                .fold(FpVar::<F>::zero(), |acc, s| acc + FpVar::from(s.clone()));
            active.enforce_equal(&FpVar::one())?;

            for (j, s) in sel.iter().enumerate() {
                let w = coeff
                    .checked_mul(j as u64)
                    .ok_or(SynthesisError::Unsatisfiable)?;
                weighted += FpVar::from(s.clone()) * F::from(w);
            }

            let children = sel
                .iter()
                .zip(level)
                .map(|(s, sib)| H::Digest::conditionally_select(s, &prev, sib))
                .collect::<Result<Vec<_>, _>>()?;
            prev = self.hasher.hash_block_var(&children)?;
            selectors.push(sel);
            coeff = coeff
                .checked_mul(arity_word)
                .ok_or(SynthesisError::Unsatisfiable)?;
        }
        weighted.enforce_equal(index)?;
        tracing::debug!(
            target: "r1cs",
            height = self.height,
            arity,
            constraints = cs.num_constraints(),
            "mtree path synthesized"
        );
        Ok((prev, selectors))
    }

    pub fn enforce_root(
        &self,
        leaf: &H::Digest,
        siblings: &[Vec<H::Digest>],
        index: &FpVar<F>,
        root: &H::Digest,
    ) -> Result<Selectors<F>, SynthesisError> {
        let (computed, selectors) = self.root(leaf, siblings, index)?;
        computed.enforce_equal(root)?;
        Ok(selectors)
    }
}
