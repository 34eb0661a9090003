//! `ConstraintSynthesizer` wrappers around the tree gadgets.
//!
//! Every witness field is an `Option`; the all-`None` instance is what
//! `snark::setup` synthesizes. Public inputs are allocated root first.

use core::marker::PhantomData;

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::digest::DigestVar;
use crate::gadgets::{AbrGadget, FixedMTreeGadget, MTreeGadget, PermutationGadget, PowGadget};
use crate::tree::{AbrProof, FixedMTreeProof, MTreeProof};

fn digest_var<F: PrimeField, H: PermutationGadget<F>>(
    hasher: &H,
    cs: &ConstraintSystemRef<F>,
    bytes: Option<&Vec<u8>>,
    mode: AllocationMode,
) -> Result<H::Digest, SynthesisError> {
    hasher.new_digest(
        cs.clone(),
        || bytes.cloned().ok_or(SynthesisError::AssignmentMissing),
        mode,
    )
}

fn digest_vars<F: PrimeField, H: PermutationGadget<F>>(
    hasher: &H,
    cs: &ConstraintSystemRef<F>,
    bytes: Option<&[Vec<u8>]>,
    n: usize,
) -> Result<Vec<H::Digest>, SynthesisError> {
    (0..n)
        .map(|i| {
            digest_var(
                hasher,
                cs,
                bytes.and_then(|b| b.get(i)),
                AllocationMode::Witness,
            )
        })
        .collect()
}

/// Membership of a leaf digest at a public index under a public root.
pub struct MTreeCircuit<'a, F: PrimeField, H: PermutationGadget<F>> {
    pub hasher: &'a H,
    pub height: usize,
    pub root: Option<Vec<u8>>,
    pub proof: Option<MTreeProof>,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, H: PermutationGadget<F>> MTreeCircuit<'a, F, H> {
    pub fn setup(hasher: &'a H, height: usize) -> Self {
        Self {
            hasher,
            height,
            root: None,
            proof: None,
            _field: PhantomData,
        }
    }

    pub fn new(hasher: &'a H, height: usize, root: Vec<u8>, proof: MTreeProof) -> Self {
        Self {
            root: Some(root),
            proof: Some(proof),
            ..Self::setup(hasher, height)
        }
    }

    pub fn public_inputs(root: &[u8], index: usize) -> Vec<F> {
        let mut inputs = H::Digest::public_inputs(root);
        inputs.push(F::from(index as u64));
        inputs
    }
}

impl<F: PrimeField, H: PermutationGadget<F>> ConstraintSynthesizer<F> for MTreeCircuit<'_, F, H> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let gadget = MTreeGadget::new(self.hasher, self.height)?;
        let arity = gadget.arity();
        let proof = self.proof.as_ref();

        let root = digest_var(self.hasher, &cs, self.root.as_ref(), AllocationMode::Input)?;
        let index = FpVar::new_input(cs.clone(), || {
            proof
                .map(|p| F::from(p.index as u64))
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let leaf = digest_var(self.hasher, &cs, proof.map(|p| &p.leaf), AllocationMode::Witness)?;
        let siblings = (0..gadget.levels())
            .map(|i| {
                let level = proof.and_then(|p| p.siblings.get(i)).map(Vec::as_slice);
                digest_vars(self.hasher, &cs, level, arity)
            })
            .collect::<Result<Vec<_>, _>>()?;

        gadget.enforce_root(&leaf, &siblings, &index, &root)?;
        Ok(())
    }
}

/// Binary membership with the leaf position baked into the circuit.
pub struct FixedMTreeCircuit<'a, F: PrimeField, H: PermutationGadget<F>> {
    pub hasher: &'a H,
    pub height: usize,
    pub index: usize,
    pub root: Option<Vec<u8>>,
    pub proof: Option<FixedMTreeProof>,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, H: PermutationGadget<F>> FixedMTreeCircuit<'a, F, H> {
    pub fn setup(hasher: &'a H, height: usize, index: usize) -> Self {
        Self {
            hasher,
            height,
            index,
            root: None,
            proof: None,
            _field: PhantomData,
        }
    }

    pub fn new(hasher: &'a H, height: usize, root: Vec<u8>, proof: FixedMTreeProof) -> Self {
        let mut circuit = Self::setup(hasher, height, proof.index);
        circuit.root = Some(root);
        circuit.proof = Some(proof);
        circuit
    }
}

impl<F: PrimeField, H: PermutationGadget<F>> ConstraintSynthesizer<F>
    for FixedMTreeCircuit<'_, F, H>
{
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let gadget = FixedMTreeGadget::new(self.hasher, self.height)?;
        let proof = self.proof.as_ref();
        let root = digest_var(self.hasher, &cs, self.root.as_ref(), AllocationMode::Input)?;
        let leaf = digest_var(self.hasher, &cs, proof.map(|p| &p.leaf), AllocationMode::Witness)?;
        let siblings = digest_vars(
            self.hasher,
            &cs,
            proof.map(|p| p.siblings.as_slice()),
            self.height - 1,
        )?;
        gadget.enforce_root(&leaf, &siblings, self.index, &root)
    }
}

/// ABR membership of the entry `trans_idx` under a public root.
pub struct AbrCircuit<'a, F: PrimeField, H: PermutationGadget<F>> {
    pub hasher: &'a H,
    pub height: usize,
    pub trans_idx: usize,
    pub root: Option<Vec<u8>>,
    pub proof: Option<AbrProof>,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, H: PermutationGadget<F>> AbrCircuit<'a, F, H> {
    pub fn setup(hasher: &'a H, height: usize, trans_idx: usize) -> Self {
        Self {
            hasher,
            height,
            trans_idx,
            root: None,
            proof: None,
            _field: PhantomData,
        }
    }

    pub fn new(hasher: &'a H, height: usize, root: Vec<u8>, proof: AbrProof) -> Self {
        let mut circuit = Self::setup(hasher, height, proof.trans_idx);
        circuit.root = Some(root);
        circuit.proof = Some(proof);
        circuit
    }
}

impl<F: PrimeField, H: PermutationGadget<F>> ConstraintSynthesizer<F> for AbrCircuit<'_, F, H> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let gadget = AbrGadget::new(self.hasher, self.height)?;
        let n = gadget.entry(self.trans_idx)?.path_len();
        let proof = self.proof.as_ref();

        let root = digest_var(self.hasher, &cs, self.root.as_ref(), AllocationMode::Input)?;
        let trans = digest_var(self.hasher, &cs, proof.map(|p| &p.trans), AllocationMode::Witness)?;
        let other = digest_var(self.hasher, &cs, proof.map(|p| &p.other), AllocationMode::Witness)?;
        let middle = digest_vars(self.hasher, &cs, proof.map(|p| p.middle.as_slice()), n)?;
        let otherx = digest_vars(self.hasher, &cs, proof.map(|p| p.otherx.as_slice()), n)?;

        gadget.enforce_root(self.trans_idx, &trans, &other, &middle, &otherx, &root)
    }
}

/// `out = x^exponent` with `out` public.
#[derive(Clone, Debug)]
pub struct PowCircuit<F: PrimeField> {
    pub exponent: u64,
    pub x: Option<F>,
    pub out: Option<F>,
}

impl<F: PrimeField> PowCircuit<F> {
    pub fn new(exponent: u64, x: F) -> Self {
        let out = PowGadget::new(exponent).native(&x);
        Self {
            exponent,
            x: Some(x),
            out: Some(out),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for PowCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let out = FpVar::new_input(cs.clone(), || {
            self.out.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let x = FpVar::new_witness(cs, || self.x.ok_or(SynthesisError::AssignmentMissing))?;
        PowGadget::new(self.exponent).enforce(&x, &out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Mimc256;
    use crate::tree::MTree;
    use ark_bls12_381::Fr;
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};

    #[test]
    fn mtree_circuit_is_satisfied_and_setup_matches_shape() {
        let h = Mimc256::<Fr>::with_rounds(6);
        let data: Vec<u8> = (0..4 * 64).map(|i| i as u8).collect();
        let tree = MTree::new(&h, 3, &data).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        MTreeCircuit::new(&h, 3, tree.digest(), tree.path(2).unwrap())
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        // one word of root, then the index
        assert_eq!(cs.num_instance_variables(), 1 + 2);

        let setup = ConstraintSystem::<Fr>::new_ref();
        setup.set_mode(SynthesisMode::Setup);
        MTreeCircuit::<Fr, _>::setup(&h, 3)
            .generate_constraints(setup.clone())
            .unwrap();
        assert_eq!(setup.num_constraints(), cs.num_constraints());
    }

    #[test]
    fn missing_witness_outside_setup_fails() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let err = PowCircuit::<Fr> {
            exponent: 5,
            x: None,
            out: None,
        }
        .generate_constraints(cs)
        .unwrap_err();
        assert!(matches!(err, SynthesisError::AssignmentMissing));
    }
}
