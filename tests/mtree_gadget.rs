//! MTree gadget against the plain tree, plus a Groth16 round trip.

mod helpers;

use ark_bls12_381::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef};
use helpers::{assert_satisfied, random_bytes, rng, synthesize};
use mtree_gadgets::hash::poseidon5::POSEIDON5_FR381;
use ark_std::rand::Rng;
use mtree_gadgets::{
    snark, Griffin, MTree, MTreeCircuit, MTreeGadget, MTreePath, Mimc256, MTreeProof, Permutation,
    PermutationGadget, Sha256,
};
use serial_test::serial;

fn alloc_proof<H: PermutationGadget<Fr>>(
    h: &H,
    cs: &ConstraintSystemRef<Fr>,
    proof: &MTreeProof,
) -> (H::Digest, Vec<Vec<H::Digest>>, FpVar<Fr>) {
    let w = |d: &Vec<u8>| {
        h.new_digest(cs.clone(), || Ok(d.clone()), AllocationMode::Witness)
            .unwrap()
    };
    let leaf = w(&proof.leaf);
    let siblings = proof
        .siblings
        .iter()
        .map(|level| level.iter().map(w).collect())
        .collect();
    let index = FpVar::new_input(cs.clone(), || Ok(Fr::from(proof.index as u64))).unwrap();
    (leaf, siblings, index)
}

#[test]
fn sha256_every_leaf_of_height_four() {
    let data = random_bytes(&mut rng(), 8 * 64);
    let tree = MTree::new(&Sha256, 4, &data).unwrap();
    let gadget = MTreeGadget::new(&Sha256, 4).unwrap();
    for idx in 0..tree.leaves_n() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (leaf, siblings, index) = alloc_proof(&Sha256, &cs, &tree.path(idx).unwrap());
        let root = Sha256
            .new_digest(cs.clone(), || Ok(tree.digest()), AllocationMode::Input)
            .unwrap();
        let selectors = gadget.enforce_root(&leaf, &siblings, &index, &root).unwrap();
        assert_eq!(selectors.len(), 3);
        for (level, sel) in selectors.iter().enumerate() {
            let active: Vec<bool> = sel.iter().map(|s| s.value().unwrap()).collect();
            let digit = (idx >> level) & 1;
            assert_eq!(active, (0..2).map(|j| j == digit).collect::<Vec<_>>());
        }
        assert_satisfied(&cs);
    }
}

#[test]
fn wide_griffin_tree() {
    let g = Griffin::<Fr>::new(4, 4, 6).unwrap();
    let data = random_bytes(&mut rng(), 16 * g.block_size());
    let tree = MTree::new(&g, 3, &data).unwrap();
    let gadget = MTreeGadget::new(&g, 3).unwrap();
    for idx in [0, 5, 10, 15] {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (leaf, siblings, index) = alloc_proof(&g, &cs, &tree.path(idx).unwrap());
        let (root, _) = gadget.root(&leaf, &siblings, &index).unwrap();
        assert_eq!(root.value().unwrap(), tree.digest(), "idx {idx}");
        assert_satisfied(&cs);
    }
}

/// Root of a single random path at `height`, checked at the first, the last
/// and a random leaf index against the plain recomputation.
fn deep_path_agrees<H: PermutationGadget<Fr>>(h: &H, height: usize) {
    let mut rng = rng();
    let arity = h.arity();
    let n = MTreePath::<H>::input_n(arity, height);
    let path = MTreePath::new(h, height, &random_bytes(&mut rng, n * h.digest_size())).unwrap();
    let base = path.proof();
    assert_eq!(base.root(h), path.digest());

    let leaves = (arity as u64).pow((height - 1) as u32);
    let gadget = MTreeGadget::new(h, height).unwrap();
    for index in [0, leaves - 1, rng.gen_range(1..leaves - 1)] {
        let proof = MTreeProof {
            index: index as usize,
            ..base.clone()
        };
        let expected = proof.root(h);
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (leaf, siblings, idx) = alloc_proof(h, &cs, &proof);
        let (root, selectors) = gadget.root(&leaf, &siblings, &idx).unwrap();
        assert_eq!(root.value().unwrap(), expected, "height {height} index {index}");
        assert_eq!(selectors.len(), height - 1);
        assert_satisfied(&cs);
    }
}

#[test]
fn every_height_from_four_to_thirty_one() {
    let h = Mimc256::<Fr>::with_rounds(2);
    for height in 4..=31 {
        deep_path_agrees(&h, height);
    }
}

#[test]
fn deep_quaternary_path() {
    let g = Griffin::<Fr>::new(4, 4, 1).unwrap();
    assert_eq!(g.arity(), 4);
    deep_path_agrees(&g, 16);
}

#[test]
fn deep_sha256_circuit() {
    let digests = random_bytes(&mut rng(), MTreePath::<Sha256>::input_n(2, 16) * 32);
    let path = MTreePath::new(&Sha256, 16, &digests).unwrap();
    let mut proof = path.proof();
    proof.index = (1 << 15) - 1;
    let root = proof.root(&Sha256);
    assert_ne!(root, path.digest());
    let cs = synthesize(MTreeCircuit::new(&Sha256, 16, root, proof));
    assert_satisfied(&cs);
}

#[test]
fn wrong_public_index_is_unsatisfied() {
    let h = Mimc256::<Fr>::with_rounds(10);
    let data = random_bytes(&mut rng(), 8 * 64);
    let tree = MTree::new(&h, 4, &data).unwrap();
    let mut proof = tree.path(3).unwrap();
    let cs = ConstraintSystem::<Fr>::new_ref();
    let (leaf, siblings, _) = alloc_proof(&h, &cs, &proof);
    proof.index = 6;
    let index = FpVar::new_input(cs.clone(), || Ok(Fr::from(proof.index as u64))).unwrap();
    let root = h
        .new_digest(cs.clone(), || Ok(tree.digest()), AllocationMode::Input)
        .unwrap();
    MTreeGadget::new(&h, 4)
        .unwrap()
        .enforce_root(&leaf, &siblings, &index, &root)
        .unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn two_or_zero_active_selectors_fail() {
    let h = &*POSEIDON5_FR381;
    let data = random_bytes(&mut rng(), 4 * 64);
    let tree = MTree::new(h, 3, &data).unwrap();
    let gadget = MTreeGadget::new(h, 3).unwrap();
    for bad in [
        vec![vec![true, true], vec![true, false]],
        vec![vec![true, false], vec![false, false]],
    ] {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (leaf, siblings, index) = alloc_proof(h, &cs, &tree.path(0).unwrap());
        gadget
            .root_with_selectors(&leaf, &siblings, &index, Some(&bad))
            .unwrap();
        assert!(!cs.is_satisfied().unwrap());
        assert!(cs.which_is_unsatisfied().unwrap().is_some());
    }
}

#[test]
#[serial]
fn groth16_membership_proof() {
    let h = Mimc256::<Fr>::with_rounds(20);
    let data = random_bytes(&mut rng(), 8 * 64);
    let tree = MTree::new(&h, 4, &data).unwrap();
    let proof = tree.path(5).unwrap();

    let cs = synthesize(MTreeCircuit::new(&h, 4, tree.digest(), proof.clone()));
    assert_satisfied(&cs);

    let mut rng = rng();
    let (pk, vk) = snark::setup(MTreeCircuit::<Fr, _>::setup(&h, 4), &mut rng).unwrap();
    let groth = snark::prove(&pk, MTreeCircuit::new(&h, 4, tree.digest(), proof), &mut rng).unwrap();

    let inputs = MTreeCircuit::<Fr, Mimc256<Fr>>::public_inputs(&tree.digest(), 5);
    assert_eq!(
        inputs[..1],
        snark::public_inputs_of_digest::<Fr, <Mimc256<Fr> as PermutationGadget<Fr>>::Digest>(
            &tree.digest()
        )[..]
    );
    assert!(snark::verify(&vk, &inputs, &groth).unwrap());
    let wrong = MTreeCircuit::<Fr, Mimc256<Fr>>::public_inputs(&tree.digest(), 4);
    assert!(!snark::verify(&vk, &wrong, &groth).unwrap());
}

#[test]
fn setup_synthesis_needs_no_witness() {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
    MTreeCircuit::<Fr, _>::setup(&Sha256, 3)
        .generate_constraints(cs.clone())
        .unwrap();
    // 256 root bits and the index
    assert_eq!(cs.num_instance_variables(), 1 + 256 + 1);
}
