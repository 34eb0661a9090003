//! Plain permutations against their gadgets, on random blocks.

mod helpers;

use ark_bls12_381::Fr;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::ConstraintSystem;
use helpers::{random_bytes, rng};
use mtree_gadgets::hash::arion::{ARION_FR381, ARION_V2_FR381};
use mtree_gadgets::hash::griffin::GRIFFIN_FR381;
use mtree_gadgets::hash::mimc::{MIMC256_FR381, MIMC512F_FR381};
use mtree_gadgets::hash::poseidon5::POSEIDON5_FR381;
use mtree_gadgets::{Griffin, Permutation, PermutationGadget, Sha256, Sha512};

/// Random blocks checked per permutation.
const BLOCKS: usize = 100;

fn gadget_agrees<H: PermutationGadget<Fr>>(h: &H, name: &str) {
    let mut rng = rng();
    for _ in 0..BLOCKS {
        let block = random_bytes(&mut rng, h.block_size());
        let cs = ConstraintSystem::<Fr>::new_ref();
        let parts = block
            .chunks(h.digest_size())
            .map(|c| {
                h.new_digest(cs.clone(), || Ok(c.to_vec()), AllocationMode::Witness)
                    .unwrap()
            })
            .collect::<Vec<_>>();
        assert_eq!(parts.len(), h.arity());
        let out = h.hash_block_var(&parts).unwrap();
        assert_eq!(out.value().unwrap(), h.hash(&block), "{name}");
        assert!(cs.is_satisfied().unwrap(), "{name}");
        assert!(cs.num_constraints() > 0, "{name}");
    }
}

#[test]
fn mimc_gadgets_match_plain() {
    gadget_agrees(&*MIMC256_FR381, "mimc256");
    gadget_agrees(&*MIMC512F_FR381, "mimc512f");
}

#[test]
fn griffin_gadget_matches_plain() {
    gadget_agrees(&*GRIFFIN_FR381, "griffin");
}

#[test]
fn poseidon5_gadget_matches_plain() {
    gadget_agrees(&*POSEIDON5_FR381, "poseidon5");
}

#[test]
fn arion_gadgets_match_plain() {
    gadget_agrees(&*ARION_FR381, "arion");
    gadget_agrees(&*ARION_V2_FR381, "arion v2");
}

#[test]
fn wide_griffin_matches_plain() {
    let g = Griffin::<Fr>::new(4, 4, 12).unwrap();
    assert_eq!(g.arity(), 4);
    gadget_agrees(&g, "griffin t=8");
}

#[test]
fn sha256_gadget_matches_plain() {
    gadget_agrees(&Sha256, "sha256");
}

#[test]
fn sha512_gadget_matches_plain() {
    gadget_agrees(&Sha512, "sha512");
}

#[test]
fn sha_compression_vectors() {
    let mut block = [0u8; 64];
    block[0] = 0x80;
    assert_eq!(
        hex::encode(Sha256.hash(&block)),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    let mut block = [0u8; 128];
    block[0] = 0x80;
    assert_eq!(
        hex::encode(Sha512.hash(&block)),
        "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
         47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
    );
}

#[test]
fn parameters_are_fixed_across_instances() {
    let block = random_bytes(&mut rng(), 64);
    let fresh = mtree_gadgets::Mimc256::<Fr>::default();
    assert_eq!(fresh.hash(&block), MIMC256_FR381.hash(&block));
    let fresh = mtree_gadgets::Arion::<Fr>::v2().unwrap();
    assert_eq!(fresh.hash(&block), ARION_V2_FR381.hash(&block));
    assert_ne!(ARION_FR381.hash(&block), POSEIDON5_FR381.hash(&block));
}

#[test]
fn hash_add_matches_digest_combine() {
    let mut rng = rng();
    let x = random_bytes(&mut rng, 32);
    let y = random_bytes(&mut rng, 32);
    let h = &*POSEIDON5_FR381;
    let cs = ConstraintSystem::<Fr>::new_ref();
    let xv = h.new_digest(cs.clone(), || Ok(x.clone()), AllocationMode::Witness).unwrap();
    let yv = h.new_digest(cs.clone(), || Ok(y.clone()), AllocationMode::Witness).unwrap();
    let mut expect = x.clone();
    h.hash_add(&mut expect, &y);
    assert_eq!(h.hash_add_var(&xv, &yv).unwrap().value().unwrap(), expect);
    // one addition row per word
    assert_eq!(cs.num_constraints(), h.digest_size() / 32);
    assert!(cs.is_satisfied().unwrap());
}
