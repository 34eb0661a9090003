//! Shared fixtures for the gadget integration tests.
#![allow(dead_code)]

use ark_bls12_381::Fr;
use ark_relations::r1cs::{
    ConstraintLayer, ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef,
};
use ark_std::rand::{rngs::StdRng, RngCore, SeedableRng};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x6d74_7265_6500)
}

/// Random bytes whose 32-byte chunks are canonical BLS12-381 Fr encodings.
pub fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    rng.fill_bytes(&mut out);
    for chunk in out.chunks_mut(32) {
        chunk[0] &= 0x3f;
    }
    out
}

/// Synthesize under a `ConstraintLayer` so failures name the gadget.
pub fn synthesize<C: ConstraintSynthesizer<Fr>>(circuit: C) -> ConstraintSystemRef<Fr> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    let subscriber = Registry::default().with(ConstraintLayer::default());
    tracing::subscriber::with_default(subscriber, || {
        circuit
            .generate_constraints(cs.clone())
            .expect("generate constraints");
    });
    cs
}

pub fn assert_satisfied(cs: &ConstraintSystemRef<Fr>) {
    let ok = cs.is_satisfied().unwrap_or(false);
    if !ok {
        eprintln!("First failing constraint: {:?}", cs.which_is_unsatisfied());
    }
    assert!(ok, "circuit must be satisfied");
}
