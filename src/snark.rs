//! Groth16 over BLS12-381 for the tree circuits.

use ark_bls12_381::{Bls12_381, Fr};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::digest::DigestVar;
use crate::error::Result;

pub type Curve = Bls12_381;

/// Circuit-specific keys. `circuit` is typically the witness-free `setup`
/// instance of one of the `circuits` types.
pub fn setup<C, R>(circuit: C, rng: &mut R) -> Result<(ProvingKey<Curve>, VerifyingKey<Curve>)>
where
    C: ConstraintSynthesizer<Fr>,
    R: RngCore + CryptoRng,
{
    let keys = Groth16::<Curve>::circuit_specific_setup(circuit, rng)?;
    tracing::debug!(
        public_inputs = keys.1.gamma_abc_g1.len() - 1,
        "groth16 keys generated"
    );
    Ok(keys)
}

pub fn prove<C, R>(pk: &ProvingKey<Curve>, circuit: C, rng: &mut R) -> Result<Proof<Curve>>
where
    C: ConstraintSynthesizer<Fr>,
    R: RngCore + CryptoRng,
{
    Ok(Groth16::<Curve>::prove(pk, circuit, rng)?)
}

pub fn verify(vk: &VerifyingKey<Curve>, public_inputs: &[Fr], proof: &Proof<Curve>) -> Result<bool> {
    let pvk = Groth16::<Curve>::process_vk(vk)?;
    Ok(Groth16::<Curve>::verify_with_processed_vk(&pvk, public_inputs, proof)?)
}

/// Public inputs of a digest allocated with `AllocationMode::Input`.
pub fn public_inputs_of_digest<F: PrimeField, D: DigestVar<F>>(bytes: &[u8]) -> Vec<F> {
    D::public_inputs(bytes)
}
