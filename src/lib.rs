//! R1CS Merkle and ABR membership gadgets
//!
//! This crate proves membership in Merkle trees and ABR (augmented binary
//! radix) trees inside Groth16 over BLS12-381, for a family of one-block
//! hash permutations.
//!
//! Layers:
//! - `hash`: plain permutations (MiMC256, MiMC512F, Griffin, Poseidon5, Arion,
//!   SHA-256/512) behind the [`hash::Permutation`] trait
//! - `gadgets`: their R1CS counterparts plus the tree gadgets
//!   ([`MTreeGadget`], [`FixedMTreeGadget`], [`AbrGadget`]) and [`PowGadget`]
//! - `tree`: reference trees that produce witnesses and expected roots
//! - `circuits` / `snark`: `ConstraintSynthesizer` wrappers and Groth16 glue

pub mod circuits;
pub mod digest;
pub mod error;
pub mod field_utils;
pub mod gadgets;
pub mod hash;
pub mod r1cs;
pub mod snark;
pub mod tree;

// Re-exports - Public API
pub use circuits::{AbrCircuit, FixedMTreeCircuit, MTreeCircuit, PowCircuit};
pub use digest::{BitDigestVar, DigestVar, FieldDigestVar};
pub use error::{Error, Result};
pub use gadgets::{
    locate_entry, AbrEntry, AbrEntryKind, AbrGadget, FixedMTreeGadget, MTreeGadget,
    PermutationGadget, PowGadget,
};
pub use hash::{Arion, Griffin, Mimc256, Mimc512F, Permutation, Poseidon5, Sha256, Sha512};
pub use tree::{
    AbrProof, FixedAbr, FixedAbrPath, FixedMTree, FixedMTreePath, FixedMTreeProof, MTree, MTreePath,
    MTreeProof,
};
