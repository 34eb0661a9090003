//! Plain (out-of-circuit) permutations.
//!
//! Every primitive hashes exactly one block of `block_size()` bytes into one
//! digest of `digest_size()` bytes. Trees use `arity() = block / digest`
//! children per node, and ABR trees aggregate digests with `hash_add`.

use ark_ff::PrimeField;

use crate::field_utils::{fe_from_be_bytes, fe_to_be_bytes, field_bytes};

pub mod arion;
pub mod griffin;
pub mod mimc;
pub mod poseidon5;
pub mod sha;

pub use arion::{Arion, ArionParams};
pub use griffin::{Griffin, GriffinParams};
pub use mimc::{Mimc256, Mimc512F, MimcParams};
pub use poseidon5::{Poseidon5, Poseidon5Params};
pub use sha::{Sha256, Sha512};

pub trait Permutation: Send + Sync {
    fn rate(&self) -> usize;
    fn capacity(&self) -> usize;
    fn digest_size(&self) -> usize;
    fn block_size(&self) -> usize;

    fn arity(&self) -> usize {
        self.block_size() / self.digest_size()
    }

    /// Hash one `block_size()` block into `digest[..digest_size()]`.
    fn hash_oneblock(&self, digest: &mut [u8], block: &[u8]);

    /// Digest aggregation used by ABR nodes: `x <- x (+) y`.
    fn hash_add(&self, x: &mut [u8], y: &[u8]);

    fn hash(&self, block: &[u8]) -> Vec<u8> {
        let mut digest = vec![0u8; self.digest_size()];
        self.hash_oneblock(&mut digest, block);
        digest
    }
}

/// Split a byte block into big-endian field words.
pub(crate) fn block_to_words<F: PrimeField>(block: &[u8], words: usize) -> Vec<F> {
    let n = field_bytes::<F>();
    block
        .chunks_exact(n)
        .take(words)
        .map(fe_from_be_bytes::<F>)
        .collect()
}

pub(crate) fn words_to_digest<F: PrimeField>(words: &[F], digest: &mut [u8]) {
    let n = field_bytes::<F>();
    for (w, out) in words.iter().zip(digest.chunks_exact_mut(n)) {
        fe_to_be_bytes(w, out);
    }
}

/// Word-wise field addition of two digests.
pub(crate) fn field_hash_add<F: PrimeField>(x: &mut [u8], y: &[u8]) {
    let n = field_bytes::<F>();
    for (xc, yc) in x.chunks_exact_mut(n).zip(y.chunks_exact(n)) {
        let sum = fe_from_be_bytes::<F>(xc) + fe_from_be_bytes::<F>(yc);
        fe_to_be_bytes(&sum, xc);
    }
}

/// Dense matrix-vector product `m * x`.
pub(crate) fn mat_vec<F: PrimeField>(m: &[Vec<F>], x: &[F]) -> Vec<F> {
    m.iter()
        .map(|row| row.iter().zip(x).map(|(a, b)| *a * b).sum())
        .collect()
}

/// Circulant matrix with `m[i][k] = first_row[(k - i) mod n]`.
pub(crate) fn circulant<F: PrimeField>(first_row: &[u64]) -> Vec<Vec<F>> {
    let n = first_row.len();
    (0..n)
        .map(|i| (0..n).map(|k| F::from(first_row[(k + n - i) % n])).collect())
        .collect()
}
