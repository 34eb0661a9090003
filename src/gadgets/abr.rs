//! ABR (augmented binary radix) membership gadget.
//!
//! Above the first internal layer every node folds in one middle input:
//!
//! ```text
//! P = H(l (+) m, r (+) m) (+) r
//! ```
//!
//! where `(+)` is `hash_add`. A path starts either at a leaf or at a middle
//! input; the entry point is a synthesis-time constant.

use core::marker::PhantomData;

use ark_ff::PrimeField;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use super::PermutationGadget;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbrEntryKind {
    Leaf,
    /// Middle input of a node in combined layer `layer` (0 is the lowest).
    Middle { layer: usize },
}

/// Normalized entry point of an ABR path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbrEntry {
    pub kind: AbrEntryKind,
    /// Height of the subtree whose root path this entry walks.
    pub height: usize,
    /// Index within the entry's own layer.
    pub local: usize,
}

impl AbrEntry {
    /// Number of `(middle, otherx)` pairs a proof for this entry carries.
    pub fn path_len(&self) -> usize {
        match self.kind {
            AbrEntryKind::Leaf => self.height - 2,
            AbrEntryKind::Middle { .. } => self.height - 1,
        }
    }

    pub fn hash_steps(&self) -> usize {
        self.height - 1
    }

    /// Position of the first hashed node within its layer; bit `k` orders
    /// the `k`-th combined step above it.
    pub fn position(&self) -> usize {
        match self.kind {
            AbrEntryKind::Leaf => self.local >> 1,
            AbrEntryKind::Middle { .. } => self.local,
        }
    }

    /// Pairs consumed by the first hash (the middle entry uses `otherx[0]`).
    pub fn first_pairs(&self) -> usize {
        match self.kind {
            AbrEntryKind::Leaf => 0,
            AbrEntryKind::Middle { .. } => 1,
        }
    }
}

/// Map `trans_idx` (leaves first, then middle inputs in creation order) of a
/// height-`height` tree to its entry point.
pub fn locate_entry(trans_idx: usize, height: usize) -> Result<AbrEntry, Error> {
    if !(3..64).contains(&height) {
        return Err(Error::InvalidHeight { height, min: 3, max: 63 });
    }
    let leaves = 1usize << (height - 1);
    let middles = (1usize << (height - 2)) - 1;
    if trans_idx < leaves {
        return Ok(AbrEntry {
            kind: AbrEntryKind::Leaf,
            height,
            local: trans_idx,
        });
    }
    let mut local = trans_idx - leaves;
    if local >= middles {
        return Err(Error::IndexOutOfRange {
            index: trans_idx,
            bound: leaves + middles,
        });
    }
    let mut size = leaves >> 2;
    let mut layer = 0;
    while local >= size {
        local -= size;
        size >>= 1;
        layer += 1;
    }
    Ok(AbrEntry {
        kind: AbrEntryKind::Middle { layer },
        height: height - 1 - layer,
        local,
    })
}

pub struct AbrGadget<'a, F: PrimeField, H: PermutationGadget<F>> {
    hasher: &'a H,
    height: usize,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, H: PermutationGadget<F>> AbrGadget<'a, F, H> {
    pub fn new(hasher: &'a H, height: usize) -> Result<Self, Error> {
        if hasher.arity() != 2 {
            return Err(Error::UnsupportedArity {
                arity: hasher.arity(),
                expected: 2,
            });
        }
        if !(3..64).contains(&height) {
            return Err(Error::InvalidHeight { height, min: 3, max: 63 });
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

    pub fn entry(&self, trans_idx: usize) -> Result<AbrEntry, Error> {
        locate_entry(trans_idx, self.height)
    }

    fn combine(
        &self,
        left: &H::Digest,
        right: &H::Digest,
        middle: &H::Digest,
    ) -> Result<H::Digest, SynthesisError> {
        let block = [
            self.hasher.hash_add_var(left, middle)?,
            self.hasher.hash_add_var(right, middle)?,
        ];
        let h = self.hasher.hash_block_var(&block)?;
        self.hasher.hash_add_var(&h, right)
    }

    /// Root reached from the entry `trans_idx`. `middle` and `otherx` hold
    /// `entry.path_len()` digests each; for a middle entry `otherx[0]` is the
    /// right child of its node, `other` the left child and `middle[0]` unused.
    #[tracing::instrument(target = "r1cs", skip_all, fields(trans_idx = trans_idx))]
    pub fn root(
        &self,
        trans_idx: usize,
        trans: &H::Digest,
        other: &H::Digest,
        middle: &[H::Digest],
        otherx: &[H::Digest],
    ) -> Result<H::Digest, SynthesisError> {
        let entry = self
            .entry(trans_idx)
            .map_err(|_| SynthesisError::Unsatisfiable)?;
        let n = entry.path_len();
        if middle.len() != n || otherx.len() != n {
            return Err(SynthesisError::Unsatisfiable);
        }
        let mut x = match entry.kind {
            AbrEntryKind::Leaf if entry.local & 1 == 1 => {
                self.hasher.hash_block_var(&[other.clone(), trans.clone()])?
            }
            AbrEntryKind::Leaf => self.hasher.hash_block_var(&[trans.clone(), other.clone()])?,
            AbrEntryKind::Middle { .. } => self.combine(other, &otherx[0], trans)?,
        };
        let pos = entry.position();
        let skip = entry.first_pairs();
        for (k, (m, s)) in middle.iter().zip(otherx).skip(skip).enumerate() {
            x = if (pos >> k) & 1 == 1 {
                self.combine(s, &x, m)?
            } else {
                self.combine(&x, s, m)?
            };
        }
        tracing::debug!(
            target: "r1cs",
            ?entry,
            constraints = x.cs().num_constraints(),
            "abr path synthesized"
        );
        Ok(x)
    }

    pub fn enforce_root(
        &self,
        trans_idx: usize,
        trans: &H::Digest,
        other: &H::Digest,
        middle: &[H::Digest],
        otherx: &[H::Digest],
        root: &H::Digest,
    ) -> Result<(), SynthesisError> {
        self.root(trans_idx, trans, other, middle, otherx)?
            .enforce_equal(root)
    }
}
