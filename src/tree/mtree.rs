//! Complete `arity`-ary Merkle tree and its single-path variant.

use core::fmt;

use super::{
    build_path, build_radix, check_arity, check_size, fmt_subtree, hash_blocks, max_levels, Node,
};
use crate::error::{Error, Result};
use crate::hash::Permutation;

/// Authentication path of one leaf. `siblings[level]` lists every child of
/// that level's parent in slot order, including the path node itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MTreeProof {
    pub leaf: Vec<u8>,
    pub siblings: Vec<Vec<Vec<u8>>>,
    pub index: usize,
}

impl MTreeProof {
    /// Recompute the root outside the circuit.
    pub fn root<H: Permutation>(&self, hasher: &H) -> Vec<u8> {
        let arity = hasher.arity();
        let mut prev = self.leaf.clone();
        let mut idx = self.index;
        for level in &self.siblings {
            let slot = idx % arity;
            idx /= arity;
            let block: Vec<u8> = level
                .iter()
                .enumerate()
                .flat_map(|(j, d)| if j == slot { prev.clone() } else { d.clone() })
                .collect();
            prev = hasher.hash(&block);
        }
        prev
    }
}

pub(crate) fn leaves_for(arity: usize, height: usize) -> Result<usize> {
    let max = max_levels(arity) + 1;
    if height == 0 || height > max {
        return Err(Error::InvalidHeight { height, min: 1, max });
    }
    u32::try_from(height - 1)
        .ok()
        .and_then(|e| arity.checked_pow(e))
        .ok_or(Error::InvalidHeight { height, min: 1, max })
}

pub struct MTree<'a, H: Permutation> {
    hasher: &'a H,
    height: usize,
    arity: usize,
    leaves: usize,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> MTree<'a, H> {
    /// Hash every `block_size()` block of `data` into a leaf and build the
    /// tree above them. `data` must hold exactly `arity^(height-1)` blocks.
    pub fn new(hasher: &'a H, height: usize, data: &[u8]) -> Result<Self> {
        let arity = check_arity(hasher, false)?;
        let leaves = leaves_for(arity, height)?;
        check_size("MTree", leaves * hasher.block_size(), data.len())?;
        let nodes = build_radix(hasher, arity, height, hash_blocks(hasher, data));
        tracing::debug!(height, arity, nodes = nodes.len(), "mtree built");
        Ok(Self {
            hasher,
            height,
            arity,
            leaves,
            nodes,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn leaves_n(&self) -> usize {
        self.leaves
    }

    pub fn nodes_n(&self) -> usize {
        self.nodes.len()
    }

    pub fn digest(&self) -> Vec<u8> {
        self.nodes.last().map(|n| n.digest.clone()).unwrap_or_default()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    /// Leaf position of arena node `i`, if it is a leaf.
    pub fn leaf_index_of(&self, i: usize) -> Option<usize> {
        (i < self.leaves).then_some(i)
    }

    pub fn hasher(&self) -> &H {
        self.hasher
    }

    pub fn path(&self, idx: usize) -> Result<MTreeProof> {
        if idx >= self.leaves {
            return Err(Error::IndexOutOfRange {
                index: idx,
                bound: self.leaves,
            });
        }
        let mut siblings = Vec::with_capacity(self.height - 1);
        let mut cur = idx;
        while let Some(p) = self.nodes[cur].parent {
            siblings.push(
                self.nodes[p]
                    .children
                    .iter()
                    .map(|&c| self.nodes[c].digest.clone())
                    .collect(),
            );
            cur = p;
        }
        Ok(MTreeProof {
            leaf: self.nodes[idx].digest.clone(),
            siblings,
            index: idx,
        })
    }
}

impl<H: Permutation> fmt::Display for MTree<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes.len() {
            0 => write!(f, "*:"),
            n => fmt_subtree(&self.nodes, n - 1, f),
        }
    }
}

/// One root-to-leaf path built from raw digests: the path digest, then
/// `arity - 1` sibling digests per level. The path node is always slot 0.
pub struct MTreePath<'a, H: Permutation> {
    hasher: &'a H,
    height: usize,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> MTreePath<'a, H> {
    pub fn input_n(arity: usize, height: usize) -> usize {
        1 + (arity - 1) * (height - 1)
    }

    pub fn new(hasher: &'a H, height: usize, digests: &[u8]) -> Result<Self> {
        let arity = check_arity(hasher, false)?;
        if height == 0 {
            return Err(Error::InvalidHeight {
                height,
                min: 1,
                max: usize::MAX,
            });
        }
        check_size(
            "MTreePath",
            Self::input_n(arity, height) * hasher.digest_size(),
            digests.len(),
        )?;
        let nodes = build_path(hasher, arity, height, digests);
        Ok(Self {
            hasher,
            height,
            nodes,
        })
    }

    pub fn digest(&self) -> Vec<u8> {
        self.nodes.last().map(|n| n.digest.clone()).unwrap_or_default()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    pub fn nodes_n(&self) -> usize {
        self.nodes.len()
    }

    /// The path as a leaf-0 proof.
    pub fn proof(&self) -> MTreeProof {
        let arity = self.hasher.arity();
        let siblings = (1..self.height)
            .map(|i| {
                let first = (i - 1) * arity;
                self.nodes[first..first + arity]
                    .iter()
                    .map(|n| n.digest.clone())
                    .collect()
            })
            .collect();
        MTreeProof {
            leaf: self.nodes[0].digest.clone(),
            siblings,
            index: 0,
        }
    }
}
