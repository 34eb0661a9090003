//! Binary Merkle tree and its single-path variant.

use core::fmt;

use super::mtree::leaves_for;
use super::{build_path, build_radix, check_arity, check_size, fmt_subtree, hash_blocks, Node};
use crate::error::{Error, Result};
use crate::hash::Permutation;

/// One sibling per level; bit `i` of `index` set means the path node is the
/// right child at level `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedMTreeProof {
    pub leaf: Vec<u8>,
    pub siblings: Vec<Vec<u8>>,
    pub index: usize,
}

impl FixedMTreeProof {
    pub fn root<H: Permutation>(&self, hasher: &H) -> Vec<u8> {
        self.siblings
            .iter()
            .enumerate()
            .fold(self.leaf.clone(), |prev, (i, sib)| {
                let block = if (self.index >> i) & 1 == 1 {
                    [sib.as_slice(), prev.as_slice()].concat()
                } else {
                    [prev.as_slice(), sib.as_slice()].concat()
                };
                hasher.hash(&block)
            })
    }
}

pub struct FixedMTree<'a, H: Permutation> {
    hasher: &'a H,
    height: usize,
    leaves: usize,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> FixedMTree<'a, H> {
    pub fn new(hasher: &'a H, height: usize, data: &[u8]) -> Result<Self> {
        check_arity(hasher, true)?;
        let leaves = leaves_for(2, height)?;
        check_size("FixedMTree", leaves * hasher.block_size(), data.len())?;
        let nodes = build_radix(hasher, 2, height, hash_blocks(hasher, data));
        tracing::debug!(height, nodes = nodes.len(), "fixed mtree built");
        Ok(Self {
            hasher,
            height,
            leaves,
            nodes,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn leaves_n(&self) -> usize {
        self.leaves
    }

    pub fn digest(&self) -> Vec<u8> {
        self.nodes.last().map(|n| n.digest.clone()).unwrap_or_default()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    pub fn hasher(&self) -> &H {
        self.hasher
    }

    pub fn path(&self, idx: usize) -> Result<FixedMTreeProof> {
        if idx >= self.leaves {
            return Err(Error::IndexOutOfRange {
                index: idx,
                bound: self.leaves,
            });
        }
        let mut siblings = Vec::with_capacity(self.height - 1);
        let mut cur = idx;
        while let Some(p) = self.nodes[cur].parent {
            let children = &self.nodes[p].children;
            let sib = if children[0] == cur { children[1] } else { children[0] };
            siblings.push(self.nodes[sib].digest.clone());
            cur = p;
        }
        Ok(FixedMTreeProof {
            leaf: self.nodes[idx].digest.clone(),
            siblings,
            index: idx,
        })
    }
}

impl<H: Permutation> fmt::Display for FixedMTree<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes.len() {
            0 => Ok(()),
            n => fmt_subtree(&self.nodes, n - 1, f),
        }
    }
}

/// `height` raw digests: the path digest, then the right sibling of every
/// level.
pub struct FixedMTreePath<'a, H: Permutation> {
    hasher: &'a H,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> FixedMTreePath<'a, H> {
    pub fn new(hasher: &'a H, height: usize, digests: &[u8]) -> Result<Self> {
        check_arity(hasher, true)?;
        if height == 0 {
            return Err(Error::InvalidHeight {
                height,
                min: 1,
                max: usize::MAX,
            });
        }
        check_size("FixedMTreePath", height * hasher.digest_size(), digests.len())?;
        Ok(Self {
            hasher,
            nodes: build_path(hasher, 2, height, digests),
        })
    }

    pub fn digest(&self) -> Vec<u8> {
        self.nodes.last().map(|n| n.digest.clone()).unwrap_or_default()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    pub fn hasher(&self) -> &H {
        self.hasher
    }

    pub fn proof(&self) -> FixedMTreeProof {
        FixedMTreeProof {
            leaf: self.nodes[0].digest.clone(),
            siblings: self
                .nodes
                .iter()
                .skip(1)
                .step_by(2)
                .map(|n| n.digest.clone())
                .collect(),
            index: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Arion, Griffin, Sha512};
    use ark_bls12_381::Fr;

    #[test]
    fn proofs_recompute_the_root() {
        let h = Arion::<Fr>::new(2, 1, 2, 5).unwrap();
        let data: Vec<u8> = (0..8 * 64).map(|i| (i % 13) as u8).collect();
        let tree = FixedMTree::new(&h, 4, &data).unwrap();
        for idx in 0..8 {
            let proof = tree.path(idx).unwrap();
            assert_eq!(proof.root(&h), tree.digest(), "idx {idx}");
        }
    }

    #[test]
    fn rejects_wide_permutations() {
        let g = Griffin::<Fr>::new(3, 1, 1).unwrap();
        assert!(matches!(
            FixedMTree::new(&g, 2, &[0u8; 192]),
            Err(Error::UnsupportedArity { arity: 3, expected: 2 })
        ));
    }

    #[test]
    fn path_variant_keeps_the_node_on_the_left() {
        let digests: Vec<u8> = (0..3 * 64).map(|i| i as u8).collect();
        let path = FixedMTreePath::new(&Sha512, 3, &digests).unwrap();
        let proof = path.proof();
        assert_eq!(proof.siblings.len(), 2);
        assert_eq!(proof.siblings[1], digests[128..].to_vec());
        assert_eq!(proof.root(&Sha512), path.digest());
        assert_eq!(path.node(2).unwrap().children, vec![0, 1]);
    }
}
