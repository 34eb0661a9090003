//! Plain reference trees. They produce the witnesses and the expected roots
//! the gadgets are checked against.
//!
//! Every tree keeps its nodes in one flat arena; links are arena indices.

use core::fmt;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::hash::Permutation;

pub mod fixed_abr;
pub mod fixed_mtree;
pub mod mtree;

pub use fixed_abr::{AbrProof, FixedAbr, FixedAbrPath};
pub use fixed_mtree::{FixedMTree, FixedMTreePath, FixedMTreeProof};
pub use mtree::{MTree, MTreePath, MTreeProof};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub digest: Vec<u8>,
    pub parent: Option<usize>,
    /// `arity` children for radix nodes, `[left, right]` for ABR nodes.
    pub children: Vec<usize>,
    /// ABR only: the middle input folded into this node.
    pub middle: Option<usize>,
    pub depth: usize,
}

impl Node {
    fn input(digest: Vec<u8>, depth: usize) -> Self {
        Self {
            digest,
            depth,
            ..Default::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

pub(crate) fn check_size(tree: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        tracing::warn!(tree, expected, actual, "bad size of input data");
        return Err(Error::BadInputSize { expected, actual });
    }
    Ok(())
}

pub(crate) fn check_arity<H: Permutation>(hasher: &H, binary: bool) -> Result<usize> {
    let arity = hasher.arity();
    if arity < 2 || (binary && arity != 2) {
        return Err(Error::UnsupportedArity { arity, expected: 2 });
    }
    Ok(arity)
}

/// Largest `levels` with `arity^levels` representable in a `u64`.
pub(crate) fn max_levels(arity: usize) -> usize {
    if arity < 2 {
        return 0;
    }
    let mut levels = 0;
    let mut acc = 1u64;
    while let Some(next) = acc.checked_mul(arity as u64) {
        acc = next;
        levels += 1;
    }
    levels
}

/// `H(block)` for every block of `data`.
pub(crate) fn hash_blocks<H: Permutation>(hasher: &H, data: &[u8]) -> Vec<Vec<u8>> {
    data.par_chunks(hasher.block_size())
        .map(|block| hasher.hash(block))
        .collect()
}

/// Complete radix tree over `leaves`: leaves first, then each layer, root last.
pub(crate) fn build_radix<H: Permutation>(
    hasher: &H,
    arity: usize,
    height: usize,
    leaves: Vec<Vec<u8>>,
) -> Vec<Node> {
    let mut depth = height - 1;
    let mut nodes: Vec<Node> = leaves.into_iter().map(|d| Node::input(d, depth)).collect();
    let mut start = 0;
    while depth > 0 {
        depth -= 1;
        let end = nodes.len();
        let digests: Vec<Vec<u8>> = nodes[start..end]
            .par_chunks(arity)
            .map(|group| {
                let block: Vec<u8> = group.iter().flat_map(|n| n.digest.iter().copied()).collect();
                hasher.hash(&block)
            })
            .collect();
        for (j, digest) in digests.into_iter().enumerate() {
            let idx = nodes.len();
            let children: Vec<usize> = (0..arity).map(|k| start + j * arity + k).collect();
            for &c in &children {
                nodes[c].parent = Some(idx);
            }
            nodes.push(Node {
                digest,
                parent: None,
                children,
                middle: None,
                depth,
            });
        }
        start = end;
    }
    nodes
}

/// Single-path tree: slot 0 of every level is the path node, the other
/// `arity - 1` slots are taken from `digests` in order.
pub(crate) fn build_path<H: Permutation>(
    hasher: &H,
    arity: usize,
    height: usize,
    digests: &[u8],
) -> Vec<Node> {
    let size = hasher.digest_size();
    let mut input = digests.chunks_exact(size).map(<[u8]>::to_vec);
    let mut depth = height - 1;
    let mut nodes = Vec::with_capacity(arity * (height - 1) + 1);
    nodes.push(Node::input(input.next().unwrap_or_default(), depth));
    for i in 1..height {
        let first = (i - 1) * arity;
        nodes.extend((1..arity).map(|_| Node::input(input.next().unwrap_or_default(), depth)));
        depth -= 1;
        let block: Vec<u8> = nodes[first..first + arity]
            .iter()
            .flat_map(|n| n.digest.iter().copied())
            .collect();
        let idx = nodes.len();
        for n in &mut nodes[first..first + arity] {
            n.parent = Some(idx);
        }
        nodes.push(Node {
            digest: hasher.hash(&block),
            parent: None,
            children: (first..first + arity).collect(),
            middle: None,
            depth,
        });
    }
    nodes
}

/// Indented dump of the subtree under `idx`, one node per line.
pub(crate) fn fmt_subtree(
    nodes: &[Node],
    idx: usize,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let node = &nodes[idx];
    let tag = match node.parent.map(|p| &nodes[p]) {
        None => '*',
        Some(p) if p.middle == Some(idx) => 'M',
        Some(p) if p.children.len() == 2 && p.children[0] == idx => 'L',
        Some(p) if p.children.len() == 2 => 'R',
        Some(_) => '-',
    };
    writeln!(f, "{:indent$}{}: {}", "", tag, hex::encode(&node.digest), indent = 4 * node.depth)?;
    let (left, rest) = node.children.split_first().map_or((None, &[][..]), |(l, r)| (Some(*l), r));
    if let Some(l) = left {
        fmt_subtree(nodes, l, f)?;
    }
    if let Some(m) = node.middle {
        fmt_subtree(nodes, m, f)?;
    }
    for &c in rest {
        fmt_subtree(nodes, c, f)?;
    }
    Ok(())
}
