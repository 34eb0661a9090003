//! Fixed-height ABR tree.
//!
//! Arena layout: `2^(h-1)` leaves, then `2^(h-2) - 1` middle inputs, then the
//! first internal layer `H(l, r)`, then the combined layers
//! `H(l (+) m, r (+) m) (+) r` up to the root. Combined node `k` (in creation
//! order) folds in middle input `k`.

use core::fmt;

use rayon::prelude::*;

use super::{check_arity, check_size, fmt_subtree, hash_blocks, Node};
use crate::error::{Error, Result};
use crate::gadgets::abr::{locate_entry, AbrEntryKind};
use crate::hash::Permutation;

/// Witness of one ABR path; see `AbrGadget::root` for the roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbrProof {
    pub trans_idx: usize,
    pub trans: Vec<u8>,
    pub other: Vec<u8>,
    pub middle: Vec<Vec<u8>>,
    pub otherx: Vec<Vec<u8>>,
}

pub(crate) fn abr_combine<H: Permutation>(hasher: &H, l: &[u8], r: &[u8], m: &[u8]) -> Vec<u8> {
    let n = hasher.digest_size();
    let mut block = [l, r].concat();
    hasher.hash_add(&mut block[..n], m);
    hasher.hash_add(&mut block[n..], m);
    let mut out = hasher.hash(&block);
    hasher.hash_add(&mut out, r);
    out
}

impl AbrProof {
    /// Recompute the root outside the circuit.
    pub fn root<H: Permutation>(&self, hasher: &H, height: usize) -> Result<Vec<u8>> {
        let entry = locate_entry(self.trans_idx, height)?;
        let n = entry.path_len();
        if self.middle.len() != n || self.otherx.len() != n {
            return Err(Error::BadInputSize {
                expected: n,
                actual: self.middle.len().min(self.otherx.len()),
            });
        }
        let mut x = match entry.kind {
            AbrEntryKind::Leaf if entry.local & 1 == 1 => hasher.hash(&[self.other.as_slice(), self.trans.as_slice()].concat()),
            AbrEntryKind::Leaf => hasher.hash(&[self.trans.as_slice(), self.other.as_slice()].concat()),
            AbrEntryKind::Middle { .. } => abr_combine(hasher, &self.other, &self.otherx[0], &self.trans),
        };
        let pos = entry.position();
        for (k, (m, s)) in self
            .middle
            .iter()
            .zip(&self.otherx)
            .skip(entry.first_pairs())
            .enumerate()
        {
            x = if (pos >> k) & 1 == 1 {
                abr_combine(hasher, s, &x, m)
            } else {
                abr_combine(hasher, &x, s, m)
            };
        }
        Ok(x)
    }
}

pub struct FixedAbr<'a, H: Permutation> {
    hasher: &'a H,
    height: usize,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> FixedAbr<'a, H> {
    pub fn leaves_n(height: usize) -> usize {
        1 << (height - 1)
    }

    pub fn middles_n(height: usize) -> usize {
        (1 << (height - 2)) - 1
    }

    /// Input blocks: leaves then middles.
    pub fn input_n(height: usize) -> usize {
        Self::leaves_n(height) + Self::middles_n(height)
    }

    pub fn new(hasher: &'a H, height: usize, data: &[u8]) -> Result<Self> {
        check_arity(hasher, true)?;
        if !(3..64).contains(&height) {
            return Err(Error::InvalidHeight { height, min: 3, max: 63 });
        }
        let leaves = Self::leaves_n(height);
        let input_n = Self::input_n(height);
        check_size("FixedAbr", input_n * hasher.block_size(), data.len())?;

        let mut depth = height - 1;
        let mut nodes: Vec<Node> = hash_blocks(hasher, data)
            .into_iter()
            .map(|digest| Node {
                digest,
                depth,
                ..Default::default()
            })
            .collect();

        // first internal layer: plain two-to-one hashes
        depth -= 1;
        let first: Vec<Vec<u8>> = nodes[..leaves]
            .par_chunks(2)
            .map(|pair| hasher.hash(&[pair[0].digest.as_slice(), pair[1].digest.as_slice()].concat()))
            .collect();
        for (j, digest) in first.into_iter().enumerate() {
            let idx = nodes.len();
            nodes[2 * j].parent = Some(idx);
            nodes[2 * j + 1].parent = Some(idx);
            nodes.push(Node {
                digest,
                children: vec![2 * j, 2 * j + 1],
                depth,
                ..Default::default()
            });
        }

        let mut start = input_n;
        let mut len = leaves / 2;
        let mut middle = leaves;
        while depth > 0 {
            depth -= 1;
            let iters = len / 2;
            let layer: Vec<Vec<u8>> = (0..iters)
                .into_par_iter()
                .map(|j| {
                    let (l, r) = (&nodes[start + 2 * j], &nodes[start + 2 * j + 1]);
                    abr_combine(hasher, &l.digest, &r.digest, &nodes[middle + j].digest)
                })
                .collect();
            for (j, digest) in layer.into_iter().enumerate() {
                let idx = nodes.len();
                let (l, r, m) = (start + 2 * j, start + 2 * j + 1, middle + j);
                for c in [l, r, m] {
                    nodes[c].parent = Some(idx);
                }
                nodes[m].depth = depth + 1;
                nodes.push(Node {
                    digest,
                    parent: None,
                    children: vec![l, r],
                    middle: Some(m),
                    depth,
                });
            }
            start += len;
            len = iters;
            middle += iters;
        }
        tracing::debug!(height, nodes = nodes.len(), "fixed abr built");
        Ok(Self {
            hasher,
            height,
            nodes,
        })
    }

    pub fn height(&self) -> usize {
        self.height
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

    pub fn hasher(&self) -> &H {
        self.hasher
    }

    fn sibling(&self, node: usize, parent: usize) -> usize {
        let c = &self.nodes[parent].children;
        if c[0] == node {
            c[1]
        } else {
            c[0]
        }
    }

    /// Witness for entry `trans_idx` (a leaf, or `leaves_n + k` for middle
    /// input `k`).
    pub fn path(&self, trans_idx: usize) -> Result<AbrProof> {
        let entry = locate_entry(trans_idx, self.height)?;
        let digest = |i: usize| self.nodes[i].digest.clone();
        let mut middle = Vec::with_capacity(entry.path_len());
        let mut otherx = Vec::with_capacity(entry.path_len());

        let (other, mut cur) = match entry.kind {
            AbrEntryKind::Leaf => {
                let p = self.nodes[trans_idx].parent.ok_or(Error::IndexOutOfRange {
                    index: trans_idx,
                    bound: self.nodes.len(),
                })?;
                (digest(self.sibling(trans_idx, p)), p)
            }
            AbrEntryKind::Middle { .. } => {
                let p = self.nodes[trans_idx].parent.ok_or(Error::IndexOutOfRange {
                    index: trans_idx,
                    bound: self.nodes.len(),
                })?;
                let c = &self.nodes[p].children;
                middle.push(digest(trans_idx));
                otherx.push(digest(c[1]));
                (digest(c[0]), p)
            }
        };
        while let Some(p) = self.nodes[cur].parent {
            // the middle input of `p` is never on this walk
            let m = self.nodes[p].middle.ok_or(Error::IndexOutOfRange {
                index: p,
                bound: self.nodes.len(),
            })?;
            middle.push(digest(m));
            otherx.push(digest(self.sibling(cur, p)));
            cur = p;
        }
        Ok(AbrProof {
            trans_idx,
            trans: digest(trans_idx),
            other,
            middle,
            otherx,
        })
    }
}

impl<H: Permutation> fmt::Display for FixedAbr<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes.len() {
            0 => Ok(()),
            n => fmt_subtree(&self.nodes, n - 1, f),
        }
    }
}

/// The leaf-0 path of a fixed ABR tree built from raw digests: the two
/// leaves, then one `(middle, right sibling)` pair per combined layer. The
/// path node is always the left child.
pub struct FixedAbrPath<'a, H: Permutation> {
    hasher: &'a H,
    height: usize,
    nodes: Vec<Node>,
}

impl<'a, H: Permutation> FixedAbrPath<'a, H> {
    pub fn input_n(height: usize) -> usize {
        2 * (height - 1)
    }

    pub fn new(hasher: &'a H, height: usize, digests: &[u8]) -> Result<Self> {
        check_arity(hasher, true)?;
        if !(3..64).contains(&height) {
            return Err(Error::InvalidHeight { height, min: 3, max: 63 });
        }
        check_size(
            "FixedAbrPath",
            Self::input_n(height) * hasher.digest_size(),
            digests.len(),
        )?;

        let mut input = digests
            .chunks_exact(hasher.digest_size())
            .map(<[u8]>::to_vec);
        let mut next = || input.next().unwrap_or_default();
        let mut depth = height - 1;
        let mut nodes = Vec::with_capacity(3 * (height - 1));
        nodes.push(Node::input(next(), depth));
        nodes.push(Node::input(next(), depth));

        depth -= 1;
        let first = hasher.hash(&[nodes[0].digest.as_slice(), nodes[1].digest.as_slice()].concat());
        nodes[0].parent = Some(2);
        nodes[1].parent = Some(2);
        nodes.push(Node {
            digest: first,
            children: vec![0, 1],
            depth,
            ..Default::default()
        });

        while depth > 0 {
            depth -= 1;
            let l = nodes.len() - 1;
            let (m, r) = (l + 1, l + 2);
            nodes.push(Node::input(next(), depth + 1));
            nodes.push(Node::input(next(), depth + 1));
            let digest = abr_combine(hasher, &nodes[l].digest, &nodes[r].digest, &nodes[m].digest);
            let idx = nodes.len();
            for c in [l, m, r] {
                nodes[c].parent = Some(idx);
            }
            nodes.push(Node {
                digest,
                parent: None,
                children: vec![l, r],
                middle: Some(m),
                depth,
            });
        }
        tracing::debug!(height, nodes = nodes.len(), "fixed abr path built");
        Ok(Self {
            hasher,
            height,
            nodes,
        })
    }

    pub fn height(&self) -> usize {
        self.height
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

    pub fn hasher(&self) -> &H {
        self.hasher
    }

    /// The path as the proof of entry 0.
    pub fn proof(&self) -> AbrProof {
        let digest = |i: usize| self.nodes[i].digest.clone();
        let pairs = self.height - 2;
        AbrProof {
            trans_idx: 0,
            trans: digest(0),
            other: digest(1),
            middle: (0..pairs).map(|k| digest(3 * k + 3)).collect(),
            otherx: (0..pairs).map(|k| digest(3 * k + 4)).collect(),
        }
    }
}

impl<H: Permutation> fmt::Display for FixedAbrPath<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes.len() {
            0 => Ok(()),
            n => fmt_subtree(&self.nodes, n - 1, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Mimc512F, Sha256, Sha512};
    use ark_bls12_381::Fr;

    #[test]
    fn layout_and_depths() {
        let data = vec![0u8; FixedAbr::<Sha256>::input_n(4) * 64];
        let tree = FixedAbr::new(&Sha256, 4, &data).unwrap();
        // 8 leaves, 3 middles, 4 + 2 + 1 internal
        assert_eq!(tree.nodes_n(), 15 + 3);
        let root = tree.node(17).unwrap();
        assert_eq!((root.depth, root.middle), (0, Some(10)));
        assert_eq!(tree.node(10).unwrap().depth, 1);
        assert_eq!(tree.node(8).unwrap().parent, Some(15));
        assert_eq!(tree.node(15).unwrap().children, vec![11, 12]);
        assert_eq!(tree.node(0).unwrap().depth, 3);
    }

    #[test]
    fn sha_zero_data_roots() {
        let data = vec![0u8; FixedAbr::<Sha256>::input_n(4) * 64];
        assert_eq!(
            hex::encode(FixedAbr::new(&Sha256, 4, &data).unwrap().digest()),
            "e54f319bda1edc07b45f34a5b6452a2c75bee8332a65ecf5c1803534b9b6e372"
        );

        let data = vec![0u8; FixedAbr::<Sha512>::input_n(4) * 128];
        assert_eq!(
            hex::encode(FixedAbr::new(&Sha512, 4, &data).unwrap().digest()),
            "8eb195cebaf15f4a0c277829505d9b4eedf0d0167183fea9ee74ec93eab6192f\
             37d8857b5d8ba5573300357b92142c906eb9b4ffa6f0297f8c538b81865fef0d"
        );
    }

    #[test]
    fn every_proof_recomputes_the_root() {
        let h = Mimc512F::<Fr>::with_rounds(3);
        let n = FixedAbr::<Mimc512F<Fr>>::input_n(5);
        let data: Vec<u8> = (0..n * 128).map(|i| (i % 199) as u8).collect();
        let tree = FixedAbr::new(&h, 5, &data).unwrap();
        for idx in 0..n {
            let proof = tree.path(idx).unwrap();
            assert_eq!(proof.root(&h, 5).unwrap(), tree.digest(), "entry {idx}");
        }
        assert!(tree.path(n).is_err());
    }

    fn path_digests(proof: &AbrProof) -> Vec<u8> {
        let mut out = [proof.trans.as_slice(), proof.other.as_slice()].concat();
        for (m, s) in proof.middle.iter().zip(&proof.otherx) {
            out.extend_from_slice(m);
            out.extend_from_slice(s);
        }
        out
    }

    #[test]
    fn single_path_matches_the_full_tree() {
        let h = Mimc512F::<Fr>::with_rounds(3);
        let n = FixedAbr::<Mimc512F<Fr>>::input_n(5);
        let data: Vec<u8> = (0..n * 128).map(|i| (i % 211) as u8).collect();
        let tree = FixedAbr::new(&h, 5, &data).unwrap();
        let proof = tree.path(0).unwrap();

        let path = FixedAbrPath::new(&h, 5, &path_digests(&proof)).unwrap();
        assert_eq!(path.nodes_n(), 12);
        assert_eq!(path.digest(), tree.digest());
        assert_eq!(path.proof(), proof);
        let root = path.node(11).unwrap();
        assert_eq!((root.depth, root.middle, root.children.clone()), (0, Some(9), vec![8, 10]));
        assert_eq!(path.node(9).unwrap().depth, 1);
    }

    #[test]
    fn single_path_sha256_zero_vector() {
        let data = vec![0u8; FixedAbr::<Sha256>::input_n(4) * 64];
        let tree = FixedAbr::new(&Sha256, 4, &data).unwrap();
        let path = FixedAbrPath::new(&Sha256, 4, &path_digests(&tree.path(0).unwrap())).unwrap();
        assert!(path.to_string().starts_with("*: e54f319b"));
        assert!(matches!(
            FixedAbrPath::new(&Sha256, 4, &[0u8; 32]),
            Err(Error::BadInputSize { expected: 192, actual: 32 })
        ));
        assert!(FixedAbrPath::new(&Sha256, 2, &[0u8; 64]).is_err());
    }

    #[test]
    fn rejects_short_trees_and_bad_sizes() {
        assert!(matches!(
            FixedAbr::new(&Sha256, 2, &[0u8; 128]),
            Err(Error::InvalidHeight { height: 2, min: 3, max: 63 })
        ));
        assert!(matches!(
            FixedAbr::new(&Sha256, 3, &[0u8; 64]),
            Err(Error::BadInputSize { expected: 320, actual: 64 })
        ));
    }
}
