//! Namespaced merkle tree.
//!
//! Every node carries the smallest and largest namespace below it next to its
//! digest, so a root commits to which namespaces a row contains:
//!
//! ```text
//! leaf = ns ‖ ns ‖ H(0x00 ‖ leaf_data)
//! node = min ‖ max ‖ H(0x01 ‖ left ‖ right)
//! ```
//!
//! Leaves must start with their namespace and be pushed in namespace order.

use da_square_primitives::{Namespace, NAMESPACE_SIZE, PARITY_SHARES_NAMESPACE};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::{Digest, Sha256};

use crate::{
    error::{ProofError, TreePushError},
    merkle::{split_point, Hash, HASH_SIZE, LEAF_PREFIX, NODE_PREFIX},
};

pub const NAMESPACED_HASH_SIZE: usize = 2 * NAMESPACE_SIZE + HASH_SIZE;

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespacedHash {
    pub min: Namespace,
    pub max: Namespace,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub digest: Hash,
}

impl NamespacedHash {
    /// Root of a tree with no leaves.
    pub fn empty_root() -> Self {
        Self {
            min: Namespace::default(),
            max: Namespace::default(),
            digest: Sha256::digest(b"").into(),
        }
    }

    pub fn to_bytes(&self) -> [u8; NAMESPACED_HASH_SIZE] {
        let mut out = [0u8; NAMESPACED_HASH_SIZE];
        out[..NAMESPACE_SIZE].copy_from_slice(self.min.as_bytes());
        out[NAMESPACE_SIZE..2 * NAMESPACE_SIZE].copy_from_slice(self.max.as_bytes());
        out[2 * NAMESPACE_SIZE..].copy_from_slice(&self.digest);
        out
    }

    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.min <= *namespace && *namespace <= self.max
    }
}

/// SHA-256 based node hasher.
#[derive(Clone, Copy, Debug)]
pub struct NamespacedHasher {
    /// When set, the parity namespace is left out of a node's max unless the
    /// whole subtree is parity. This keeps row roots informative about the
    /// data half.
    ignore_max_namespace: bool,
}

impl NamespacedHasher {
    pub fn new(ignore_max_namespace: bool) -> Self {
        Self {
            ignore_max_namespace,
        }
    }

    /// `leaf` must begin with its namespace.
    pub fn hash_leaf(&self, leaf: &[u8]) -> NamespacedHash {
        let mut id = [0u8; NAMESPACE_SIZE];
        id.copy_from_slice(&leaf[..NAMESPACE_SIZE]);
        let namespace = Namespace::new(id);

        let mut hasher = Sha256::new();
        hasher.update([LEAF_PREFIX]);
        hasher.update(leaf);
        NamespacedHash {
            min: namespace,
            max: namespace,
            digest: hasher.finalize().into(),
        }
    }

    pub fn hash_node(&self, left: &NamespacedHash, right: &NamespacedHash) -> NamespacedHash {
        let min = left.min.min(right.min);
        let max = if self.ignore_max_namespace && left.min == PARITY_SHARES_NAMESPACE {
            PARITY_SHARES_NAMESPACE
        } else if self.ignore_max_namespace && right.min == PARITY_SHARES_NAMESPACE {
            left.max
        } else {
            left.max.max(right.max)
        };

        let mut hasher = Sha256::new();
        hasher.update([NODE_PREFIX]);
        hasher.update(left.to_bytes());
        hasher.update(right.to_bytes());
        NamespacedHash {
            min,
            max,
            digest: hasher.finalize().into(),
        }
    }

    fn root_of(&self, hashes: &[NamespacedHash]) -> NamespacedHash {
        match hashes.len() {
            0 => NamespacedHash::empty_root(),
            1 => hashes[0],
            n => {
                let k = split_point(n);
                let left = self.root_of(&hashes[..k]);
                let right = self.root_of(&hashes[k..]);
                self.hash_node(&left, &right)
            }
        }
    }
}

pub struct NamespaceMerkleTree {
    hasher: NamespacedHasher,
    leaf_hashes: Vec<NamespacedHash>,
}

impl NamespaceMerkleTree {
    pub fn new(ignore_max_namespace: bool) -> Self {
        Self {
            hasher: NamespacedHasher::new(ignore_max_namespace),
            leaf_hashes: vec![],
        }
    }

    pub fn hasher(&self) -> NamespacedHasher {
        self.hasher
    }

    pub fn len(&self) -> usize {
        self.leaf_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_hashes.is_empty()
    }

    pub fn push(&mut self, leaf: &[u8]) -> Result<(), TreePushError> {
        if leaf.len() < NAMESPACE_SIZE {
            return Err(TreePushError::TooShort(leaf.len()));
        }
        let hash = self.hasher.hash_leaf(leaf);
        if let Some(last) = self.leaf_hashes.last() {
            if hash.min < last.max {
                return Err(TreePushError::OutOfOrder {
                    previous: last.max,
                    pushed: hash.min,
                });
            }
        }
        self.leaf_hashes.push(hash);
        Ok(())
    }

    pub fn root(&self) -> NamespacedHash {
        self.hasher.root_of(&self.leaf_hashes)
    }

    /// Proves the leaves in `start..end`.
    pub fn prove_range(&self, start: usize, end: usize) -> Result<Proof, ProofError> {
        let len = self.leaf_hashes.len();
        if start >= end || end > len {
            return Err(ProofError::InvalidRange { start, end, len });
        }
        let mut nodes = vec![];
        self.collect_proof_nodes(start, end, 0, len, &mut nodes);
        Ok(Proof {
            start,
            end,
            total: len,
            nodes,
        })
    }

    /// Pushes, left to right, the root of every maximal subtree of `lo..hi`
    /// that lies completely outside `start..end`.
    fn collect_proof_nodes(
        &self,
        start: usize,
        end: usize,
        lo: usize,
        hi: usize,
        nodes: &mut Vec<NamespacedHash>,
    ) {
        if hi <= start || lo >= end {
            nodes.push(self.hasher.root_of(&self.leaf_hashes[lo..hi]));
            return;
        }
        if hi - lo == 1 {
            return;
        }
        let k = split_point(hi - lo);
        self.collect_proof_nodes(start, end, lo, lo + k, nodes);
        self.collect_proof_nodes(start, end, lo + k, hi, nodes);
    }
}

/// Range inclusion proof. Records the size of the tree it was taken from, so
/// the verifier can rebuild the exact shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub nodes: Vec<NamespacedHash>,
}

impl Proof {
    /// Checks that `leaves`, given without their namespace prefix, sit at
    /// `start..end` under `root` with `namespace`.
    pub fn verify_inclusion<T: AsRef<[u8]>>(
        &self,
        hasher: &NamespacedHasher,
        namespace: &Namespace,
        leaves: &[T],
        root: &NamespacedHash,
    ) -> bool {
        if self.start >= self.end || self.end > self.total || leaves.len() != self.end - self.start
        {
            return false;
        }
        let leaf_hashes: Vec<NamespacedHash> = leaves
            .iter()
            .map(|leaf| {
                let mut data = Vec::with_capacity(NAMESPACE_SIZE + leaf.as_ref().len());
                data.extend_from_slice(namespace.as_bytes());
                data.extend_from_slice(leaf.as_ref());
                hasher.hash_leaf(&data)
            })
            .collect();

        let mut leaves = leaf_hashes.iter();
        let mut nodes = self.nodes.iter();
        let computed = self.compute_root(hasher, 0, self.total, &mut leaves, &mut nodes);
        let exhausted = leaves.next().is_none() && nodes.next().is_none();
        matches!(computed, Some(computed) if exhausted && computed == *root)
    }

    fn compute_root<'a>(
        &self,
        hasher: &NamespacedHasher,
        lo: usize,
        hi: usize,
        leaves: &mut impl Iterator<Item = &'a NamespacedHash>,
        nodes: &mut impl Iterator<Item = &'a NamespacedHash>,
    ) -> Option<NamespacedHash> {
        if hi <= self.start || lo >= self.end {
            return nodes.next().copied();
        }
        if hi - lo == 1 {
            return leaves.next().copied();
        }
        let k = split_point(hi - lo);
        let left = self.compute_root(hasher, lo, lo + k, leaves, nodes)?;
        let right = self.compute_root(hasher, lo + k, hi, leaves, nodes)?;
        Some(hasher.hash_node(&left, &right))
    }
}
