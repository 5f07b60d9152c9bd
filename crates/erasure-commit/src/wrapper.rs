//! Adapts the namespaced merkle tree to rows and columns of an extended data
//! square, where every share outside the original quadrant is parity.

use da_square_primitives::{Namespace, NAMESPACE_SIZE, PARITY_SHARES_NAMESPACE};

use crate::{
    error::{ProofError, TreePushError},
    nmt::{NamespaceMerkleTree, NamespacedHash, NamespacedHasher, Proof},
};

/// Builds the tree for one axis (row or column) of a `2k` wide extended square.
///
/// Shares are pushed raw and the wrapper prefixes each with the namespace the
/// tree should see: its own for the original quadrant, parity otherwise.
pub struct ErasuredNamespacedMerkleTree {
    square_size: usize,
    axis_index: usize,
    share_index: usize,
    tree: NamespaceMerkleTree,
}

impl ErasuredNamespacedMerkleTree {
    /// `square_size` is the original width `k`.
    pub fn new(square_size: usize, axis_index: usize) -> Self {
        Self {
            square_size,
            axis_index,
            share_index: 0,
            tree: NamespaceMerkleTree::new(true),
        }
    }

    pub fn push(&mut self, share: &[u8]) -> Result<(), TreePushError> {
        let capacity = 2 * self.square_size;
        if self.axis_index + 1 > capacity || self.share_index + 1 > capacity {
            return Err(TreePushError::Overflow {
                capacity,
                axis_index: self.axis_index,
                share_index: self.share_index,
            });
        }
        if share.len() < NAMESPACE_SIZE {
            return Err(TreePushError::TooShort(share.len()));
        }

        let namespace = if self.axis_index >= self.square_size
            || self.share_index >= self.square_size
        {
            PARITY_SHARES_NAMESPACE.as_bytes()
        } else {
            &share[..NAMESPACE_SIZE]
        };
        let mut leaf = Vec::with_capacity(NAMESPACE_SIZE + share.len());
        leaf.extend_from_slice(namespace);
        leaf.extend_from_slice(share);

        self.tree.push(&leaf)?;
        self.share_index += 1;
        Ok(())
    }

    pub fn root(&self) -> NamespacedHash {
        self.tree.root()
    }

    pub fn hasher(&self) -> NamespacedHasher {
        self.tree.hasher()
    }

    pub fn prove_range(&self, start: usize, end: usize) -> Result<Proof, ProofError> {
        self.tree.prove_range(start, end)
    }

    /// Namespace a share at `share_index` on this axis is committed under.
    pub fn leaf_namespace(&self, share_index: usize, share: &[u8]) -> Option<Namespace> {
        if self.axis_index >= self.square_size || share_index >= self.square_size {
            return Some(PARITY_SHARES_NAMESPACE);
        }
        share.get(..NAMESPACE_SIZE).and_then(|ns| Namespace::try_from(ns).ok())
    }
}

/// Root of one axis of the extended square.
pub fn axis_root<T: AsRef<[u8]>>(
    square_size: usize,
    axis_index: usize,
    shares: &[T],
) -> Result<NamespacedHash, TreePushError> {
    let mut tree = ErasuredNamespacedMerkleTree::new(square_size, axis_index);
    for share in shares {
        tree.push(share.as_ref())?;
    }
    Ok(tree.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use da_square_primitives::{Share, SHARE_SIZE};
    use rand::Rng;

    fn namespaced_share(ns_last: u8) -> Vec<u8> {
        let mut share = vec![0u8; SHARE_SIZE];
        share[NAMESPACE_SIZE - 1] = ns_last;
        rand::thread_rng().fill(&mut share[NAMESPACE_SIZE..]);
        share
    }

    /// A row of an extended square: `k` sorted data shares then `k` parity.
    fn extended_row(k: usize) -> Vec<Vec<u8>> {
        let mut row: Vec<Vec<u8>> = (0..k).map(|i| namespaced_share(i as u8 + 1)).collect();
        row.extend((0..k).map(|_| {
            let mut parity = vec![0u8; SHARE_SIZE];
            rand::thread_rng().fill(&mut parity[..]);
            parity
        }));
        row
    }

    #[test]
    fn test_push_erasured_row() {
        for k in [8usize, 128] {
            let mut tree = ErasuredNamespacedMerkleTree::new(k, 0);
            for share in extended_row(k) {
                tree.push(&share).unwrap();
            }
            let root = tree.root();
            assert_eq!(root.min.as_bytes()[NAMESPACE_SIZE - 1], 1);
            // the parity half is ignored when tracking the max namespace
            assert_ne!(root.max, PARITY_SHARES_NAMESPACE);
        }
    }

    #[test]
    fn test_root_differs_from_plain_tree() {
        let k = 4;
        let row = extended_row(k);

        let mut erasured = ErasuredNamespacedMerkleTree::new(k, 0);
        let mut plain = NamespaceMerkleTree::new(false);
        for share in &row {
            erasured.push(share).unwrap();
        }
        // the plain tree sees the raw bytes, so parity shares would be out of
        // order; compare against the data half only
        for share in &row[..k] {
            plain.push(share).unwrap();
        }
        assert_ne!(erasured.root(), plain.root());
    }

    #[test]
    fn test_empty_roots_match() {
        let a = ErasuredNamespacedMerkleTree::new(1, 0);
        let b = ErasuredNamespacedMerkleTree::new(2, 1);
        assert_eq!(a.root(), b.root());
        assert_eq!(a.root(), NamespacedHash::empty_root());
    }

    #[test]
    fn test_push_overflow() {
        let mut tree = ErasuredNamespacedMerkleTree::new(1, 0);
        tree.push(&namespaced_share(1)).unwrap();
        tree.push(&namespaced_share(1)).unwrap();
        assert_eq!(
            tree.push(&namespaced_share(1)),
            Err(TreePushError::Overflow {
                capacity: 2,
                axis_index: 0,
                share_index: 2
            })
        );

        let mut outside = ErasuredNamespacedMerkleTree::new(2, 4);
        assert!(matches!(
            outside.push(&namespaced_share(1)),
            Err(TreePushError::Overflow { .. })
        ));
    }

    #[test]
    fn test_push_reversed_order() {
        let mut tree = ErasuredNamespacedMerkleTree::new(4, 0);
        tree.push(&namespaced_share(5)).unwrap();
        assert!(matches!(
            tree.push(&namespaced_share(2)),
            Err(TreePushError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_push_short_data() {
        let mut tree = ErasuredNamespacedMerkleTree::new(4, 0);
        assert_eq!(tree.push(&[1u8; 7]), Err(TreePushError::TooShort(7)));
    }

    #[test]
    fn test_prove_every_leaf() {
        for k in 1..=16usize {
            let row = extended_row(k);
            let mut tree = ErasuredNamespacedMerkleTree::new(k, 0);
            for share in &row {
                tree.push(share).unwrap();
            }
            let root = tree.root();
            for (i, share) in row.iter().enumerate() {
                let proof = tree.prove_range(i, i + 1).unwrap();
                let ns = tree.leaf_namespace(i, share).unwrap();
                assert!(
                    proof.verify_inclusion(&tree.hasher(), &ns, &[share], &root),
                    "leaf {i} of k={k}"
                );
            }
        }
    }

    #[test]
    fn test_parity_axis() {
        let k = 2;
        let share = Share::namespace_padding(Namespace::new([0, 0, 0, 0, 0, 0, 1, 0]));
        let root = axis_root(k, k, &[share.as_bytes(); 4]).unwrap();
        assert_eq!(root.min, PARITY_SHARES_NAMESPACE);
        assert_eq!(root.max, PARITY_SHARES_NAMESPACE);
    }
}
