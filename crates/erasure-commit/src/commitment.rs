//! Share commitments.
//!
//! A blob's shares are cut into a merkle mountain range of subtrees no wider
//! than the smallest square the blob fits in. Under the non-interactive
//! layout every one of those subtrees is a node of some row tree, whatever
//! square the blob ends up in, so the commitment can be computed before the
//! square exists.

use da_square_primitives::{
    square::blob_min_square_size, Blob, Commitment, Namespace, Share, ShareVersion, Square,
    SHARE_VERSION_ZERO,
};

use crate::{
    error::CommitmentError,
    merkle::hash_from_byte_slices,
    nmt::NamespacedHash,
    wrapper::ErasuredNamespacedMerkleTree,
};

/// Splits `total` leaves into full trees of `max_tree_size`, followed by
/// strictly decreasing powers of two. `max_tree_size` is a square width, so a
/// power of two.
pub fn merkle_mountain_range_sizes(
    total: usize,
    max_tree_size: usize,
) -> Result<Vec<usize>, CommitmentError> {
    if !max_tree_size.is_power_of_two() {
        return Err(CommitmentError::InvalidSquareSize(max_tree_size));
    }
    let mut sizes = vec![];
    let mut remaining = total;
    while remaining != 0 {
        let size = if remaining >= max_tree_size {
            max_tree_size
        } else {
            1 << (usize::BITS - 1 - remaining.leading_zeros())
        };
        sizes.push(size);
        remaining -= size;
    }
    Ok(sizes)
}

pub fn create_commitment(namespace: &Namespace, data: &[u8]) -> Result<Commitment, CommitmentError> {
    create_versioned_commitment(namespace, SHARE_VERSION_ZERO, data)
}

pub fn create_blob_commitment(blob: &Blob) -> Result<Commitment, CommitmentError> {
    create_versioned_commitment(&blob.namespace, blob.share_version, &blob.data)
}

fn create_versioned_commitment(
    namespace: &Namespace,
    version: ShareVersion,
    data: &[u8],
) -> Result<Commitment, CommitmentError> {
    let shares = da_square_primitives::shares::split_sequence(*namespace, version, data)?;
    commitment_from_shares(&shares, blob_min_square_size(data.len()))
}

/// Commitment over `shares` using subtrees of at most `square_size` leaves.
pub fn commitment_from_shares(
    shares: &[Share],
    square_size: usize,
) -> Result<Commitment, CommitmentError> {
    let mut roots = vec![];
    let mut cursor = 0;
    for size in merkle_mountain_range_sizes(shares.len(), square_size)? {
        roots.push(subtree_root(square_size, 0, &shares[cursor..cursor + size])?);
        cursor += size;
    }
    Ok(commit_roots(&roots))
}

/// Recomputes the commitment of `blob` from where it was placed in `square`.
///
/// Every subtree must start on a multiple of its own size and stay inside one
/// row, which is what makes it a node of that row's tree.
pub fn commitment_from_square(
    square: &Square,
    start: usize,
    blob: &Blob,
) -> Result<Commitment, CommitmentError> {
    let k = square.size();
    let len = blob.share_count();
    let capacity = k * k;
    if start + len > capacity {
        return Err(CommitmentError::OutOfBounds {
            start,
            len,
            capacity,
        });
    }

    let shares = &square.shares()[start..start + len];
    let mut roots = vec![];
    let mut cursor = start;
    for size in merkle_mountain_range_sizes(len, blob_min_square_size(blob.data.len()))? {
        if cursor % size != 0 || cursor / k != (cursor + size - 1) / k {
            return Err(CommitmentError::Misaligned {
                index: cursor,
                size,
                square_size: k,
            });
        }
        let offset = cursor - start;
        roots.push(subtree_root(k, cursor / k, &shares[offset..offset + size])?);
        cursor += size;
    }
    Ok(commit_roots(&roots))
}

/// Checks a carried commitment against the one recomputed for `blob`.
pub fn verify_commitment(blob: &Blob, carried: &[u8]) -> Result<(), CommitmentError> {
    if carried.is_empty() {
        return Err(CommitmentError::Empty);
    }
    let computed = create_blob_commitment(blob)?;
    if computed.as_slice() != carried {
        return Err(CommitmentError::Mismatch {
            computed: hex::encode(computed),
            carried: hex::encode(carried),
        });
    }
    Ok(())
}

fn subtree_root(
    square_size: usize,
    axis_index: usize,
    shares: &[Share],
) -> Result<NamespacedHash, CommitmentError> {
    let mut tree = ErasuredNamespacedMerkleTree::new(square_size, axis_index);
    for share in shares {
        tree.push(share.as_bytes())?;
    }
    Ok(tree.root())
}

fn commit_roots(roots: &[NamespacedHash]) -> Commitment {
    let leaves = roots.iter().map(NamespacedHash::to_bytes).collect::<Vec<_>>();
    hash_from_byte_slices(&leaves)
}
