//! Plain binary merkle tree, RFC 6962 shaped: the left subtree always holds
//! the largest power of two strictly smaller than the leaf count.

use sha2::{Digest, Sha256};

pub const HASH_SIZE: usize = 32;
pub type Hash = [u8; HASH_SIZE];

pub(crate) const LEAF_PREFIX: u8 = 0;
pub(crate) const NODE_PREFIX: u8 = 1;

pub fn empty_hash() -> Hash {
    Sha256::digest(b"").into()
}

pub fn leaf_hash(leaf: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf);
    hasher.finalize().into()
}

pub fn inner_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Largest power of two strictly less than `n`, for `n >= 2`.
pub(crate) fn split_point(n: usize) -> usize {
    debug_assert!(n >= 2);
    n.next_power_of_two() / 2
}

pub fn hash_from_byte_slices<T: AsRef<[u8]>>(items: &[T]) -> Hash {
    match items.len() {
        0 => empty_hash(),
        1 => leaf_hash(items[0].as_ref()),
        n => {
            let k = split_point(n);
            let left = hash_from_byte_slices(&items[..k]);
            let right = hash_from_byte_slices(&items[k..]);
            inner_hash(&left, &right)
        }
    }
}
