use thiserror::Error;

use crate::shares::{shares_needed, Share};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquareError {
    #[error("square size {0} is not a power of two")]
    InvalidSize(usize),
    #[error("square of size {size} needs {expected} shares, got {got}")]
    ShareCount {
        size: usize,
        expected: usize,
        got: usize,
    },
}

/// Smallest power of two that is at least `v`. Zero rounds up to one.
pub fn round_up_power_of_two(v: usize) -> usize {
    v.max(1).next_power_of_two()
}

/// Largest power of two that is at most `v`, or zero for zero.
pub fn next_lowest_power_of_two(v: usize) -> usize {
    match v {
        0 => 0,
        v => 1 << (usize::BITS - 1 - v.leading_zeros()),
    }
}

/// Smallest power of two `k` such that a `k * k` square holds `share_count`
/// shares.
pub fn min_square_size(share_count: usize) -> usize {
    let mut k = 1;
    while k * k < share_count {
        k <<= 1;
    }
    k
}

/// The smallest square a blob of `blob_len` bytes could ever be placed in. It
/// ignores transaction shares and alignment, so it is a lower bound.
pub fn blob_min_square_size(blob_len: usize) -> usize {
    min_square_size(shares_needed(blob_len))
}

/// A `size * size` grid of shares in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Square {
    size: usize,
    shares: Vec<Share>,
}

impl Square {
    pub fn new(size: usize, shares: Vec<Share>) -> Result<Self, SquareError> {
        if !size.is_power_of_two() {
            return Err(SquareError::InvalidSize(size));
        }
        if shares.len() != size * size {
            return Err(SquareError::ShareCount {
                size,
                expected: size * size,
                got: shares.len(),
            });
        }
        Ok(Self { size, shares })
    }

    /// The square of a block with no data: a single tail padding share.
    pub fn empty() -> Self {
        Self {
            size: 1,
            shares: vec![Share::tail_padding()],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn into_shares(self) -> Vec<Share> {
        self.shares
    }

    pub fn row(&self, index: usize) -> &[Share] {
        &self.shares[index * self.size..(index + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Share]> {
        self.shares.chunks(self.size)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Share> {
        if column >= self.size {
            return None;
        }
        self.shares.get(row * self.size + column)
    }

    /// Row-major namespaces never decrease; this also gives ordered columns.
    pub fn is_namespace_ordered(&self) -> bool {
        self.shares
            .windows(2)
            .all(|pair| pair[0].namespace() <= pair[1].namespace())
    }
}
