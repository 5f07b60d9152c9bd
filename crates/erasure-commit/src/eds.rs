use da_square_primitives::{Share, Square};
use eyre::{eyre, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    erasure::ReedSolomon,
    error::TreePushError,
    grid::Grid,
    merkle::{hash_from_byte_slices, Hash},
    nmt::NamespacedHash,
    wrapper::axis_root,
};

/// The original `k` wide square extended to `2k` by reed-solomon coding
/// every row and then every column.
///
/// ```text
///  Q0 | Q1      Q0 original shares
///  ---+---      Q1 row parity of Q0
///  Q2 | Q3      Q2, Q3 column parity of the top half
/// ```
pub struct ExtendedDataSquare {
    original_width: usize,
    grid: Grid<Share>,
    rs: ReedSolomon,
}

impl ExtendedDataSquare {
    pub fn compute(square: &Square) -> Result<Self> {
        let k = square.size();
        let rs = ReedSolomon::new(k)?;

        let mut grid = Grid::new(square.shares().to_vec(), &Share::tail_padding());
        if grid.width() != k {
            return Err(eyre!("square of width {k} laid out as {}", grid.width()));
        }
        grid.expand(2 * k, &Share::tail_padding());

        let row_parity = (0..k)
            .into_par_iter()
            .map(|r| rs.encode_shares(square.row(r)))
            .collect::<Result<Vec<_>>>()?;
        for (r, parity) in row_parity.iter().enumerate() {
            grid.set_row(r, k, parity);
        }

        let column_parity = (0..2 * k)
            .into_par_iter()
            .map(|c| rs.encode_shares(&grid.column(c)[..k]))
            .collect::<Result<Vec<_>>>()?;
        for (c, parity) in column_parity.iter().enumerate() {
            grid.set_column(c, k, parity);
        }

        log::debug!("extended square of width {k} to {}", 2 * k);
        Ok(Self {
            original_width: k,
            grid,
            rs,
        })
    }

    /// Width of the extended square, `2k`.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn original_width(&self) -> usize {
        self.original_width
    }

    pub fn row(&self, index: usize) -> Vec<Share> {
        self.grid.row(index)
    }

    pub fn column(&self, index: usize) -> Vec<Share> {
        self.grid.column(index)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Share> {
        self.grid.get(row, column)
    }

    pub fn original_square(&self) -> Result<Square> {
        let k = self.original_width;
        let shares = (0..k)
            .flat_map(|r| self.grid.row(r).into_iter().take(k))
            .collect();
        Ok(Square::new(k, shares)?)
    }

    /// Recomputes row `index` from any `k` of its shares. Fails if the
    /// repaired row disagrees with the row held in the square.
    pub fn repair_row(&self, index: usize, shares: Vec<Option<Share>>) -> Result<Vec<Share>> {
        if index >= self.width() {
            return Err(eyre!("row {index} outside square of width {}", self.width()));
        }
        let row = self.rs.repair(shares)?;
        for (c, share) in row.iter().enumerate() {
            if self.grid.get(index, c) != Some(share) {
                return Err(eyre!("repaired row {index} disagrees at column {c}"));
            }
        }
        Ok(row)
    }

    pub fn row_roots(&self) -> Result<Vec<NamespacedHash>, TreePushError> {
        let k = self.original_width;
        (0..self.width())
            .into_par_iter()
            .map(|r| axis_root(k, r, &self.row(r)))
            .collect()
    }

    pub fn column_roots(&self) -> Result<Vec<NamespacedHash>, TreePushError> {
        let k = self.original_width;
        (0..self.width())
            .into_par_iter()
            .map(|c| axis_root(k, c, &self.column(c)))
            .collect()
    }
}

/// Row and column roots of an extended square. Its hash is the data root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAvailabilityHeader {
    pub row_roots: Vec<NamespacedHash>,
    pub column_roots: Vec<NamespacedHash>,
}

impl DataAvailabilityHeader {
    pub fn new(eds: &ExtendedDataSquare) -> Result<Self, TreePushError> {
        Ok(Self {
            row_roots: eds.row_roots()?,
            column_roots: eds.column_roots()?,
        })
    }

    /// Header of the empty block: the 1x1 tail padding square.
    pub fn min_data_availability_header() -> Result<Self> {
        let eds = ExtendedDataSquare::compute(&Square::empty())?;
        Ok(Self::new(&eds)?)
    }

    pub fn square_size(&self) -> usize {
        self.row_roots.len() / 2
    }

    pub fn hash(&self) -> Hash {
        let leaves = self
            .row_roots
            .iter()
            .chain(self.column_roots.iter())
            .map(NamespacedHash::to_bytes)
            .collect::<Vec<_>>();
        hash_from_byte_slices(&leaves)
    }
}
