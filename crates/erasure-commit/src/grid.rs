use da_square_primitives::square::min_square_size;
use nalgebra::{DMatrix, Scalar};

/// A Grid of data, also known as a perfect matrix. The width is always a
/// power of two so it lines up with the square sizes the layout produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width_length: usize,
    pub inner: DMatrix<T>,
}

impl<T: Scalar> Grid<T> {
    /// Create a new grid from row-major `data`, filling it with nullifiers to
    /// expand the data to a perfect square.
    pub fn new(mut data: Vec<T>, nullifier: &T) -> Self {
        let width = Self::square_dimensions(data.len());

        let grow_len = width * width;
        if data.len() != grow_len {
            log::debug!("Expanding data from {} to {}", data.len(), grow_len);
            data.resize(grow_len, nullifier.clone());
        }

        Grid {
            width_length: width,
            inner: DMatrix::from_row_slice(width, width, &data),
        }
    }

    pub fn filled(width: usize, value: &T) -> Self {
        Grid {
            width_length: width,
            inner: DMatrix::from_element(width, width, value.clone()),
        }
    }

    /// Width of the smallest power of two square holding `len` cells.
    pub fn square_dimensions(len: usize) -> usize {
        min_square_size(len)
    }

    pub fn width(&self) -> usize {
        self.width_length
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        self.inner.get((row, column))
    }

    pub fn row(&self, index: usize) -> Vec<T> {
        self.inner.row(index).iter().cloned().collect()
    }

    pub fn column(&self, index: usize) -> Vec<T> {
        self.inner.column(index).iter().cloned().collect()
    }

    /// Overwrites the row starting at column `offset`.
    pub fn set_row(&mut self, index: usize, offset: usize, values: &[T]) {
        let mut row = self.inner.row_mut(index);
        for (i, value) in values.iter().enumerate() {
            row[offset + i] = value.clone();
        }
    }

    /// Overwrites the column starting at row `offset`.
    pub fn set_column(&mut self, index: usize, offset: usize, values: &[T]) {
        let mut column = self.inner.column_mut(index);
        for (i, value) in values.iter().enumerate() {
            column[offset + i] = value.clone();
        }
    }

    /// Grows the grid to `width`, keeping existing cells in the top left.
    pub fn expand(&mut self, width: usize, nullifier: &T) {
        if width <= self.width_length {
            return;
        }
        self.inner.resize_mut(width, width, nullifier.clone());
        self.width_length = width;
    }

    /// Row-major copy of every cell.
    pub fn to_row_major(&self) -> Vec<T> {
        (0..self.width_length).flat_map(|r| self.row(r)).collect()
    }
}
