// src/processing/band.rs
use crate::error::{NdwiError, Result};

/// A single spectral band held in memory as row-major `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Band {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        match rows.checked_mul(cols) {
            Some(len) if len == data.len() => Ok(Self { rows, cols, data }),
            _ => Err(NdwiError::InvalidDimensions {
                rows,
                cols,
                len: data.len(),
            }),
        }
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(NdwiError::InvalidDimensions { rows, cols, len: 0 })?;
        Self::new(rows, cols, vec![value; len])
    }

    /// Build a band from fixed-width rows.
    pub fn from_rows<const N: usize>(rows: &[[f32; N]]) -> Result<Self> {
        Self::new(rows.len(), N, rows.iter().flatten().copied().collect())
    }

    /// Widen integer imagery (u8, u16, i8, i16, ...) to `f32` before any
    /// arithmetic touches it.
    pub fn widen<T: Copy + Into<f32>>(rows: usize, cols: usize, values: &[T]) -> Result<Self> {
        Self::new(rows, cols, values.iter().map(|&v| v.into()).collect())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}
