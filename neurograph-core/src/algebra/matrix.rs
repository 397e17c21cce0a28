// src/algebra/matrix.rs

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::algebra::Vector;
use crate::error::NeuroGraphError;

/// A two-dimensional array of `f32` values, row-major, built atop the same
/// shared-storage model as [`Vector`].
///
/// The handle holds an `(offset, rows, cols, row_stride)` window into an
/// `Arc<RwLock<Vec<f32>>>` buffer; a sub-matrix view or a row view shares
/// the buffer and only narrows the window. `row_stride` differs from `cols`
/// exactly when the handle is a column-sliced view.
#[derive(Debug, Clone)]
pub struct Matrix {
    buf: Arc<RwLock<Vec<f32>>>,
    offset: usize,
    rows: usize,
    cols: usize,
    row_stride: usize,
}

impl Matrix {
    /// Creates a `rows x cols` matrix of zeros with freshly owned storage.
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            buf: Arc::new(RwLock::new(vec![0.0; rows * cols])),
            offset: 0,
            rows,
            cols,
            row_stride: cols,
        }
    }

    /// Creates a matrix taking ownership of row-major `data`.
    ///
    /// # Errors
    /// Returns `NeuroGraphError::SizeMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self, NeuroGraphError> {
        if data.len() != rows * cols {
            return Err(NeuroGraphError::SizeMismatch {
                expected: rows * cols,
                actual: data.len(),
                operation: "Matrix::from_vec".to_string(),
            });
        }
        Ok(Matrix {
            buf: Arc::new(RwLock::new(data)),
            offset: 0,
            rows,
            cols,
            row_stride: cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True if this handle does not cover a whole buffer of its own.
    pub fn is_view(&self) -> bool {
        self.offset != 0
            || self.row_stride != self.cols
            || self.rows * self.cols != self.buf.read().unwrap().len()
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        self.offset + row * self.row_stride + col
    }

    fn read_buf(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.buf.read().unwrap()
    }

    fn write_buf(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.buf.write().unwrap()
    }

    /// Returns the element at `(row, col)`. Panics if out of range.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < self.rows && col < self.cols, "matrix index out of range");
        self.read_buf()[self.idx(row, col)]
    }

    /// Sets the element at `(row, col)`. Panics if out of range.
    pub fn set(&self, row: usize, col: usize, value: f32) {
        debug_assert!(row < self.rows && col < self.cols, "matrix index out of range");
        let i = self.idx(row, col);
        self.write_buf()[i] = value;
    }

    /// Creates a [`Vector`] view aliasing one row of this matrix.
    pub fn row_view(&self, row: usize) -> Result<Vector, NeuroGraphError> {
        if row >= self.rows {
            return Err(NeuroGraphError::IndexOutOfBounds {
                index: row,
                len: self.rows,
            });
        }
        Ok(Vector::from_raw_parts(
            Arc::clone(&self.buf),
            self.offset + row * self.row_stride,
            self.cols,
        ))
    }

    /// Creates a sub-matrix view aliasing the `rows x cols` window whose
    /// top-left corner is `(row0, col0)`.
    pub fn view(
        &self,
        row0: usize,
        col0: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Matrix, NeuroGraphError> {
        if row0 + rows > self.rows || col0 + cols > self.cols {
            return Err(NeuroGraphError::ViewError {
                message: format!(
                    "sub-matrix {}x{} at ({}, {}) out of {}x{} matrix",
                    rows, cols, row0, col0, self.rows, self.cols
                ),
            });
        }
        Ok(Matrix {
            buf: Arc::clone(&self.buf),
            offset: self.idx(row0, col0),
            rows,
            cols,
            row_stride: self.row_stride,
        })
    }

    /// Copies the covered window out into a plain row-major `Vec`.
    pub fn to_vec(&self) -> Vec<f32> {
        let g = self.read_buf();
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            out.extend_from_slice(&g[start..start + self.cols]);
        }
        out
    }

    /// Overwrites every element with zero.
    pub fn zero(&self) {
        self.fill(0.0);
    }

    /// Overwrites every element with `value`.
    pub fn fill(&self, value: f32) {
        let mut g = self.write_buf();
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            g[start..start + self.cols].fill(value);
        }
    }

    /// Copies row-major `data` into the covered window.
    pub fn assign_slice(&self, data: &[f32]) {
        debug_assert_eq!(self.rows * self.cols, data.len(), "assign_slice size mismatch");
        let mut g = self.write_buf();
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            let src = r * self.cols;
            if src + self.cols > data.len() {
                break;
            }
            g[start..start + self.cols].copy_from_slice(&data[src..src + self.cols]);
        }
    }

    // --- Elementwise arithmetic, in place ---

    pub fn add_(&self, other: &Matrix) {
        self.zip_apply(other, "add_", |a, b| a + b);
    }

    pub fn sub_(&self, other: &Matrix) {
        self.zip_apply(other, "sub_", |a, b| a - b);
    }

    pub fn mul_(&self, other: &Matrix) {
        self.zip_apply(other, "mul_", |a, b| a * b);
    }

    pub fn div_(&self, other: &Matrix) {
        self.zip_apply(other, "div_", |a, b| a / b);
    }

    pub fn add_scalar_(&self, value: f32) {
        self.map_apply(|a| a + value);
    }

    pub fn sub_scalar_(&self, value: f32) {
        self.map_apply(|a| a - value);
    }

    pub fn mul_scalar_(&self, value: f32) {
        self.map_apply(|a| a * value);
    }

    pub fn div_scalar_(&self, value: f32) {
        self.map_apply(|a| a / value);
    }

    /// Applies an arbitrary elementwise map in place.
    pub fn map_apply(&self, op: impl Fn(f32) -> f32) {
        let mut g = self.write_buf();
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            for v in g[start..start + self.cols].iter_mut() {
                *v = op(*v);
            }
        }
    }

    fn zip_apply(&self, other: &Matrix, operation: &str, op: impl Fn(f32, f32) -> f32) {
        debug_assert!(
            self.rows == other.rows && self.cols == other.cols,
            "size mismatch in {}: {}x{} vs {}x{}",
            operation,
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
        // Read the rhs out first: the two handles may share one buffer.
        let rhs = other.to_vec();
        let mut g = self.write_buf();
        for r in 0..self.rows.min(other.rows) {
            let start = self.offset + r * self.row_stride;
            for c in 0..self.cols.min(other.cols) {
                g[start + c] = op(g[start + c], rhs[r * other.cols + c]);
            }
        }
    }

    // --- Matrix-vector products, accumulated ---
    //
    // Inputs are copied out before the destination is locked, so a
    // destination aliasing this matrix (a row view) cannot deadlock.

    /// `y += x^T * M`: accumulates the product of a row vector with this
    /// matrix into `y`. Requires `x.len() == rows` and `y.len() == cols`.
    pub fn left_mul_acc(&self, x: &Vector, y: &Vector) {
        debug_assert_eq!(x.len(), self.rows, "left_mul_acc x size mismatch");
        debug_assert_eq!(y.len(), self.cols, "left_mul_acc y size mismatch");
        let xv = x.to_vec();
        let mut acc = vec![0.0f32; self.cols];
        {
            let g = self.read_buf();
            for (r, xr) in xv.iter().enumerate().take(self.rows) {
                let start = self.offset + r * self.row_stride;
                for c in 0..self.cols {
                    acc[c] += xr * g[start + c];
                }
            }
        }
        y.add_(&Vector::from_vec(acc));
    }

    /// `y += M * x`: accumulates the product of this matrix with a column
    /// vector into `y`. Requires `x.len() == cols` and `y.len() == rows`.
    pub fn right_mul_acc(&self, x: &Vector, y: &Vector) {
        debug_assert_eq!(x.len(), self.cols, "right_mul_acc x size mismatch");
        debug_assert_eq!(y.len(), self.rows, "right_mul_acc y size mismatch");
        let xv = x.to_vec();
        let mut acc = vec![0.0f32; self.rows];
        {
            let g = self.read_buf();
            for (r, a) in acc.iter_mut().enumerate().take(self.rows) {
                let start = self.offset + r * self.row_stride;
                for c in 0..self.cols.min(xv.len()) {
                    *a += g[start + c] * xv[c];
                }
            }
        }
        y.add_(&Vector::from_vec(acc));
    }

    /// `y[j] += || x - M[:, j] ||`: accumulates, for every column j, the
    /// Euclidean distance between `x` and that column. This is the
    /// propagation rule of distance-based linkers.
    pub fn col_distance_acc(&self, x: &Vector, y: &Vector) {
        debug_assert_eq!(x.len(), self.rows, "col_distance_acc x size mismatch");
        debug_assert_eq!(y.len(), self.cols, "col_distance_acc y size mismatch");
        let xv = x.to_vec();
        let mut acc = vec![0.0f32; self.cols];
        {
            let g = self.read_buf();
            for (c, a) in acc.iter_mut().enumerate().take(self.cols) {
                let mut sum = 0.0f32;
                for (r, xr) in xv.iter().enumerate().take(self.rows) {
                    let d = xr - g[self.offset + r * self.row_stride + c];
                    sum += d * d;
                }
                *a = sum.sqrt();
            }
        }
        y.add_(&Vector::from_vec(acc));
    }

    // --- Learning primitives ---

    /// Outer product accumulated in place: `M[i][j] += x[i] * y[j]`.
    pub fn outer_acc(&self, x: &Vector, y: &Vector) {
        self.delta_rule(1.0, x, y);
    }

    /// Fused delta rule: `M[i][j] += rate * x[i] * y[j]`.
    pub fn delta_rule(&self, rate: f32, x: &Vector, y: &Vector) {
        debug_assert_eq!(x.len(), self.rows, "delta_rule x size mismatch");
        debug_assert_eq!(y.len(), self.cols, "delta_rule y size mismatch");
        let xv = x.to_vec();
        let yv = y.to_vec();
        let mut g = self.write_buf();
        for (r, xr) in xv.iter().enumerate().take(self.rows) {
            let start = self.offset + r * self.row_stride;
            for (c, yc) in yv.iter().enumerate().take(self.cols) {
                g[start + c] += rate * xr * yc;
            }
        }
    }

    /// Masked delta rule: positions where `mask[i * cols + j]` is false are
    /// left untouched (they are expected to already hold zero).
    pub fn delta_rule_masked(&self, rate: f32, x: &Vector, y: &Vector, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.rows * self.cols, "delta_rule mask size mismatch");
        let xv = x.to_vec();
        let yv = y.to_vec();
        let mut g = self.write_buf();
        for (r, xr) in xv.iter().enumerate().take(self.rows) {
            let start = self.offset + r * self.row_stride;
            for (c, yc) in yv.iter().enumerate().take(self.cols) {
                if mask[r * self.cols + c] {
                    g[start + c] += rate * xr * yc;
                }
            }
        }
    }

    /// Re-draws every element uniformly from `[min, max]`.
    pub fn randomize<R: Rng>(&self, min: f32, max: f32, rng: &mut R) {
        let mut g = self.write_buf();
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            for v in g[start..start + self.cols].iter_mut() {
                *v = rng.gen_range(min..=max);
            }
        }
    }

    /// Re-draws every element from a gaussian with the given mean and
    /// standard deviation.
    pub fn randomize_normal<R: Rng>(&self, mean: f32, std_dev: f32, rng: &mut R) {
        let normal = Normal::new(mean, std_dev).expect("std_dev must be finite and non-negative");
        let mut g = self.write_buf();
        for r in 0..self.rows {
            let start = self.offset + r * self.row_stride;
            for v in g[start..start + self.cols].iter_mut() {
                *v = normal.sample(rng);
            }
        }
    }
}

#[cfg(test)]
#[path = "matrix_test.rs"]
mod tests;
