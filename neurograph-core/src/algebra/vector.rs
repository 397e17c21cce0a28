// src/algebra/vector.rs

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::NeuroGraphError;

/// A one-dimensional array of `f32` values.
///
/// `Vector` is a handle over shared storage: it holds an
/// `Arc<RwLock<Vec<f32>>>` plus an `(offset, len)` window into it.
/// A freshly constructed vector covers its whole buffer; [`Vector::view`]
/// returns a second handle aliasing a sub-range of the same buffer, so
/// writes through either handle are visible through the other.
///
/// Cloning a `Vector` clones the handle, not the data (same semantics as
/// cloning a tensor sharing its buffer).
#[derive(Debug, Clone)]
pub struct Vector {
    buf: Arc<RwLock<Vec<f32>>>,
    offset: usize,
    len: usize,
}

impl Vector {
    /// Creates a vector of `size` zeros with freshly owned storage.
    pub fn new(size: usize) -> Self {
        Vector {
            buf: Arc::new(RwLock::new(vec![0.0; size])),
            offset: 0,
            len: size,
        }
    }

    /// Creates a vector of `size` copies of `value`.
    pub fn filled(size: usize, value: f32) -> Self {
        Vector {
            buf: Arc::new(RwLock::new(vec![value; size])),
            offset: 0,
            len: size,
        }
    }

    /// Creates a vector taking ownership of `data`.
    pub fn from_vec(data: Vec<f32>) -> Self {
        let len = data.len();
        Vector {
            buf: Arc::new(RwLock::new(data)),
            offset: 0,
            len,
        }
    }

    pub(crate) fn from_raw_parts(buf: Arc<RwLock<Vec<f32>>>, offset: usize, len: usize) -> Self {
        Vector { buf, offset, len }
    }

    /// Creates a view aliasing `len` elements of this vector starting at
    /// `start`. Reads and writes through the view pass through to the
    /// backing storage.
    ///
    /// # Errors
    /// Returns `NeuroGraphError::ViewError` if the range does not fit.
    pub fn view(&self, start: usize, len: usize) -> Result<Vector, NeuroGraphError> {
        if start + len > self.len {
            return Err(NeuroGraphError::ViewError {
                message: format!(
                    "range {}..{} out of vector of length {}",
                    start,
                    start + len,
                    self.len
                ),
            });
        }
        Ok(Vector {
            buf: Arc::clone(&self.buf),
            offset: self.offset + start,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if this handle does not cover a whole buffer of its own.
    pub fn is_view(&self) -> bool {
        self.offset != 0 || self.len != self.buf.read().unwrap().len()
    }

    /// True if `self` and `other` share the same backing storage
    /// (regardless of the window each covers).
    pub fn aliases(&self, other: &Vector) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }

    fn read_buf(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.buf.read().unwrap()
    }

    fn write_buf(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.buf.write().unwrap()
    }

    /// Returns the element at `index`. Panics if out of range.
    pub fn get(&self, index: usize) -> f32 {
        debug_assert!(index < self.len, "vector index {} >= len {}", index, self.len);
        self.read_buf()[self.offset + index]
    }

    /// Sets the element at `index`. Panics if out of range.
    pub fn set(&self, index: usize, value: f32) {
        debug_assert!(index < self.len, "vector index {} >= len {}", index, self.len);
        self.write_buf()[self.offset + index] = value;
    }

    /// Copies the covered range out into a plain `Vec`.
    pub fn to_vec(&self) -> Vec<f32> {
        let g = self.read_buf();
        g[self.offset..self.offset + self.len].to_vec()
    }

    /// Overwrites every element with zero.
    pub fn zero(&self) {
        self.fill(0.0);
    }

    /// Overwrites every element with `value`.
    pub fn fill(&self, value: f32) {
        let mut g = self.write_buf();
        g[self.offset..self.offset + self.len].fill(value);
    }

    /// Copies the contents of `other` into `self`.
    pub fn assign(&self, other: &Vector) {
        self.zip_apply(other, "assign", |_, b| b);
    }

    /// Copies `data` into `self`.
    pub fn assign_slice(&self, data: &[f32]) {
        debug_assert_eq!(self.len, data.len(), "assign_slice size mismatch");
        let n = self.len.min(data.len());
        let mut g = self.write_buf();
        g[self.offset..self.offset + n].copy_from_slice(&data[..n]);
    }

    /// Grows or shrinks an owned vector in place, zero-filling new elements.
    ///
    /// # Errors
    /// Returns `NeuroGraphError::ResizeOnView` when called on a view: the
    /// backing storage belongs to another handle and must keep its layout.
    pub fn resize(&mut self, new_len: usize) -> Result<(), NeuroGraphError> {
        if self.is_view() {
            return Err(NeuroGraphError::ResizeOnView);
        }
        self.write_buf().resize(new_len, 0.0);
        self.len = new_len;
        Ok(())
    }

    // --- Elementwise arithmetic, in place ---
    //
    // Size mismatches are programmer errors: checked by debug_assert only,
    // the common prefix is processed otherwise.

    pub fn add_(&self, other: &Vector) {
        self.zip_apply(other, "add_", |a, b| a + b);
    }

    pub fn sub_(&self, other: &Vector) {
        self.zip_apply(other, "sub_", |a, b| a - b);
    }

    pub fn mul_(&self, other: &Vector) {
        self.zip_apply(other, "mul_", |a, b| a * b);
    }

    pub fn div_(&self, other: &Vector) {
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

    /// Replaces every element with its exponential.
    pub fn exp_(&self) {
        self.map_apply(f32::exp);
    }

    /// Replaces every element `x` with `1 / x`.
    pub fn inverse_(&self) {
        self.map_apply(|a| 1.0 / a);
    }

    /// Applies an arbitrary elementwise map in place.
    pub fn map_apply(&self, op: impl Fn(f32) -> f32) {
        let mut g = self.write_buf();
        for v in g[self.offset..self.offset + self.len].iter_mut() {
            *v = op(*v);
        }
    }

    /// Applies a binary elementwise op in place, `self[i] = op(self[i], other[i])`.
    ///
    /// Handles the two handles sharing one backing buffer (e.g. a relay
    /// cluster's input and output windows) under a single write guard, so
    /// aliased operands cannot deadlock.
    fn zip_apply(&self, other: &Vector, operation: &str, op: impl Fn(f32, f32) -> f32) {
        debug_assert_eq!(
            self.len, other.len,
            "size mismatch in {}: {} vs {}",
            operation, self.len, other.len
        );
        let n = self.len.min(other.len);
        if Arc::ptr_eq(&self.buf, &other.buf) {
            let mut g = self.write_buf();
            for i in 0..n {
                let rhs = g[other.offset + i];
                let lhs = g[self.offset + i];
                g[self.offset + i] = op(lhs, rhs);
            }
        } else {
            let mut g = self.write_buf();
            let o = other.read_buf();
            for i in 0..n {
                g[self.offset + i] = op(g[self.offset + i], o[other.offset + i]);
            }
        }
    }

    // --- Reductions ---

    /// Dot product with `other`.
    pub fn dot(&self, other: &Vector) -> f32 {
        debug_assert_eq!(self.len, other.len, "size mismatch in dot");
        let n = self.len.min(other.len);
        if Arc::ptr_eq(&self.buf, &other.buf) {
            let g = self.read_buf();
            (0..n).map(|i| g[self.offset + i] * g[other.offset + i]).sum()
        } else {
            let a = self.read_buf();
            let b = other.read_buf();
            (0..n).map(|i| a[self.offset + i] * b[other.offset + i]).sum()
        }
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Scales the vector to unit norm. Zero vectors are left untouched.
    pub fn normalize(&self) {
        let n = self.norm();
        if n > 0.0 {
            self.mul_scalar_(1.0 / n);
        }
    }

    /// Index of the largest element. Returns 0 for an empty vector.
    pub fn max_index(&self) -> usize {
        let g = self.read_buf();
        let s = &g[self.offset..self.offset + self.len];
        let mut best = 0;
        for (i, v) in s.iter().enumerate() {
            if *v > s[best] {
                best = i;
            }
        }
        best
    }

    /// Largest element, or `f32::NEG_INFINITY` for an empty vector.
    pub fn max_value(&self) -> f32 {
        if self.len == 0 {
            return f32::NEG_INFINITY;
        }
        self.get(self.max_index())
    }

    /// Index of the smallest element. Returns 0 for an empty vector.
    pub fn min_index(&self) -> usize {
        let g = self.read_buf();
        let s = &g[self.offset..self.offset + self.len];
        let mut best = 0;
        for (i, v) in s.iter().enumerate() {
            if *v < s[best] {
                best = i;
            }
        }
        best
    }

    /// Smallest element, or `f32::INFINITY` for an empty vector.
    pub fn min_value(&self) -> f32 {
        if self.len == 0 {
            return f32::INFINITY;
        }
        self.get(self.min_index())
    }

    // --- Learning primitives ---

    /// Delta rule for vector-shaped parameters:
    /// `self[i] += rate * x[i] * y[i]`.
    pub fn delta_rule(&self, rate: f32, x: &Vector, y: &Vector) {
        debug_assert_eq!(self.len, x.len, "delta_rule x size mismatch");
        debug_assert_eq!(self.len, y.len, "delta_rule y size mismatch");
        let xv = x.to_vec();
        let yv = y.to_vec();
        let n = self.len.min(xv.len()).min(yv.len());
        let mut g = self.write_buf();
        for i in 0..n {
            g[self.offset + i] += rate * xv[i] * yv[i];
        }
    }

    /// Re-draws every element uniformly from `[min, max]`.
    pub fn randomize<R: Rng>(&self, min: f32, max: f32, rng: &mut R) {
        let mut g = self.write_buf();
        for v in g[self.offset..self.offset + self.len].iter_mut() {
            *v = rng.gen_range(min..=max);
        }
    }

    /// Re-draws every element from a gaussian with the given mean and
    /// standard deviation.
    pub fn randomize_normal<R: Rng>(&self, mean: f32, std_dev: f32, rng: &mut R) {
        let normal = Normal::new(mean, std_dev).expect("std_dev must be finite and non-negative");
        let mut g = self.write_buf();
        for v in g[self.offset..self.offset + self.len].iter_mut() {
            *v = normal.sample(rng);
        }
    }
}

#[cfg(test)]
#[path = "vector_test.rs"]
mod tests;
