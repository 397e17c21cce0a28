// neurograph-data/src/samplers/traits.rs

use std::fmt::Debug;

/// Defines the order in which the patterns of a set are presented.
///
/// A sampler yields indices into a `PatternSet`; the trainer feeds each
/// indexed pattern to the learning algorithm in turn.
pub trait Sampler: Debug + Send + Sync {
    /// Returns an iterator over pattern indices.
    ///
    /// # Arguments
    ///
    /// * `set_len` - The total number of patterns in the set.
    fn iter(&self, set_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync>;

    /// Returns the number of indices the iterator will yield, which may
    /// differ from `set_len` for samplers drawing with replacement.
    fn len(&self, set_len: usize) -> usize;

    fn is_empty(&self, set_len: usize) -> bool {
        self.len(set_len) == 0
    }
}
