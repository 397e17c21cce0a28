// src/learning/mod.rs
// Gradient learning over the graph: exemplar containers, the per-type
// update-rule registry, and the backpropagation engine itself.

pub mod backprop;
pub mod modifier;
pub mod pattern;

// Re-export common items
pub use backprop::BackPropagationAlgo;
pub use modifier::{Modifier, ModifierRegistry};
pub use pattern::{Pattern, PatternSet};
