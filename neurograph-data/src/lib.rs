//! # neurograph-data
//!
//! Companion crate of `neurograph-core`: loads supervised pattern corpora
//! from plain text and drives training epochs with pluggable
//! presentation-order samplers. The [`PatternSet`] of the core crate is the
//! sole exchange format between the two.
//!
//! [`PatternSet`]: neurograph_core::PatternSet

pub mod corpus;
pub mod samplers;
pub mod trainer;

// Re-export main components
pub use corpus::parse_pattern_set;
pub use samplers::{RandomSampler, Sampler, SequentialSampler};
pub use trainer::run_epoch;
