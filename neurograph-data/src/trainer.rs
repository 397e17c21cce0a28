// neurograph-data/src/trainer.rs

use crate::samplers::Sampler;
use neurograph_core::{BackPropagationAlgo, PatternSet};

/// Runs one training epoch: every index the sampler yields is one `learn`
/// step. Returns the mean MSE over the whole set, measured after the
/// epoch's updates.
pub fn run_epoch(
    algo: &mut BackPropagationAlgo<'_>,
    set: &PatternSet,
    sampler: &dyn Sampler,
) -> f32 {
    for index in sampler.iter(set.len()) {
        if let Some(pattern) = set.get(index) {
            algo.learn(pattern);
        }
    }

    if set.is_empty() {
        return 0.0;
    }
    set.iter().map(|p| algo.calculate_mse(p)).sum::<f32>() / set.len() as f32
}

#[cfg(test)]
#[path = "trainer_test.rs"]
mod tests;
