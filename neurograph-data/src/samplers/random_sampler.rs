// neurograph-data/src/samplers/random_sampler.rs

use super::traits::Sampler;
use rand::seq::SliceRandom;
use rand::Rng;

/// Presents patterns in a random order.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    replacement: bool,
    num_samples: Option<usize>,
}

impl RandomSampler {
    /// Creates a new `RandomSampler`.
    ///
    /// # Arguments
    ///
    /// * `replacement`: If `true`, an index can be selected multiple times.
    /// * `num_samples`: The total number of indices to draw. If `None`, it
    ///   defaults to the set size (a shuffled permutation when drawing
    ///   without replacement).
    pub fn new(replacement: bool, num_samples: Option<usize>) -> Self {
        RandomSampler {
            replacement,
            num_samples,
        }
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, set_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        if set_len == 0 {
            return Box::new(std::iter::empty());
        }

        let mut rng = rand::thread_rng();
        let wanted = self.num_samples.unwrap_or(set_len);

        if self.replacement {
            let indices: Vec<usize> = (0..wanted).map(|_| rng.gen_range(0..set_len)).collect();
            Box::new(indices.into_iter())
        } else {
            let mut indices: Vec<usize> = (0..set_len).collect();
            indices.shuffle(&mut rng);
            indices.truncate(wanted);
            Box::new(indices.into_iter())
        }
    }

    fn len(&self, set_len: usize) -> usize {
        let wanted = self.num_samples.unwrap_or(set_len);
        if self.replacement {
            wanted
        } else {
            wanted.min(set_len)
        }
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
