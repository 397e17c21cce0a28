// src/learning/pattern.rs

use crate::cluster::Cluster;

/// One supervised exemplar: desired input values for some clusters and
/// desired output values for others, keyed by cluster identity.
///
/// A pattern does not require its clusters to belong to any net; it simply
/// names them. The learning engine assigns the input entries before the
/// forward pass and compares the output entries after it.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    inputs: Vec<(Cluster, Vec<f32>)>,
    outputs: Vec<(Cluster, Vec<f32>)>,
}

impl Pattern {
    pub fn new() -> Self {
        Pattern::default()
    }

    /// Sets (or replaces) the desired input values of `cluster`.
    pub fn set_inputs_of(&mut self, cluster: &Cluster, values: Vec<f32>) {
        if let Some(entry) = self.inputs.iter_mut().find(|(c, _)| c == cluster) {
            entry.1 = values;
        } else {
            self.inputs.push((cluster.clone(), values));
        }
    }

    /// Sets (or replaces) the desired output values of `cluster`.
    pub fn set_outputs_of(&mut self, cluster: &Cluster, values: Vec<f32>) {
        if let Some(entry) = self.outputs.iter_mut().find(|(c, _)| c == cluster) {
            entry.1 = values;
        } else {
            self.outputs.push((cluster.clone(), values));
        }
    }

    pub fn inputs_of(&self, cluster: &Cluster) -> Option<&[f32]> {
        self.inputs
            .iter()
            .find(|(c, _)| c == cluster)
            .map(|(_, v)| v.as_slice())
    }

    pub fn outputs_of(&self, cluster: &Cluster) -> Option<&[f32]> {
        self.outputs
            .iter()
            .find(|(c, _)| c == cluster)
            .map(|(_, v)| v.as_slice())
    }

    pub fn input_entries(&self) -> impl Iterator<Item = (&Cluster, &[f32])> {
        self.inputs.iter().map(|(c, v)| (c, v.as_slice()))
    }

    pub fn output_entries(&self) -> impl Iterator<Item = (&Cluster, &[f32])> {
        self.outputs.iter().map(|(c, v)| (c, v.as_slice()))
    }
}

/// An indexable collection of patterns: the exchange format between an
/// external corpus loader and the learning engine.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        PatternSet::default()
    }

    pub fn from_patterns(patterns: Vec<Pattern>) -> Self {
        PatternSet { patterns }
    }

    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
