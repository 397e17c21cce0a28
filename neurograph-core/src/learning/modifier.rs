// src/learning/modifier.rs
//
// The per-type update-rule dispatch table. Every learnable concrete kind
// binds to exactly one Modifier applying the delta rule
// `params += rate * (x outer y)` to that entity's own parameter store;
// parameter-less kinds bind to a no-op so the learning loop dispatches
// uniformly without special cases.
//
// The registry is an explicit value built at startup and threaded by
// reference into the backprop engine; there is no process-wide mutable
// table.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::algebra::{Matrix, Vector};
use crate::cluster::{Cluster, ClusterTag};
use crate::linker::{Linker, LinkerTag};

/// A delta-rule update bound to one entity's parameter store.
pub trait Modifier: Debug {
    /// Applies `params += rate * (x outer y)`, masking if applicable.
    fn rule(&self, rate: f32, x: &Vector, y: &Vector);
}

/// No-op rule for parameter-less entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullModifier;

impl Modifier for NullModifier {
    fn rule(&self, _rate: f32, _x: &Vector, _y: &Vector) {}
}

/// Updates a learned bias vector. The engine passes the -1-vector as `x`,
/// so the same rate sign serves bias-like and weight-like parameters.
#[derive(Debug)]
pub struct BiasModifier {
    biases: Vector,
}

impl BiasModifier {
    pub fn new(biases: Vector) -> Self {
        BiasModifier { biases }
    }
}

impl Modifier for BiasModifier {
    fn rule(&self, rate: f32, x: &Vector, y: &Vector) {
        self.biases.delta_rule(rate, x, y);
    }
}

/// Updates a dense weight matrix.
#[derive(Debug)]
pub struct DotModifier {
    weights: Matrix,
}

impl DotModifier {
    pub fn new(weights: Matrix) -> Self {
        DotModifier { weights }
    }
}

impl Modifier for DotModifier {
    fn rule(&self, rate: f32, x: &Vector, y: &Vector) {
        self.weights.delta_rule(rate, x, y);
    }
}

/// Updates a masked weight matrix: disconnected positions stay exactly zero.
#[derive(Debug)]
pub struct SparseModifier {
    weights: Matrix,
    mask: Arc<RwLock<Vec<bool>>>,
}

impl SparseModifier {
    pub fn new(weights: Matrix, mask: Arc<RwLock<Vec<bool>>>) -> Self {
        SparseModifier { weights, mask }
    }
}

impl Modifier for SparseModifier {
    fn rule(&self, rate: f32, x: &Vector, y: &Vector) {
        let mask = self.mask.read().unwrap();
        self.weights.delta_rule_masked(rate, x, y, &mask);
    }
}

type ClusterFactory = fn(&Cluster) -> Box<dyn Modifier>;
type LinkerFactory = fn(&Linker) -> Box<dyn Modifier>;

fn null_cluster_modifier(_cluster: &Cluster) -> Box<dyn Modifier> {
    Box::new(NullModifier)
}

fn null_linker_modifier(_linker: &Linker) -> Box<dyn Modifier> {
    Box::new(NullModifier)
}

fn biased_cluster_modifier(cluster: &Cluster) -> Box<dyn Modifier> {
    match cluster.biases() {
        Some(biases) => Box::new(BiasModifier::new(biases)),
        None => Box::new(NullModifier),
    }
}

fn dot_linker_modifier(linker: &Linker) -> Box<dyn Modifier> {
    match linker.weights() {
        Some(weights) => Box::new(DotModifier::new(weights)),
        None => Box::new(NullModifier),
    }
}

fn sparse_linker_modifier(linker: &Linker) -> Box<dyn Modifier> {
    match (linker.weights(), linker.mask_handle()) {
        (Some(weights), Some(mask)) => Box::new(SparseModifier::new(weights, mask)),
        _ => Box::new(NullModifier),
    }
}

/// Type-keyed table mapping each concrete kind to the factory producing its
/// Modifier. Lookup for an unregistered kind falls back to the no-op rule,
/// which is how distance-based linkers stay out of gradient learning.
#[derive(Debug, Clone)]
pub struct ModifierRegistry {
    cluster_factories: HashMap<ClusterTag, ClusterFactory>,
    linker_factories: HashMap<LinkerTag, LinkerFactory>,
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        ModifierRegistry::standard()
    }
}

impl ModifierRegistry {
    /// An empty registry: every lookup resolves to the no-op rule.
    pub fn empty() -> Self {
        ModifierRegistry {
            cluster_factories: HashMap::new(),
            linker_factories: HashMap::new(),
        }
    }

    /// The standard bindings: `Biased` clusters and `Dot`/`Sparse` linkers
    /// learn; everything parameter-less is a registered no-op; `Norm` has
    /// no entry at all (its propagation is non-linear in the weights).
    pub fn standard() -> Self {
        let mut registry = ModifierRegistry::empty();
        registry.register_cluster(ClusterTag::Simple, null_cluster_modifier);
        registry.register_cluster(ClusterTag::Biased, biased_cluster_modifier);
        registry.register_cluster(ClusterTag::Fake, null_cluster_modifier);
        registry.register_cluster(ClusterTag::Dde, null_cluster_modifier);
        registry.register_linker(LinkerTag::Dot, dot_linker_modifier);
        registry.register_linker(LinkerTag::Sparse, sparse_linker_modifier);
        registry.register_linker(LinkerTag::Copy, null_linker_modifier);
        registry
    }

    /// Binds (or rebinds) the factory for a cluster kind.
    pub fn register_cluster(&mut self, tag: ClusterTag, factory: ClusterFactory) {
        self.cluster_factories.insert(tag, factory);
    }

    /// Binds (or rebinds) the factory for a linker kind.
    pub fn register_linker(&mut self, tag: LinkerTag, factory: LinkerFactory) {
        self.linker_factories.insert(tag, factory);
    }

    /// The Modifier bound to this cluster's kind.
    pub fn modifier_for_cluster(&self, cluster: &Cluster) -> Box<dyn Modifier> {
        match self.cluster_factories.get(&cluster.tag()) {
            Some(factory) => factory(cluster),
            None => Box::new(NullModifier),
        }
    }

    /// The Modifier bound to this linker's kind.
    pub fn modifier_for_linker(&self, linker: &Linker) -> Box<dyn Modifier> {
        match self.linker_factories.get(&linker.tag()) {
            Some(factory) => factory(linker),
            None => Box::new(NullModifier),
        }
    }
}

#[cfg(test)]
#[path = "modifier_test.rs"]
mod tests;
