// src/learning/backprop.rs
//
// Hand-written reverse-mode differentiation over the caller-ordered graph.
// The engine borrows the net (the graph must outlive the algorithm) and
// owns per-tracked-cluster delta accumulators plus per-edge momentum
// history. Deltas are `desired - actual`, so descent applies the delta
// rule with `+learn_rate`; the -1-vector makes bias updates share that
// sign with weight updates.

use std::collections::HashMap;

use crate::algebra::Vector;
use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::learning::modifier::{Modifier, ModifierRegistry};
use crate::learning::pattern::Pattern;
use crate::linker::{CopyMode, Linker, LinkerTag};
use crate::net::{NeuralNet, Updatable};

struct TrackedLinker {
    linker: Linker,
    modifier: Box<dyn Modifier>,
    /// Previous step's `(origin outputs, destination input delta)` pair,
    /// kept only while momentum is on.
    prev_pair: Option<(Vec<f32>, Vec<f32>)>,
}

struct TrackedCluster {
    cluster: Cluster,
    is_output: bool,
    /// Accumulates deltas flowing into this cluster's output side.
    output_delta: Vector,
    /// `output_delta` pulled through the local transfer derivative.
    input_delta: Vector,
    /// Scratch for the derivative values.
    deriv: Vector,
    minus_one: Vector,
    modifier: Box<dyn Modifier>,
    prev_delta: Option<Vec<f32>>,
    /// Tracked linkers whose destination is this cluster.
    incoming: Vec<TrackedLinker>,
}

/// The backpropagation engine: forward pass, reverse delta propagation and
/// parameter update via the modifier registry, over a caller-supplied
/// backprop order (conventionally the reverse of the forward order).
pub struct BackPropagationAlgo<'a> {
    net: &'a NeuralNet,
    order: Vec<Updatable>,
    learn_rate: f32,
    momentum: f32,
    use_momentum: bool,
    tracked: Vec<TrackedCluster>,
    /// cluster id -> index into `tracked`
    index: HashMap<usize, usize>,
}

impl<'a> BackPropagationAlgo<'a> {
    /// Builds the engine and its tracked set: seeded with every declared
    /// output cluster, then grown by walking `order` and registering every
    /// cluster and every linker whose destination is already tracked.
    /// Anything feeding the tracked set without being tracked itself is
    /// silently skipped; deltas stop at the tracked frontier.
    ///
    /// # Errors
    /// `NotMember` if an order element does not belong to `net`.
    pub fn new(
        net: &'a NeuralNet,
        order: Vec<Updatable>,
        learn_rate: f32,
        registry: &ModifierRegistry,
    ) -> Result<Self, NeuroGraphError> {
        let mut algo = BackPropagationAlgo {
            net,
            order: Vec::new(),
            learn_rate,
            momentum: 0.0,
            use_momentum: false,
            tracked: Vec::new(),
            index: HashMap::new(),
        };
        algo.set_order(order, registry)?;
        Ok(algo)
    }

    /// Replaces the backprop order and rebuilds the tracked set (momentum
    /// history included: a new order means new bookkeeping).
    pub fn set_order(
        &mut self,
        order: Vec<Updatable>,
        registry: &ModifierRegistry,
    ) -> Result<(), NeuroGraphError> {
        for u in &order {
            let member = match u {
                Updatable::Cluster(c) => self.net.contains_cluster(c),
                Updatable::Linker(l) => self.net.contains_linker(l),
            };
            if !member {
                return Err(NeuroGraphError::NotMember {
                    name: u.name(),
                    operation: "BackPropagationAlgo::set_order".to_string(),
                });
            }
        }
        self.order = order;
        self.build_tracked(registry);
        Ok(())
    }

    fn build_tracked(&mut self, registry: &ModifierRegistry) {
        self.tracked.clear();
        self.index.clear();

        for cluster in self.net.output_clusters() {
            self.track_cluster(cluster, registry);
        }
        let order = self.order.clone();
        for u in &order {
            match u {
                Updatable::Cluster(c) => self.track_cluster(c, registry),
                Updatable::Linker(l) => self.track_linker(l, registry),
            }
        }
        log::debug!(
            "backprop tracking {} clusters over an order of {} elements",
            self.tracked.len(),
            self.order.len()
        );
    }

    fn track_cluster(&mut self, cluster: &Cluster, registry: &ModifierRegistry) {
        if self.index.contains_key(&cluster.id()) {
            return;
        }
        let size = cluster.size();
        self.index.insert(cluster.id(), self.tracked.len());
        self.tracked.push(TrackedCluster {
            is_output: self.net.is_output(cluster),
            output_delta: Vector::new(size),
            input_delta: Vector::new(size),
            deriv: Vector::new(size),
            minus_one: Vector::filled(size, -1.0),
            modifier: registry.modifier_for_cluster(cluster),
            prev_delta: None,
            incoming: Vec::new(),
            cluster: cluster.clone(),
        });
    }

    fn track_linker(&mut self, linker: &Linker, registry: &ModifierRegistry) {
        let Some(&dest) = self.index.get(&linker.to().id()) else {
            // Destination untracked: the linker stays outside the frontier.
            return;
        };
        let already = self.tracked[dest]
            .incoming
            .iter()
            .any(|tl| tl.linker == *linker);
        if already {
            return;
        }
        self.tracked[dest].incoming.push(TrackedLinker {
            modifier: registry.modifier_for_linker(linker),
            prev_pair: None,
            linker: linker.clone(),
        });
    }

    pub fn learn_rate(&self) -> f32 {
        self.learn_rate
    }

    pub fn set_learn_rate(&mut self, learn_rate: f32) {
        self.learn_rate = learn_rate;
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn is_using_momentum(&self) -> bool {
        self.use_momentum
    }

    /// Turns the momentum term on. Any history left over from an earlier
    /// momentum phase is dropped, never reused.
    pub fn enable_momentum(&mut self, momentum: f32) {
        self.momentum = momentum;
        self.use_momentum = true;
        for t in &mut self.tracked {
            t.prev_delta = None;
            for tl in &mut t.incoming {
                tl.prev_pair = None;
            }
        }
    }

    /// Turns the momentum term off. Updates already applied stay as they
    /// are; only future steps lose the extra term.
    pub fn disable_momentum(&mut self) {
        self.use_momentum = false;
    }

    /// Sets a tracked cluster's output delta to `desired - actual`.
    /// Returns false (leaving nothing changed) for untracked clusters.
    pub fn set_teaching_input(&mut self, cluster: &Cluster, desired: &[f32]) -> bool {
        let Some(&i) = self.index.get(&cluster.id()) else {
            return false;
        };
        let t = &self.tracked[i];
        t.output_delta.assign_slice(desired);
        t.output_delta.sub_(&t.cluster.outputs());
        true
    }

    /// The current output delta of a tracked cluster.
    pub fn get_error(&self, cluster: &Cluster) -> Option<Vec<f32>> {
        self.index
            .get(&cluster.id())
            .map(|&i| self.tracked[i].output_delta.to_vec())
    }

    /// One supervised step: assign the pattern's inputs, run the forward
    /// pass, set teaching input on the pattern's output clusters, then run
    /// the three learning phases (reset, backward, apply).
    pub fn learn(&mut self, pattern: &Pattern) {
        for (cluster, values) in pattern.input_entries() {
            cluster.set_inputs(values);
        }
        self.net.step();
        for (cluster, desired) in pattern.output_entries() {
            if !self.set_teaching_input(cluster, desired) {
                log::warn!(
                    "learn: pattern output cluster '{}' is not tracked",
                    cluster.name()
                );
            }
        }
        self.back_step();
    }

    /// Forward pass plus mean squared error over the pattern's output
    /// entries. Touches no parameter and no delta accumulator.
    pub fn calculate_mse(&self, pattern: &Pattern) -> f32 {
        for (cluster, values) in pattern.input_entries() {
            cluster.set_inputs(values);
        }
        self.net.step();

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for (cluster, desired) in pattern.output_entries() {
            let actual = cluster.outputs().to_vec();
            for (d, a) in desired.iter().zip(actual.iter()) {
                let e = d - a;
                sum += e * e;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// The three ordered learning phases, run after teaching inputs were
    /// set on the output clusters.
    fn back_step(&mut self) {
        // Phase 1, reset: non-output accumulators start the step at zero;
        // output accumulators hold the freshly set teaching deltas.
        for t in &self.tracked {
            if !t.is_output {
                t.output_delta.zero();
            }
        }

        // Phase 2, backward propagation, in tracked order: convert each
        // cluster's output delta into an input delta through the local
        // transfer derivative (identity when none is defined), then push it
        // through every tracked incoming linker into the origin's output
        // delta. Matrix-backed linkers use the transpose of the forward
        // product; copies whose source port is the origin's output pass the
        // overlapping prefix straight back.
        for i in 0..self.tracked.len() {
            let t = &self.tracked[i];
            let transfer = t.cluster.transfer();
            t.input_delta.assign(&t.output_delta);
            if transfer.derivate(&t.cluster.pre_transfer(), &t.cluster.outputs(), &t.deriv) {
                t.input_delta.mul_(&t.deriv);
            }

            for tl in &t.incoming {
                let Some(&origin) = self.index.get(&tl.linker.from().id()) else {
                    continue;
                };
                let origin_delta = self.tracked[origin].output_delta.clone();
                match tl.linker.tag() {
                    LinkerTag::Dot | LinkerTag::Sparse | LinkerTag::Norm => {
                        let weights = tl.linker.weights().expect("matrix-backed linker");
                        weights.right_mul_acc(&t.input_delta, &origin_delta);
                    }
                    LinkerTag::Copy => {
                        let source_delta = match tl.linker.copy_mode() {
                            Some(CopyMode::Out2In) => Some(&t.input_delta),
                            Some(CopyMode::Out2Out) => Some(&t.output_delta),
                            // An In2* copy reads the origin's *input* port;
                            // the engine only models output-side deltas.
                            _ => None,
                        };
                        if let Some(delta) = source_delta {
                            let n = delta.len().min(origin_delta.len());
                            if n > 0 {
                                let dst = origin_delta.view(0, n).expect("prefix view");
                                let src = delta.view(0, n).expect("prefix view");
                                dst.add_(&src);
                            }
                        }
                    }
                }
            }
        }

        // Phase 3, apply: descent through each entity's modifier, with the
        // optional one-step-lookback momentum term.
        let rate = self.learn_rate;
        let momentum_rate = self.learn_rate * self.momentum;
        let use_momentum = self.use_momentum;
        for t in &mut self.tracked {
            t.modifier.rule(rate, &t.minus_one, &t.input_delta);
            if use_momentum {
                if let Some(prev) = &t.prev_delta {
                    t.modifier
                        .rule(momentum_rate, &t.minus_one, &Vector::from_vec(prev.clone()));
                }
                t.prev_delta = Some(t.input_delta.to_vec());
            }

            for tl in &mut t.incoming {
                let x = tl.linker.from().outputs();
                tl.modifier.rule(rate, &x, &t.input_delta);
                if use_momentum {
                    if let Some((px, py)) = &tl.prev_pair {
                        tl.modifier.rule(
                            momentum_rate,
                            &Vector::from_vec(px.clone()),
                            &Vector::from_vec(py.clone()),
                        );
                    }
                    tl.prev_pair = Some((x.to_vec(), t.input_delta.to_vec()));
                }
            }
        }
    }
}

impl std::fmt::Debug for BackPropagationAlgo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackPropagationAlgo")
            .field("learn_rate", &self.learn_rate)
            .field("momentum", &self.momentum)
            .field("use_momentum", &self.use_momentum)
            .field("tracked", &self.tracked.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "backprop_test.rs"]
mod tests;
