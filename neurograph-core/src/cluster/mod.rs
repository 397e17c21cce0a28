//! # Cluster module (`cluster`)
//!
//! A [`Cluster`] is a named group of neuron-like units sharing one transfer
//! function: an input port vector, an output port vector, and per-kind
//! state. The kind family is a closed sum type (`Simple`, `Biased`, `Fake`,
//! `Dde`) dispatched by pattern matching.
//!
//! `Cluster` itself is a cheap-clone handle (`Arc<RwLock<ClusterData>>`);
//! identity is pointer identity, so two handles compare equal exactly when
//! they designate the same cluster. Linkers, nets and learning algorithms
//! all hold handle clones rather than owning the cluster.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use rand::Rng;

use crate::algebra::Vector;
use crate::error::NeuroGraphError;
use crate::props::PropertyMap;
use crate::transfer::TransferFunction;

/// Discriminant of the closed cluster family, used as registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterTag {
    Simple,
    Biased,
    Fake,
    Dde,
}

impl ClusterTag {
    pub fn type_name(&self) -> &'static str {
        match self {
            ClusterTag::Simple => "simple",
            ClusterTag::Biased => "biased",
            ClusterTag::Fake => "fake",
            ClusterTag::Dde => "dde",
        }
    }
}

#[derive(Debug)]
enum ClusterKind {
    /// Stateless: output = transfer(input).
    Simple,
    /// Learned bias vector, subtracted pre-transfer. `net` retains the
    /// pre-transfer values the derivative is evaluated at.
    Biased { biases: Vector, net: Vector },
    /// Pure relay: the output port is a view of the input port.
    Fake,
    /// Discrete-derivative recurrence over the cluster's own past outputs:
    /// `y_t = c0 * f(x_t) + sum_k c_k * delta^(k-1)(y)` with
    /// `delta^0(y) = y_(t-1)`, higher terms iterated backward differences.
    Dde {
        coefficients: Vector,
        drive: Vector,
        history: VecDeque<Vec<f32>>,
    },
}

#[derive(Debug)]
struct ClusterData {
    name: String,
    size: usize,
    inputs: Vector,
    outputs: Vector,
    transfer: TransferFunction,
    accumulate: bool,
    needs_reset: bool,
    kind: ClusterKind,
}

/// Handle to a cluster. Cloning the handle aliases the cluster.
#[derive(Debug, Clone)]
pub struct Cluster {
    data: Arc<RwLock<ClusterData>>,
}

impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Cluster {}

impl Cluster {
    fn from_data(data: ClusterData) -> Self {
        Cluster {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Creates a stateless cluster.
    pub fn simple(name: &str, size: usize, transfer: TransferFunction) -> Self {
        Cluster::from_data(ClusterData {
            name: name.to_string(),
            size,
            inputs: Vector::new(size),
            outputs: Vector::new(size),
            transfer,
            accumulate: false,
            needs_reset: false,
            kind: ClusterKind::Simple,
        })
    }

    /// Creates a cluster with a learned bias vector, subtracted from the
    /// inputs before the transfer function is applied.
    pub fn biased(name: &str, size: usize, transfer: TransferFunction) -> Self {
        Cluster::from_data(ClusterData {
            name: name.to_string(),
            size,
            inputs: Vector::new(size),
            outputs: Vector::new(size),
            transfer,
            accumulate: false,
            needs_reset: false,
            kind: ClusterKind::Biased {
                biases: Vector::new(size),
                net: Vector::new(size),
            },
        })
    }

    /// Creates a relay cluster whose output port *is* its input port:
    /// writes to the input are visible through the output with no
    /// `update()` call. Such a cluster never asks to be reset.
    pub fn fake(name: &str, size: usize) -> Self {
        let inputs = Vector::new(size);
        let outputs = inputs
            .view(0, size)
            .expect("whole-buffer view cannot fail");
        Cluster::from_data(ClusterData {
            name: name.to_string(),
            size,
            inputs,
            outputs,
            transfer: TransferFunction::Identity,
            accumulate: false,
            needs_reset: false,
            kind: ClusterKind::Fake,
        })
    }

    /// Creates a discrete-derivative cluster. `coefficients[0]` weighs the
    /// current transfer drive, `coefficients[k]` the (k-1)-th backward
    /// difference of the cluster's own output history.
    pub fn dde(
        name: &str,
        size: usize,
        transfer: TransferFunction,
        coefficients: Vec<f32>,
    ) -> Self {
        Cluster::from_data(ClusterData {
            name: name.to_string(),
            size,
            inputs: Vector::new(size),
            outputs: Vector::new(size),
            transfer,
            accumulate: false,
            needs_reset: false,
            kind: ClusterKind::Dde {
                coefficients: Vector::from_vec(coefficients),
                drive: Vector::new(size),
                history: VecDeque::new(),
            },
        })
    }

    /// Stable identity of the cluster (pointer identity of its data).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    pub fn name(&self) -> String {
        self.data.read().unwrap().name.clone()
    }

    /// Number of neuron-like units.
    pub fn size(&self) -> usize {
        self.data.read().unwrap().size
    }

    pub fn tag(&self) -> ClusterTag {
        match self.data.read().unwrap().kind {
            ClusterKind::Simple => ClusterTag::Simple,
            ClusterKind::Biased { .. } => ClusterTag::Biased,
            ClusterKind::Fake => ClusterTag::Fake,
            ClusterKind::Dde { .. } => ClusterTag::Dde,
        }
    }

    /// Handle to the input port. The handle stays live: linkers add into it
    /// directly.
    pub fn inputs(&self) -> Vector {
        self.data.read().unwrap().inputs.clone()
    }

    /// Handle to the output port. For a `Fake` cluster this aliases the
    /// input port.
    pub fn outputs(&self) -> Vector {
        self.data.read().unwrap().outputs.clone()
    }

    /// The values the transfer function was (or will be) evaluated at:
    /// the bias-corrected net for `Biased` clusters, the raw inputs for
    /// every other kind. Backpropagation differentiates here.
    pub fn pre_transfer(&self) -> Vector {
        let d = self.data.read().unwrap();
        match &d.kind {
            ClusterKind::Biased { net, .. } => net.clone(),
            _ => d.inputs.clone(),
        }
    }

    pub fn transfer(&self) -> TransferFunction {
        self.data.read().unwrap().transfer.clone()
    }

    pub fn set_transfer(&self, transfer: TransferFunction) {
        self.data.write().unwrap().transfer = transfer;
    }

    /// The learned bias vector, when the kind has one.
    pub fn biases(&self) -> Option<Vector> {
        match &self.data.read().unwrap().kind {
            ClusterKind::Biased { biases, .. } => Some(biases.clone()),
            _ => None,
        }
    }

    /// The derivative coefficients, when the kind has them.
    pub fn coefficients(&self) -> Option<Vector> {
        match &self.data.read().unwrap().kind {
            ClusterKind::Dde { coefficients, .. } => Some(coefficients.clone()),
            _ => None,
        }
    }

    pub fn is_accumulate(&self) -> bool {
        self.data.read().unwrap().accumulate
    }

    /// With accumulation enabled the input port is never reset between
    /// steps: every feeding linker adds on top of what is already there.
    pub fn set_accumulate(&self, accumulate: bool) {
        self.data.write().unwrap().accumulate = accumulate;
    }

    /// True when the input buffer holds stale values the *next* feeding
    /// linker must clear before adding. Always false while accumulation is
    /// on, and permanently false for `Fake` clusters.
    pub fn needs_reset(&self) -> bool {
        let d = self.data.read().unwrap();
        d.needs_reset && !d.accumulate
    }

    /// Cooperative half of the reset-before-accumulate contract: zeroes the
    /// input port and clears the flag, if the flag was set. Called by every
    /// feeding linker before it adds its contribution.
    pub fn reset_needed_inputs(&self) {
        let inputs = {
            let mut d = self.data.write().unwrap();
            if !(d.needs_reset && !d.accumulate) {
                return;
            }
            d.needs_reset = false;
            d.inputs.clone()
        };
        inputs.zero();
    }

    /// Convenience write of the whole input port.
    pub fn set_inputs(&self, values: &[f32]) {
        self.inputs().assign_slice(values);
    }

    /// Applies the transfer function to the input port and writes the
    /// output port, then flags the inputs as stale for the next feeding
    /// linker. `Fake` clusters relay and do nothing here.
    pub fn update(&self) {
        let mut d = self.data.write().unwrap();
        let ClusterData {
            inputs,
            outputs,
            transfer,
            needs_reset,
            kind,
            size,
            ..
        } = &mut *d;
        match kind {
            ClusterKind::Simple => {
                transfer.apply(inputs, outputs);
                *needs_reset = true;
            }
            ClusterKind::Biased { biases, net } => {
                net.assign(inputs);
                net.sub_(biases);
                transfer.apply(net, outputs);
                *needs_reset = true;
            }
            ClusterKind::Fake => {
                // Relay: outputs aliases inputs, nothing to do and no reset.
            }
            ClusterKind::Dde {
                coefficients,
                drive,
                history,
            } => {
                transfer.apply(inputs, drive);
                let coeffs = coefficients.to_vec();
                let mut out = vec![0.0f32; *size];
                if let Some(c0) = coeffs.first() {
                    let dv = drive.to_vec();
                    for (o, d) in out.iter_mut().zip(dv.iter()) {
                        *o += c0 * d;
                    }
                }
                // Higher coefficients weigh iterated backward differences
                // of the output history, most recent first.
                let mut level: Vec<Vec<f32>> = history.iter().cloned().collect();
                for ck in coeffs.iter().skip(1) {
                    if level.is_empty() {
                        break;
                    }
                    for (o, h) in out.iter_mut().zip(level[0].iter()) {
                        *o += ck * h;
                    }
                    let mut next = Vec::with_capacity(level.len().saturating_sub(1));
                    for j in 0..level.len().saturating_sub(1) {
                        next.push(
                            level[j]
                                .iter()
                                .zip(level[j + 1].iter())
                                .map(|(a, b)| a - b)
                                .collect(),
                        );
                    }
                    level = next;
                }
                outputs.assign_slice(&out);
                history.push_front(out);
                history.truncate(coeffs.len().saturating_sub(1).max(1));
                *needs_reset = true;
            }
        }
    }

    /// Re-draws the learnable parameters uniformly from `[min, max]`:
    /// biases for `Biased`, coefficients for `Dde`, a no-op for the
    /// parameter-less kinds.
    pub fn randomize<R: Rng>(&self, min: f32, max: f32, rng: &mut R) {
        let d = self.data.read().unwrap();
        match &d.kind {
            ClusterKind::Biased { biases, .. } => biases.randomize(min, max, rng),
            ClusterKind::Dde { coefficients, .. } => coefficients.randomize(min, max, rng),
            ClusterKind::Simple | ClusterKind::Fake => {}
        }
    }

    // --- Named-property schema ---

    /// Saves the cluster as named properties. `Biased` persists a
    /// whitespace-separated `biases` list, `Dde` a `coefficients` list.
    pub fn save_properties(&self) -> PropertyMap {
        let d = self.data.read().unwrap();
        let mut props = PropertyMap::new();
        props.set(
            "type",
            match d.kind {
                ClusterKind::Simple => "simple",
                ClusterKind::Biased { .. } => "biased",
                ClusterKind::Fake => "fake",
                ClusterKind::Dde { .. } => "dde",
            },
        );
        props.set("name", &d.name);
        props.set("size", d.size);
        props.set("accumulate", d.accumulate);
        props.merge_prefixed("transfer", &d.transfer.save_properties());
        match &d.kind {
            ClusterKind::Biased { biases, .. } => {
                props.set_reals("biases", &biases.to_vec());
            }
            ClusterKind::Dde { coefficients, .. } => {
                props.set_reals("coefficients", &coefficients.to_vec());
            }
            _ => {}
        }
        props
    }

    /// Rebuilds a cluster from its named properties.
    pub fn from_properties(props: &PropertyMap) -> Result<Self, NeuroGraphError> {
        let name = props.require("name")?;
        let size: usize = props.require_parsed("size")?;
        let transfer = TransferFunction::from_properties(&props.sub_map("transfer"))?;
        let cluster = match props.require("type")? {
            "simple" => Cluster::simple(name, size, transfer),
            "biased" => {
                let cluster = Cluster::biased(name, size, transfer);
                let biases = props.require_reals("biases")?;
                if biases.len() != size {
                    return Err(NeuroGraphError::SizeMismatch {
                        expected: size,
                        actual: biases.len(),
                        operation: "Cluster::from_properties(biases)".to_string(),
                    });
                }
                cluster
                    .biases()
                    .expect("biased cluster has biases")
                    .assign_slice(&biases);
                cluster
            }
            "fake" => Cluster::fake(name, size),
            "dde" => {
                let coefficients = props.require_reals("coefficients")?;
                Cluster::dde(name, size, transfer, coefficients)
            }
            other => {
                return Err(NeuroGraphError::UnknownType {
                    type_name: other.to_string(),
                    operation: "Cluster::from_properties".to_string(),
                })
            }
        };
        if let Some(acc) = props.get("accumulate") {
            cluster.set_accumulate(acc == "true");
        }
        Ok(cluster)
    }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
