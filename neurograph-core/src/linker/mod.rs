//! # Linker module (`linker`)
//!
//! A [`Linker`] is a directed edge from one cluster to another. The kind
//! family is a closed sum type: `Dot` (dense weight matrix), `Norm`
//! (distance-based propagation over the same matrix shape), `Sparse`
//! (weight matrix gated by a boolean connectivity mask) and `Copy`
//! (unweighted add-copy between a designated port pair).
//!
//! Every `update()` honors the reset-before-accumulate contract of the
//! destination cluster: check `needs_reset()`, zero the destination inputs
//! and clear the flag if set, then *add* the contribution. Two linkers
//! feeding the same cluster therefore sum, and the first one in the update
//! order clears stale values when the cluster asks for it.

use std::sync::{Arc, RwLock};

use rand::Rng;

use crate::algebra::Matrix;
use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::net::NeuralNet;
use crate::props::PropertyMap;

/// Discriminant of the closed linker family, used as registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkerTag {
    Dot,
    Norm,
    Sparse,
    Copy,
}

impl LinkerTag {
    pub fn type_name(&self) -> &'static str {
        match self {
            LinkerTag::Dot => "dot",
            LinkerTag::Norm => "norm",
            LinkerTag::Sparse => "sparse",
            LinkerTag::Copy => "copy",
        }
    }
}

/// Port pair copied by a `Copy` linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    In2In,
    In2Out,
    Out2In,
    Out2Out,
}

impl CopyMode {
    pub fn type_name(&self) -> &'static str {
        match self {
            CopyMode::In2In => "in2in",
            CopyMode::In2Out => "in2out",
            CopyMode::Out2In => "out2in",
            CopyMode::Out2Out => "out2out",
        }
    }

    fn from_name(name: &str) -> Result<Self, NeuroGraphError> {
        match name {
            "in2in" => Ok(CopyMode::In2In),
            "in2out" => Ok(CopyMode::In2Out),
            "out2in" => Ok(CopyMode::Out2In),
            "out2out" => Ok(CopyMode::Out2Out),
            other => Err(NeuroGraphError::UnknownType {
                type_name: other.to_string(),
                operation: "CopyMode::from_name".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
enum LinkerKind {
    Dot {
        weights: Matrix,
    },
    Norm {
        weights: Matrix,
    },
    Sparse {
        weights: Matrix,
        mask: Arc<RwLock<Vec<bool>>>,
    },
    Copy {
        mode: CopyMode,
    },
}

#[derive(Debug)]
struct LinkerData {
    name: String,
    from: Cluster,
    to: Cluster,
    kind: LinkerKind,
}

/// Handle to a linker. Cloning the handle aliases the linker.
#[derive(Debug, Clone)]
pub struct Linker {
    data: Arc<RwLock<LinkerData>>,
}

impl PartialEq for Linker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Linker {}

impl Linker {
    fn from_data(data: LinkerData) -> Self {
        Linker {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Dense weighted edge: `to.inputs += from.outputs^T * W`, with `W`
    /// sized `from.size x to.size` and zero-initialized.
    pub fn dot(name: &str, from: &Cluster, to: &Cluster) -> Self {
        let weights = Matrix::new(from.size(), to.size());
        Linker::from_data(LinkerData {
            name: name.to_string(),
            from: from.clone(),
            to: to.clone(),
            kind: LinkerKind::Dot { weights },
        })
    }

    /// Distance-based edge: for every destination unit j,
    /// `to.inputs[j] += || from.outputs - W[:, j] ||`. Non-linear in the
    /// weights, so it takes no part in gradient learning.
    pub fn norm(name: &str, from: &Cluster, to: &Cluster) -> Self {
        let weights = Matrix::new(from.size(), to.size());
        Linker::from_data(LinkerData {
            name: name.to_string(),
            from: from.clone(),
            to: to.clone(),
            kind: LinkerKind::Norm { weights },
        })
    }

    /// Dense edge gated by a boolean connectivity mask. The mask starts
    /// fully connected; positions disconnected later are forced to zero and
    /// stay zero through every write.
    pub fn sparse(name: &str, from: &Cluster, to: &Cluster) -> Self {
        let weights = Matrix::new(from.size(), to.size());
        let mask = vec![true; from.size() * to.size()];
        Linker::from_data(LinkerData {
            name: name.to_string(),
            from: from.clone(),
            to: to.clone(),
            kind: LinkerKind::Sparse {
                weights,
                mask: Arc::new(RwLock::new(mask)),
            },
        })
    }

    /// Unweighted add-copy of the common-length prefix between the chosen
    /// port pair.
    pub fn copy(name: &str, from: &Cluster, to: &Cluster, mode: CopyMode) -> Self {
        Linker::from_data(LinkerData {
            name: name.to_string(),
            from: from.clone(),
            to: to.clone(),
            kind: LinkerKind::Copy { mode },
        })
    }

    /// Stable identity of the linker (pointer identity of its data).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    pub fn name(&self) -> String {
        self.data.read().unwrap().name.clone()
    }

    pub fn from(&self) -> Cluster {
        self.data.read().unwrap().from.clone()
    }

    pub fn to(&self) -> Cluster {
        self.data.read().unwrap().to.clone()
    }

    pub fn tag(&self) -> LinkerTag {
        match self.data.read().unwrap().kind {
            LinkerKind::Dot { .. } => LinkerTag::Dot,
            LinkerKind::Norm { .. } => LinkerTag::Norm,
            LinkerKind::Sparse { .. } => LinkerTag::Sparse,
            LinkerKind::Copy { .. } => LinkerTag::Copy,
        }
    }

    /// Handle to the weight matrix, when the kind has one.
    pub fn weights(&self) -> Option<Matrix> {
        match &self.data.read().unwrap().kind {
            LinkerKind::Dot { weights }
            | LinkerKind::Norm { weights }
            | LinkerKind::Sparse { weights, .. } => Some(weights.clone()),
            LinkerKind::Copy { .. } => None,
        }
    }

    pub fn copy_mode(&self) -> Option<CopyMode> {
        match &self.data.read().unwrap().kind {
            LinkerKind::Copy { mode } => Some(*mode),
            _ => None,
        }
    }

    /// Shared handle to the connectivity mask of a `Sparse` linker.
    pub(crate) fn mask_handle(&self) -> Option<Arc<RwLock<Vec<bool>>>> {
        match &self.data.read().unwrap().kind {
            LinkerKind::Sparse { mask, .. } => Some(Arc::clone(mask)),
            _ => None,
        }
    }

    /// Copy of the connectivity mask, row-major, for a `Sparse` linker.
    pub fn mask(&self) -> Option<Vec<bool>> {
        self.mask_handle().map(|m| m.read().unwrap().clone())
    }

    /// Reads one weight. Returns 0.0 for a weight-less linker.
    pub fn weight_at(&self, row: usize, col: usize) -> f32 {
        self.weights().map(|w| w.get(row, col)).unwrap_or(0.0)
    }

    /// Writes one weight. On a `Sparse` linker a write landing on a
    /// masked-out position is silently clamped to zero.
    pub fn set_weight(&self, row: usize, col: usize, value: f32) {
        let d = self.data.read().unwrap();
        match &d.kind {
            LinkerKind::Dot { weights } | LinkerKind::Norm { weights } => {
                weights.set(row, col, value);
            }
            LinkerKind::Sparse { weights, mask } => {
                let connected = mask.read().unwrap()[row * weights.cols() + col];
                weights.set(row, col, if connected { value } else { 0.0 });
            }
            LinkerKind::Copy { .. } => {
                log::warn!("set_weight on weight-less linker '{}'", d.name);
            }
        }
    }

    /// Connects or disconnects one position of a `Sparse` linker's mask and
    /// re-applies it to the matrix. A no-op for every other kind.
    pub fn set_connection(&self, row: usize, col: usize, connected: bool) {
        let d = self.data.read().unwrap();
        if let LinkerKind::Sparse { weights, mask } = &d.kind {
            mask.write().unwrap()[row * weights.cols() + col] = connected;
            if !connected {
                weights.set(row, col, 0.0);
            }
        }
    }

    pub fn connect(&self, row: usize, col: usize) {
        self.set_connection(row, col, true);
    }

    pub fn disconnect(&self, row: usize, col: usize) {
        self.set_connection(row, col, false);
    }

    /// Replaces the whole mask of a `Sparse` linker (row-major) and
    /// re-applies it, zeroing every newly disconnected weight.
    pub fn set_mask(&self, new_mask: &[bool]) {
        let d = self.data.read().unwrap();
        if let LinkerKind::Sparse { weights, mask } = &d.kind {
            debug_assert_eq!(
                new_mask.len(),
                weights.rows() * weights.cols(),
                "set_mask size mismatch"
            );
            let mut m = mask.write().unwrap();
            let n = m.len().min(new_mask.len());
            m[..n].copy_from_slice(&new_mask[..n]);
            apply_mask(weights, &m);
        }
    }

    /// Propagates from the origin's output port into the destination's
    /// input port, honoring the reset-before-accumulate contract.
    pub fn update(&self) {
        let d = self.data.read().unwrap();
        let from = d.from.clone();
        let to = d.to.clone();
        match &d.kind {
            LinkerKind::Dot { weights } | LinkerKind::Sparse { weights, .. } => {
                to.reset_needed_inputs();
                weights.left_mul_acc(&from.outputs(), &to.inputs());
            }
            LinkerKind::Norm { weights } => {
                to.reset_needed_inputs();
                weights.col_distance_acc(&from.outputs(), &to.inputs());
            }
            LinkerKind::Copy { mode } => {
                let src = match mode {
                    CopyMode::In2In | CopyMode::In2Out => from.inputs(),
                    CopyMode::Out2In | CopyMode::Out2Out => from.outputs(),
                };
                let dst = match mode {
                    CopyMode::In2In | CopyMode::Out2In => {
                        // The reset flag guards stale net input; it only
                        // applies when that is the port written.
                        to.reset_needed_inputs();
                        to.inputs()
                    }
                    CopyMode::In2Out | CopyMode::Out2Out => to.outputs(),
                };
                let n = src.len().min(dst.len());
                if n > 0 {
                    let dst_prefix = dst.view(0, n).expect("prefix view cannot fail");
                    let src_prefix = src.view(0, n).expect("prefix view cannot fail");
                    dst_prefix.add_(&src_prefix);
                }
            }
        }
    }

    /// Re-draws the weights uniformly from `[min, max]`; a `Sparse` linker
    /// re-applies its mask afterwards, a `Copy` linker has nothing to draw.
    pub fn randomize<R: Rng>(&self, min: f32, max: f32, rng: &mut R) {
        let d = self.data.read().unwrap();
        match &d.kind {
            LinkerKind::Dot { weights } | LinkerKind::Norm { weights } => {
                weights.randomize(min, max, rng);
            }
            LinkerKind::Sparse { weights, mask } => {
                weights.randomize(min, max, rng);
                apply_mask(weights, &mask.read().unwrap());
            }
            LinkerKind::Copy { .. } => {}
        }
    }

    // --- Named-property schema ---

    /// Saves the linker as named properties: endpoints by name, a row-major
    /// `weights` list for matrix-backed kinds, a 0/1 `mask` list for
    /// `Sparse`, the `mode` for `Copy`.
    pub fn save_properties(&self) -> PropertyMap {
        let d = self.data.read().unwrap();
        let mut props = PropertyMap::new();
        props.set(
            "type",
            match d.kind {
                LinkerKind::Dot { .. } => "dot",
                LinkerKind::Norm { .. } => "norm",
                LinkerKind::Sparse { .. } => "sparse",
                LinkerKind::Copy { .. } => "copy",
            },
        );
        props.set("name", &d.name);
        props.set("from", d.from.name());
        props.set("to", d.to.name());
        match &d.kind {
            LinkerKind::Dot { weights } | LinkerKind::Norm { weights } => {
                props.set_reals("weights", &weights.to_vec());
            }
            LinkerKind::Sparse { weights, mask } => {
                props.set_reals("weights", &weights.to_vec());
                let rendered: Vec<String> = mask
                    .read()
                    .unwrap()
                    .iter()
                    .map(|b| if *b { "1".to_string() } else { "0".to_string() })
                    .collect();
                props.set("mask", rendered.join(" "));
            }
            LinkerKind::Copy { mode } => {
                props.set("mode", mode.type_name());
            }
        }
        props
    }

    /// Rebuilds a linker from its named properties, resolving the `from`
    /// and `to` cluster names through `net`.
    pub fn from_properties(
        props: &PropertyMap,
        net: &NeuralNet,
    ) -> Result<Self, NeuroGraphError> {
        let name = props.require("name")?;
        let from_name = props.require("from")?;
        let from = net
            .find_cluster(from_name)
            .ok_or_else(|| NeuroGraphError::UnknownName {
                name: from_name.to_string(),
            })?;
        let to_name = props.require("to")?;
        let to = net
            .find_cluster(to_name)
            .ok_or_else(|| NeuroGraphError::UnknownName {
                name: to_name.to_string(),
            })?;

        let load_weights = |linker: &Linker| -> Result<(), NeuroGraphError> {
            let weights = props.require_reals("weights")?;
            let matrix = linker.weights().expect("matrix-backed linker");
            if weights.len() != matrix.rows() * matrix.cols() {
                return Err(NeuroGraphError::SizeMismatch {
                    expected: matrix.rows() * matrix.cols(),
                    actual: weights.len(),
                    operation: "Linker::from_properties(weights)".to_string(),
                });
            }
            matrix.assign_slice(&weights);
            Ok(())
        };

        let linker = match props.require("type")? {
            "dot" => {
                let linker = Linker::dot(name, &from, &to);
                load_weights(&linker)?;
                linker
            }
            "norm" => {
                let linker = Linker::norm(name, &from, &to);
                load_weights(&linker)?;
                linker
            }
            "sparse" => {
                let linker = Linker::sparse(name, &from, &to);
                load_weights(&linker)?;
                let raw = props.require("mask")?;
                let mask: Vec<bool> = raw.split_whitespace().map(|tok| tok == "1").collect();
                if mask.len() != from.size() * to.size() {
                    return Err(NeuroGraphError::SizeMismatch {
                        expected: from.size() * to.size(),
                        actual: mask.len(),
                        operation: "Linker::from_properties(mask)".to_string(),
                    });
                }
                linker.set_mask(&mask);
                linker
            }
            "copy" => {
                let mode = CopyMode::from_name(props.require("mode")?)?;
                Linker::copy(name, &from, &to, mode)
            }
            other => {
                return Err(NeuroGraphError::UnknownType {
                    type_name: other.to_string(),
                    operation: "Linker::from_properties".to_string(),
                })
            }
        };
        Ok(linker)
    }
}

/// Zeroes every matrix position whose mask entry is false.
fn apply_mask(weights: &Matrix, mask: &[bool]) {
    for r in 0..weights.rows() {
        for c in 0..weights.cols() {
            if !mask[r * weights.cols() + c] {
                weights.set(r, c, 0.0);
            }
        }
    }
}

#[cfg(test)]
#[path = "linker_test.rs"]
mod tests;
