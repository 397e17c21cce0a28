// Déclare les modules principaux de la crate
pub mod algebra;
pub mod cluster;
pub mod learning;
pub mod linker;
pub mod net;
pub mod props;
pub mod transfer;

pub mod error;
pub use error::NeuroGraphError;

// Ré-exporte les types de base pour qu'ils soient accessibles directement
// via `neurograph_core::...`
pub use algebra::{Matrix, Vector};
pub use cluster::{Cluster, ClusterTag};
pub use learning::backprop::BackPropagationAlgo;
pub use learning::modifier::{Modifier, ModifierRegistry};
pub use learning::pattern::{Pattern, PatternSet};
pub use linker::{CopyMode, Linker, LinkerTag};
pub use net::{NeuralNet, Updatable};
pub use transfer::TransferFunction;
