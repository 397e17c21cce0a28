// src/net.rs
//
// The graph container. The net owns handle clones of its clusters and
// linkers by identity, keeps the input/output partitions and the
// from/to adjacency maps, and runs the forward pass as one deterministic
// linear sweep over an explicitly supplied update order. The container
// never infers topology.

use std::collections::HashMap;

use rand::Rng;

use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::linker::Linker;

/// One element of the update order: either a cluster or a linker.
/// `update()` dispatches to the element's own propagation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Updatable {
    Cluster(Cluster),
    Linker(Linker),
}

impl Updatable {
    pub fn update(&self) {
        match self {
            Updatable::Cluster(c) => c.update(),
            Updatable::Linker(l) => l.update(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Updatable::Cluster(c) => c.name(),
            Updatable::Linker(l) => l.name(),
        }
    }
}

/// A neural network: the set of clusters and linkers, their partitions and
/// adjacency, and the explicit update order driving `step()`.
#[derive(Debug, Default)]
pub struct NeuralNet {
    clusters: Vec<Cluster>,
    linkers: Vec<Linker>,
    input_clusters: Vec<Cluster>,
    output_clusters: Vec<Cluster>,
    /// from-cluster id -> outgoing linkers
    out_links: HashMap<usize, Vec<Linker>>,
    /// to-cluster id -> incoming linkers
    in_links: HashMap<usize, Vec<Linker>>,
    order: Vec<Updatable>,
}

impl NeuralNet {
    pub fn new() -> Self {
        NeuralNet::default()
    }

    // --- Membership ---

    /// Registers a cluster. Returns false (and changes nothing) if the
    /// cluster is already a member.
    pub fn add_cluster(&mut self, cluster: &Cluster) -> bool {
        if self.contains_cluster(cluster) {
            log::warn!("add_cluster: '{}' is already a member", cluster.name());
            return false;
        }
        self.clusters.push(cluster.clone());
        true
    }

    /// Registers a linker. Returns false if the linker is already a member
    /// or if either endpoint has not been registered first.
    pub fn add_linker(&mut self, linker: &Linker) -> bool {
        if self.contains_linker(linker) {
            log::warn!("add_linker: '{}' is already a member", linker.name());
            return false;
        }
        if !self.contains_cluster(&linker.from()) || !self.contains_cluster(&linker.to()) {
            log::warn!(
                "add_linker: endpoints of '{}' must be registered before the linker",
                linker.name()
            );
            return false;
        }
        self.linkers.push(linker.clone());
        self.out_links
            .entry(linker.from().id())
            .or_default()
            .push(linker.clone());
        self.in_links
            .entry(linker.to().id())
            .or_default()
            .push(linker.clone());
        true
    }

    /// Unregisters a cluster, reversing partition and order bookkeeping.
    /// Returns false if the cluster was not a member. Linkers attached to
    /// the cluster stay members; remove them explicitly.
    pub fn remove_cluster(&mut self, cluster: &Cluster) -> bool {
        let before = self.clusters.len();
        self.clusters.retain(|c| c != cluster);
        if self.clusters.len() == before {
            return false;
        }
        self.input_clusters.retain(|c| c != cluster);
        self.output_clusters.retain(|c| c != cluster);
        self.order
            .retain(|u| !matches!(u, Updatable::Cluster(c) if c == cluster));
        true
    }

    /// Unregisters a linker, reversing adjacency and order bookkeeping.
    /// Returns false if the linker was not a member.
    pub fn remove_linker(&mut self, linker: &Linker) -> bool {
        let before = self.linkers.len();
        self.linkers.retain(|l| l != linker);
        if self.linkers.len() == before {
            return false;
        }
        if let Some(out) = self.out_links.get_mut(&linker.from().id()) {
            out.retain(|l| l != linker);
        }
        if let Some(inc) = self.in_links.get_mut(&linker.to().id()) {
            inc.retain(|l| l != linker);
        }
        self.order
            .retain(|u| !matches!(u, Updatable::Linker(l) if l == linker));
        true
    }

    pub fn contains_cluster(&self, cluster: &Cluster) -> bool {
        self.clusters.iter().any(|c| c == cluster)
    }

    pub fn contains_linker(&self, linker: &Linker) -> bool {
        self.linkers.iter().any(|l| l == linker)
    }

    // --- Partitions ---

    /// Declares a member cluster as an input of the net. A cluster may be
    /// both input and output.
    pub fn mark_as_input(&mut self, cluster: &Cluster) {
        if !self.contains_cluster(cluster) {
            log::warn!("mark_as_input: '{}' is not a member", cluster.name());
            return;
        }
        if !self.input_clusters.contains(cluster) {
            self.input_clusters.push(cluster.clone());
        }
    }

    /// Declares a member cluster as an output of the net.
    pub fn mark_as_output(&mut self, cluster: &Cluster) {
        if !self.contains_cluster(cluster) {
            log::warn!("mark_as_output: '{}' is not a member", cluster.name());
            return;
        }
        if !self.output_clusters.contains(cluster) {
            self.output_clusters.push(cluster.clone());
        }
    }

    pub fn unmark_as_input(&mut self, cluster: &Cluster) {
        self.input_clusters.retain(|c| c != cluster);
    }

    pub fn unmark_as_output(&mut self, cluster: &Cluster) {
        self.output_clusters.retain(|c| c != cluster);
    }

    pub fn is_input(&self, cluster: &Cluster) -> bool {
        self.input_clusters.contains(cluster)
    }

    pub fn is_output(&self, cluster: &Cluster) -> bool {
        self.output_clusters.contains(cluster)
    }

    pub fn is_hidden(&self, cluster: &Cluster) -> bool {
        self.contains_cluster(cluster) && !self.is_input(cluster) && !self.is_output(cluster)
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn linkers(&self) -> &[Linker] {
        &self.linkers
    }

    pub fn input_clusters(&self) -> &[Cluster] {
        &self.input_clusters
    }

    pub fn output_clusters(&self) -> &[Cluster] {
        &self.output_clusters
    }

    pub fn hidden_clusters(&self) -> Vec<Cluster> {
        self.clusters
            .iter()
            .filter(|c| self.is_hidden(c))
            .cloned()
            .collect()
    }

    // --- Adjacency ---

    /// Linkers whose origin is `cluster`.
    pub fn linkers_from(&self, cluster: &Cluster) -> Vec<Linker> {
        self.out_links
            .get(&cluster.id())
            .cloned()
            .unwrap_or_default()
    }

    /// Linkers whose destination is `cluster`.
    pub fn linkers_to(&self, cluster: &Cluster) -> Vec<Linker> {
        self.in_links
            .get(&cluster.id())
            .cloned()
            .unwrap_or_default()
    }

    // --- Lookup ---

    /// Finds a member cluster by name. Returns the first match; None on miss.
    pub fn find_cluster(&self, name: &str) -> Option<Cluster> {
        self.clusters.iter().find(|c| c.name() == name).cloned()
    }

    /// Finds a member linker by name.
    pub fn find_linker(&self, name: &str) -> Option<Linker> {
        self.linkers.iter().find(|l| l.name() == name).cloned()
    }

    // --- Update order and forward pass ---

    /// Stores the externally supplied update order. The sequence is taken
    /// as-is (the net never checks it against the graph topology), but
    /// every element must be a member.
    ///
    /// # Errors
    /// `NotMember` naming the first non-member element; the previous order
    /// is left unchanged.
    pub fn set_order(&mut self, order: Vec<Updatable>) -> Result<(), NeuroGraphError> {
        for u in &order {
            let member = match u {
                Updatable::Cluster(c) => self.contains_cluster(c),
                Updatable::Linker(l) => self.contains_linker(l),
            };
            if !member {
                return Err(NeuroGraphError::NotMember {
                    name: u.name(),
                    operation: "set_order".to_string(),
                });
            }
        }
        self.order = order;
        Ok(())
    }

    pub fn order(&self) -> &[Updatable] {
        &self.order
    }

    /// One forward pass: updates every order element in sequence.
    pub fn step(&self) {
        for u in &self.order {
            u.update();
        }
    }

    /// Re-draws every learnable parameter of the net uniformly from
    /// `[min, max]`: every cluster first, then every linker.
    pub fn randomize<R: Rng>(&self, min: f32, max: f32, rng: &mut R) {
        for c in &self.clusters {
            c.randomize(min, max, rng);
        }
        for l in &self.linkers {
            l.randomize(min, max, rng);
        }
    }
}

#[cfg(test)]
#[path = "net_test.rs"]
mod tests;
