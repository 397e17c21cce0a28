// src/props.rs
//
// Named-property schema shared with the external collaborators (the textual
// config loader/saver, the flat binding, the editor). The core never reads
// or writes files; it only converts entities to and from ordered key/value
// maps, real lists encoded as whitespace-separated text.

use std::fmt::Display;
use std::str::FromStr;

use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::linker::Linker;
use crate::net::{NeuralNet, Updatable};

/// An ordered collection of named string properties.
///
/// Order is preserved so a saved map reads back in the order it was written,
/// which keeps the external textual format stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        PropertyMap {
            entries: Vec::new(),
        }
    }

    /// Sets (or replaces) a property.
    pub fn set(&mut self, key: &str, value: impl Display) {
        let rendered = value.to_string();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = rendered;
        } else {
            self.entries.push((key.to_string(), rendered));
        }
    }

    /// Encodes a list of reals as one whitespace-separated property.
    pub fn set_reals(&mut self, key: &str, values: &[f32]) {
        let rendered = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.set(key, rendered);
    }

    /// Encodes a list of names as one whitespace-separated property.
    pub fn set_names(&mut self, key: &str, names: &[String]) {
        self.set(key, names.join(" "));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`PropertyMap::get`], but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<&str, NeuroGraphError> {
        self.get(key).ok_or_else(|| NeuroGraphError::PropertyError {
            key: key.to_string(),
            message: "missing".to_string(),
        })
    }

    /// Fetches and parses a property.
    pub fn require_parsed<T: FromStr>(&self, key: &str) -> Result<T, NeuroGraphError> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| NeuroGraphError::PropertyError {
            key: key.to_string(),
            message: format!("cannot parse '{}'", raw),
        })
    }

    /// Fetches and decodes a whitespace-separated real list.
    pub fn require_reals(&self, key: &str) -> Result<Vec<f32>, NeuroGraphError> {
        let raw = self.require(key)?;
        raw.split_whitespace()
            .map(|tok| {
                tok.parse::<f32>()
                    .map_err(|_| NeuroGraphError::PropertyError {
                        key: key.to_string(),
                        message: format!("cannot parse real '{}'", tok),
                    })
            })
            .collect()
    }

    /// Fetches a whitespace-separated name list; a missing key is an empty
    /// list.
    pub fn names(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every `prefix.key` entry into a new map keyed by `key` alone.
    pub fn sub_map(&self, prefix: &str) -> PropertyMap {
        let full = format!("{}.", prefix);
        let mut out = PropertyMap::new();
        for (k, v) in &self.entries {
            if let Some(stripped) = k.strip_prefix(&full) {
                out.set(stripped, v);
            }
        }
        out
    }

    /// Copies every entry of `other` into this map as `prefix.key`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: &PropertyMap) {
        for (k, v) in other.iter() {
            self.set(&format!("{}.{}", prefix, k), v);
        }
    }
}

/// A whole net rendered as named properties: the net-level name lists plus
/// one map per owned entity. This is the round-trip bundle the external
/// config format wraps into its tag tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetProperties {
    pub net: PropertyMap,
    pub clusters: Vec<PropertyMap>,
    pub linkers: Vec<PropertyMap>,
}

/// Renders `net` and everything it owns as named properties.
pub fn save_net(net: &NeuralNet) -> NetProperties {
    let names = |clusters: &[Cluster]| -> Vec<String> {
        clusters.iter().map(|c| c.name()).collect()
    };

    let mut map = PropertyMap::new();
    map.set_names("clustersList", &names(net.clusters()));
    map.set_names(
        "linkersList",
        &net.linkers().iter().map(|l| l.name()).collect::<Vec<_>>(),
    );
    map.set_names("inputClusters", &names(net.input_clusters()));
    map.set_names("outputClusters", &names(net.output_clusters()));
    map.set_names(
        "spreadOrder",
        &net.order()
            .iter()
            .map(|u| match u {
                Updatable::Cluster(c) => c.name(),
                Updatable::Linker(l) => l.name(),
            })
            .collect::<Vec<_>>(),
    );

    NetProperties {
        net: map,
        clusters: net.clusters().iter().map(|c| c.save_properties()).collect(),
        linkers: net.linkers().iter().map(|l| l.save_properties()).collect(),
    }
}

/// Reconstructs a net from its named properties: clusters first, then
/// linkers (endpoints resolved by name), then partitions and spread order.
///
/// # Errors
/// Fails on unknown type tags, missing properties, or name lists referring
/// to entities that were not reconstructed.
pub fn load_net(props: &NetProperties) -> Result<NeuralNet, NeuroGraphError> {
    let mut net = NeuralNet::new();

    for cluster_props in &props.clusters {
        let cluster = Cluster::from_properties(cluster_props)?;
        if !net.add_cluster(&cluster) {
            return Err(NeuroGraphError::Duplicate {
                name: cluster.name(),
            });
        }
    }

    for linker_props in &props.linkers {
        let linker = Linker::from_properties(linker_props, &net)?;
        if !net.add_linker(&linker) {
            return Err(NeuroGraphError::Duplicate { name: linker.name() });
        }
    }

    for name in props.net.names("inputClusters") {
        let cluster = net
            .find_cluster(&name)
            .ok_or(NeuroGraphError::UnknownName { name })?;
        net.mark_as_input(&cluster);
    }
    for name in props.net.names("outputClusters") {
        let cluster = net
            .find_cluster(&name)
            .ok_or(NeuroGraphError::UnknownName { name })?;
        net.mark_as_output(&cluster);
    }

    let mut order = Vec::new();
    for name in props.net.names("spreadOrder") {
        if let Some(cluster) = net.find_cluster(&name) {
            order.push(Updatable::Cluster(cluster));
        } else if let Some(linker) = net.find_linker(&name) {
            order.push(Updatable::Linker(linker));
        } else {
            return Err(NeuroGraphError::UnknownName { name });
        }
    }
    net.set_order(order)?;

    Ok(net)
}

#[cfg(test)]
#[path = "props_test.rs"]
mod tests;
