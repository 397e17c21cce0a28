use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::linker::Linker;
use crate::net::{NeuralNet, Updatable};
use crate::transfer::TransferFunction;
use approx::assert_relative_eq;

fn identity_cluster(name: &str, size: usize) -> Cluster {
    Cluster::simple(name, size, TransferFunction::Identity)
}

fn two_cluster_net() -> (NeuralNet, Cluster, Cluster, Linker) {
    let a = identity_cluster("a", 2);
    let b = identity_cluster("b", 2);
    let link = Linker::dot("a2b", &a, &b);
    let mut net = NeuralNet::new();
    net.add_cluster(&a);
    net.add_cluster(&b);
    net.add_linker(&link);
    (net, a, b, link)
}

#[test]
fn test_membership_and_duplicates() {
    let (mut net, a, _b, link) = two_cluster_net();
    assert!(net.contains_cluster(&a));
    assert!(net.contains_linker(&link));
    // Duplicates are rejected.
    assert!(!net.add_cluster(&a));
    assert!(!net.add_linker(&link));
    assert_eq!(net.clusters().len(), 2);
    assert_eq!(net.linkers().len(), 1);
}

#[test]
fn test_linker_endpoints_must_be_members() {
    let a = identity_cluster("a", 1);
    let stranger = identity_cluster("stranger", 1);
    let mut net = NeuralNet::new();
    net.add_cluster(&a);
    let link = Linker::dot("bad", &a, &stranger);
    assert!(!net.add_linker(&link));
    assert!(net.linkers().is_empty());
}

#[test]
fn test_partitions() {
    let (mut net, a, b, _link) = two_cluster_net();
    net.mark_as_input(&a);
    net.mark_as_output(&b);
    assert!(net.is_input(&a));
    assert!(net.is_output(&b));
    assert!(!net.is_hidden(&a));

    // A cluster may be both input and output.
    net.mark_as_output(&a);
    assert!(net.is_input(&a) && net.is_output(&a));
    net.unmark_as_output(&a);
    assert!(!net.is_output(&a));

    let hidden = identity_cluster("h", 1);
    net.add_cluster(&hidden);
    assert!(net.is_hidden(&hidden));
    assert_eq!(net.hidden_clusters(), vec![hidden]);

    // Marking a non-member is a silent no-op.
    let stranger = identity_cluster("s", 1);
    net.mark_as_input(&stranger);
    assert!(!net.is_input(&stranger));
}

#[test]
fn test_adjacency() {
    let (net, a, b, link) = two_cluster_net();
    assert_eq!(net.linkers_from(&a), vec![link.clone()]);
    assert_eq!(net.linkers_to(&b), vec![link]);
    assert!(net.linkers_to(&a).is_empty());
}

#[test]
fn test_removal_reverses_bookkeeping() {
    let (mut net, a, b, link) = two_cluster_net();
    net.set_order(vec![
        Updatable::Cluster(a.clone()),
        Updatable::Linker(link.clone()),
        Updatable::Cluster(b.clone()),
    ])
    .unwrap();

    assert!(net.remove_linker(&link));
    assert!(!net.remove_linker(&link)); // already gone
    assert!(net.linkers_from(&a).is_empty());
    assert!(net.linkers_to(&b).is_empty());
    assert_eq!(net.order().len(), 2);

    assert!(net.remove_cluster(&a));
    assert!(!net.remove_cluster(&a));
    assert_eq!(net.order().len(), 1);
    assert!(!net.contains_cluster(&a));
}

#[test]
fn test_find_by_name() {
    let (net, a, _b, link) = two_cluster_net();
    assert_eq!(net.find_cluster("a"), Some(a));
    assert_eq!(net.find_cluster("nope"), None);
    assert_eq!(net.find_linker("a2b"), Some(link));
    assert_eq!(net.find_linker("nope"), None);
}

#[test]
fn test_set_order_rejects_non_members() {
    let (mut net, a, _b, _link) = two_cluster_net();
    let stranger = identity_cluster("s", 1);
    let err = net
        .set_order(vec![
            Updatable::Cluster(a),
            Updatable::Cluster(stranger),
        ])
        .unwrap_err();
    assert!(matches!(err, NeuroGraphError::NotMember { .. }));
    // The failed call left the previous (empty) order untouched.
    assert!(net.order().is_empty());
}

#[test]
fn test_step_runs_the_declared_sequence() {
    let (mut net, a, b, link) = two_cluster_net();
    link.set_weight(0, 0, 2.0);
    link.set_weight(1, 1, 3.0);
    net.set_order(vec![
        Updatable::Cluster(a.clone()),
        Updatable::Linker(link),
        Updatable::Cluster(b.clone()),
    ])
    .unwrap();

    a.set_inputs(&[1.0, 1.0]);
    net.step();
    assert_eq!(b.outputs().to_vec(), vec![2.0, 3.0]);

    // A second step re-propagates from the same inputs: the reset contract
    // keeps the result stable instead of doubling it.
    net.step();
    assert_eq!(b.outputs().to_vec(), vec![2.0, 3.0]);
}

#[test]
fn test_zero_input_forward_pass_through_net() {
    let a = Cluster::simple("a", 2, TransferFunction::Sigmoid { lambda: 1.0 });
    let b = Cluster::simple("b", 1, TransferFunction::Sigmoid { lambda: 1.0 });
    let link = Linker::dot("a2b", &a, &b);
    let mut net = NeuralNet::new();
    net.add_cluster(&a);
    net.add_cluster(&b);
    net.add_linker(&link);
    net.set_order(vec![
        Updatable::Cluster(a.clone()),
        Updatable::Linker(link),
        Updatable::Cluster(b.clone()),
    ])
    .unwrap();

    // All inputs and parameters zero: every output is f(0).
    net.step();
    assert_relative_eq!(a.outputs().get(0), 0.5);
    assert_relative_eq!(a.outputs().get(1), 0.5);
    assert_relative_eq!(b.outputs().get(0), 0.5);
}

#[test]
fn test_randomize_reaches_clusters_and_linkers() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let a = Cluster::biased("a", 2, TransferFunction::Identity);
    let b = identity_cluster("b", 2);
    let link = Linker::dot("a2b", &a, &b);
    let mut net = NeuralNet::new();
    net.add_cluster(&a);
    net.add_cluster(&b);
    net.add_linker(&link);

    let mut rng = StdRng::seed_from_u64(9);
    net.randomize(-1.0, 1.0, &mut rng);
    assert!(a.biases().unwrap().to_vec().iter().any(|v| *v != 0.0));
    assert!(link.weights().unwrap().to_vec().iter().any(|v| *v != 0.0));
}
