use crate::corpus::parse_pattern_set;
use neurograph_core::{Cluster, NeuralNet, NeuroGraphError, TransferFunction};

fn xor_net() -> NeuralNet {
    let input = Cluster::simple("input", 2, TransferFunction::Identity);
    let output = Cluster::simple("output", 1, TransferFunction::Identity);
    let mut net = NeuralNet::new();
    net.add_cluster(&input);
    net.add_cluster(&output);
    net
}

#[test]
fn test_parse_blocks_and_comments() {
    let net = xor_net();
    let text = "\
# xor corpus
in  input  0 0
out output 0

in  input  0 1   # second pattern
out output 1
";
    let set = parse_pattern_set(text, &net).expect("parse failed");
    assert_eq!(set.len(), 2);

    let input = net.find_cluster("input").unwrap();
    let output = net.find_cluster("output").unwrap();
    assert_eq!(set.get(0).unwrap().inputs_of(&input), Some(&[0.0, 0.0][..]));
    assert_eq!(set.get(1).unwrap().inputs_of(&input), Some(&[0.0, 1.0][..]));
    assert_eq!(set.get(1).unwrap().outputs_of(&output), Some(&[1.0][..]));
}

#[test]
fn test_unknown_cluster_is_an_error() {
    let net = xor_net();
    let err = parse_pattern_set("in ghost 1 2", &net).unwrap_err();
    assert!(matches!(err, NeuroGraphError::UnknownName { .. }));
}

#[test]
fn test_wrong_arity_is_an_error() {
    let net = xor_net();
    let err = parse_pattern_set("in input 1", &net).unwrap_err();
    assert!(matches!(err, NeuroGraphError::SizeMismatch { .. }));
}

#[test]
fn test_unknown_directive_is_an_error() {
    let net = xor_net();
    let err = parse_pattern_set("teach input 1 2", &net).unwrap_err();
    assert!(matches!(err, NeuroGraphError::ParseError { .. }));
}

#[test]
fn test_bad_real_is_an_error() {
    let net = xor_net();
    let err = parse_pattern_set("in input 1 x", &net).unwrap_err();
    assert!(matches!(err, NeuroGraphError::ParseError { .. }));
}
