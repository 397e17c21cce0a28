use crate::corpus::parse_pattern_set;
use crate::samplers::{RandomSampler, SequentialSampler};
use crate::trainer::run_epoch;
use neurograph_core::{
    BackPropagationAlgo, Cluster, Linker, ModifierRegistry, NeuralNet, TransferFunction,
    Updatable,
};

/// 1-unit identity chain learning y = 0.5 * x.
fn build_net() -> (NeuralNet, Vec<Updatable>) {
    let input = Cluster::simple("input", 1, TransferFunction::Identity);
    let output = Cluster::simple("output", 1, TransferFunction::Identity);
    let link = Linker::dot("w", &input, &output);
    let mut net = NeuralNet::new();
    net.add_cluster(&input);
    net.add_cluster(&output);
    net.add_linker(&link);
    net.mark_as_input(&input);
    net.mark_as_output(&output);
    net.set_order(vec![
        Updatable::Cluster(input.clone()),
        Updatable::Linker(link.clone()),
        Updatable::Cluster(output.clone()),
    ])
    .unwrap();
    let back = vec![
        Updatable::Cluster(output),
        Updatable::Linker(link),
        Updatable::Cluster(input),
    ];
    (net, back)
}

const CORPUS: &str = "\
in  input  1
out output 0.5

in  input  2
out output 1

in  input  -1
out output -0.5
";

#[test]
fn test_epoch_reduces_mse_sequentially() {
    let (net, back) = build_net();
    let set = parse_pattern_set(CORPUS, &net).unwrap();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back, 0.05, &registry).unwrap();

    let sampler = SequentialSampler::new();
    let first = run_epoch(&mut algo, &set, &sampler);
    let mut last = first;
    for _ in 0..100 {
        last = run_epoch(&mut algo, &set, &sampler);
    }
    assert!(last < first);
    assert!(last < 1e-4, "mse still {}", last);
}

#[test]
fn test_epoch_with_random_presentation_order() {
    let (net, back) = build_net();
    let set = parse_pattern_set(CORPUS, &net).unwrap();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back, 0.05, &registry).unwrap();

    let sampler = RandomSampler::new(false, None);
    let mut last = f32::MAX;
    for _ in 0..100 {
        last = run_epoch(&mut algo, &set, &sampler);
    }
    assert!(last < 1e-3, "mse still {}", last);
}

#[test]
fn test_empty_set_is_a_noop() {
    let (net, back) = build_net();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back, 0.05, &registry).unwrap();
    let mse = run_epoch(
        &mut algo,
        &neurograph_core::PatternSet::new(),
        &SequentialSampler::new(),
    );
    assert_eq!(mse, 0.0);
}
