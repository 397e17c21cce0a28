use crate::cluster::Cluster;
use crate::error::NeuroGraphError;
use crate::learning::backprop::BackPropagationAlgo;
use crate::learning::modifier::ModifierRegistry;
use crate::learning::pattern::{Pattern, PatternSet};
use crate::linker::Linker;
use crate::net::{NeuralNet, Updatable};
use crate::transfer::TransferFunction;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn identity_cluster(name: &str, size: usize) -> Cluster {
    Cluster::simple(name, size, TransferFunction::Identity)
}

/// 1-unit identity chain: in -> w -> out, with the usual orders.
fn scalar_chain() -> (NeuralNet, Cluster, Cluster, Linker, Vec<Updatable>) {
    let input = identity_cluster("in", 1);
    let output = identity_cluster("out", 1);
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
    let back_order = vec![
        Updatable::Cluster(output.clone()),
        Updatable::Linker(link.clone()),
        Updatable::Cluster(input.clone()),
    ];
    (net, input, output, link, back_order)
}

fn weight_of(link: &Linker) -> f32 {
    link.weight_at(0, 0)
}

#[test]
fn test_single_weight_descent() {
    let (net, input, output, link, back_order) = scalar_chain();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back_order, 0.1, &registry).unwrap();

    let mut pattern = Pattern::new();
    pattern.set_inputs_of(&input, vec![1.0]);
    pattern.set_outputs_of(&output, vec![1.0]);

    // Forward output is 0 (zero weight): delta = 1, so w += 0.1 * 1 * 1.
    algo.learn(&pattern);
    assert_relative_eq!(weight_of(&link), 0.1, epsilon = 1e-6);
    // Next step: y = 0.1, delta = 0.9.
    algo.learn(&pattern);
    assert_relative_eq!(weight_of(&link), 0.19, epsilon = 1e-6);

    // The error left in the accumulator is the teaching delta.
    let err = algo.get_error(&output).unwrap();
    assert_relative_eq!(err[0], 0.9, epsilon = 1e-6);
}

#[test]
fn test_descent_reduces_mse() {
    let (net, input, output, _link, back_order) = scalar_chain();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back_order, 0.1, &registry).unwrap();

    let mut pattern = Pattern::new();
    pattern.set_inputs_of(&input, vec![1.0]);
    pattern.set_outputs_of(&output, vec![1.0]);

    let before = algo.calculate_mse(&pattern);
    for _ in 0..100 {
        algo.learn(&pattern);
    }
    let after = algo.calculate_mse(&pattern);
    assert!(after < before);
    assert!(after < 1e-4, "mse still {} after 100 steps", after);
}

#[test]
fn test_untracked_cluster_is_refused() {
    let (net, _input, _output, _link, back_order) = scalar_chain();
    let stranger = identity_cluster("stranger", 1);
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back_order, 0.1, &registry).unwrap();
    assert!(!algo.set_teaching_input(&stranger, &[1.0]));
    assert_eq!(algo.get_error(&stranger), None);
}

#[test]
fn test_order_must_belong_to_the_net() {
    let (net, _input, output, _link, _back_order) = scalar_chain();
    let stranger = identity_cluster("stranger", 1);
    let registry = ModifierRegistry::standard();
    let err = BackPropagationAlgo::new(
        &net,
        vec![
            Updatable::Cluster(output),
            Updatable::Cluster(stranger),
        ],
        0.1,
        &registry,
    )
    .err()
    .unwrap();
    assert!(matches!(err, NeuroGraphError::NotMember { .. }));
}

#[test]
fn test_deltas_stop_at_the_tracked_frontier() {
    // in -> l1 -> hid -> l2 -> out, but the backprop order omits l1 and in:
    // l2 learns, l1 must stay untouched.
    let input = identity_cluster("in", 1);
    let hid = identity_cluster("hid", 1);
    let output = identity_cluster("out", 1);
    let l1 = Linker::dot("l1", &input, &hid);
    let l2 = Linker::dot("l2", &hid, &output);
    let mut net = NeuralNet::new();
    net.add_cluster(&input);
    net.add_cluster(&hid);
    net.add_cluster(&output);
    net.add_linker(&l1);
    net.add_linker(&l2);
    net.mark_as_input(&input);
    net.mark_as_output(&output);
    net.set_order(vec![
        Updatable::Cluster(input.clone()),
        Updatable::Linker(l1.clone()),
        Updatable::Cluster(hid.clone()),
        Updatable::Linker(l2.clone()),
        Updatable::Cluster(output.clone()),
    ])
    .unwrap();

    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(
        &net,
        vec![
            Updatable::Cluster(output.clone()),
            Updatable::Linker(l2.clone()),
            Updatable::Cluster(hid.clone()),
        ],
        0.1,
        &registry,
    )
    .unwrap();

    l1.set_weight(0, 0, 1.0);
    let mut pattern = Pattern::new();
    pattern.set_inputs_of(&input, vec![1.0]);
    pattern.set_outputs_of(&output, vec![1.0]);
    algo.learn(&pattern);

    assert_relative_eq!(weight_of(&l1), 1.0); // frontier: not learned
    assert!(weight_of(&l2) != 0.0);
}

#[test]
fn test_bias_learning_converges() {
    // A lone biased output cluster: y = 0 - b, target 1.
    let output = Cluster::biased("out", 1, TransferFunction::Identity);
    let mut net = NeuralNet::new();
    net.add_cluster(&output);
    net.mark_as_output(&output);
    net.set_order(vec![Updatable::Cluster(output.clone())]).unwrap();

    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(
        &net,
        vec![Updatable::Cluster(output.clone())],
        0.1,
        &registry,
    )
    .unwrap();

    let mut pattern = Pattern::new();
    pattern.set_outputs_of(&output, vec![1.0]);
    for _ in 0..200 {
        algo.learn(&pattern);
    }
    assert_relative_eq!(output.outputs().get(0), 1.0, epsilon = 1e-3);
    assert_relative_eq!(output.biases().unwrap().get(0), -1.0, epsilon = 1e-3);
}

#[test]
fn test_momentum_toggling() {
    let (net, input, output, link, back_order) = scalar_chain();
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(&net, back_order, 0.1, &registry).unwrap();
    let mut pattern = Pattern::new();
    pattern.set_inputs_of(&input, vec![1.0]);
    pattern.set_outputs_of(&output, vec![1.0]);

    // Plain descent: w = 0.1 then 0.19.
    algo.learn(&pattern);
    algo.learn(&pattern);
    assert_relative_eq!(weight_of(&link), 0.19, epsilon = 1e-5);

    // Enabling starts from a clean history: the first step has no
    // momentum term.
    algo.enable_momentum(0.5);
    assert!(algo.is_using_momentum());
    algo.learn(&pattern); // delta = 0.81
    assert_relative_eq!(weight_of(&link), 0.271, epsilon = 1e-5);
    // Second step adds lr*momentum times the previous pair.
    algo.learn(&pattern); // delta = 0.729, momentum term 0.05 * 0.81
    assert_relative_eq!(weight_of(&link), 0.3844, epsilon = 1e-5);

    // Disabling stops the extra term without rewriting anything.
    algo.disable_momentum();
    algo.learn(&pattern); // delta = 0.6156
    assert_relative_eq!(weight_of(&link), 0.44596, epsilon = 1e-5);

    // Re-enabling zeroes the history: again no momentum on the first step.
    algo.enable_momentum(0.5);
    algo.learn(&pattern); // delta = 0.55404
    assert_relative_eq!(weight_of(&link), 0.501364, epsilon = 1e-5);
}

#[test]
fn test_xor_convergence() {
    // 2 inputs -> 8 sigmoid hidden -> 1 sigmoid output, trained on XOR.
    let input = identity_cluster("in", 2);
    let hid = Cluster::biased("hid", 8, TransferFunction::Sigmoid { lambda: 1.0 });
    let output = Cluster::biased("out", 1, TransferFunction::Sigmoid { lambda: 1.0 });
    let l1 = Linker::dot("l1", &input, &hid);
    let l2 = Linker::dot("l2", &hid, &output);

    let mut net = NeuralNet::new();
    net.add_cluster(&input);
    net.add_cluster(&hid);
    net.add_cluster(&output);
    net.add_linker(&l1);
    net.add_linker(&l2);
    net.mark_as_input(&input);
    net.mark_as_output(&output);
    net.set_order(vec![
        Updatable::Cluster(input.clone()),
        Updatable::Linker(l1.clone()),
        Updatable::Cluster(hid.clone()),
        Updatable::Linker(l2.clone()),
        Updatable::Cluster(output.clone()),
    ])
    .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    net.randomize(-1.0, 1.0, &mut rng);

    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(
        &net,
        vec![
            Updatable::Cluster(output.clone()),
            Updatable::Linker(l2),
            Updatable::Cluster(hid.clone()),
            Updatable::Linker(l1),
            Updatable::Cluster(input.clone()),
        ],
        0.2,
        &registry,
    )
    .unwrap();

    let mut set = PatternSet::new();
    for (a, b, want) in [
        (0.0, 0.0, 0.0),
        (0.0, 1.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 0.0),
    ] {
        let mut p = Pattern::new();
        p.set_inputs_of(&input, vec![a, b]);
        p.set_outputs_of(&output, vec![want]);
        set.push(p);
    }

    let mut mse = f32::MAX;
    for it in 0..50_000 {
        algo.learn(set.get(it % set.len()).unwrap());
        if it % 1000 == 999 {
            mse = set.iter().map(|p| algo.calculate_mse(p)).sum::<f32>() / set.len() as f32;
            if mse < 0.01 {
                break;
            }
        }
    }
    assert!(mse < 0.05, "XOR did not converge: mse = {}", mse);
}
