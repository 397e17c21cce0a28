//! # Exemple d'Entraînement : XOR
//!
//! Cet exemple illustre les étapes fondamentales pour construire et entraîner
//! un petit réseau cluster/linker avec `neurograph-core` :
//!
//! 1. **Construction du graphe** : clusters (entrée, cachée biaisée, sortie
//!    biaisée) et linkers denses, enregistrés dans un `NeuralNet`.
//! 2. **Ordre de propagation explicite** : le réseau ne déduit jamais la
//!    topologie, la séquence est fournie par l'appelant.
//! 3. **Boucle d'entraînement** : rétropropagation avec le registre de
//!    modificateurs standard, momentum activé.
//!
//! ## Exécution
//! `cargo run --example xor`

use neurograph_core::{
    BackPropagationAlgo, Cluster, Linker, ModifierRegistry, NeuralNet, Pattern, PatternSet,
    TransferFunction, Updatable,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let input = Cluster::simple("input", 2, TransferFunction::Identity);
    let hidden = Cluster::biased("hidden", 6, TransferFunction::Sigmoid { lambda: 1.0 });
    let output = Cluster::biased("output", 1, TransferFunction::Sigmoid { lambda: 1.0 });
    let in2hid = Linker::dot("in2hid", &input, &hidden);
    let hid2out = Linker::dot("hid2out", &hidden, &output);

    let mut net = NeuralNet::new();
    net.add_cluster(&input);
    net.add_cluster(&hidden);
    net.add_cluster(&output);
    net.add_linker(&in2hid);
    net.add_linker(&hid2out);
    net.mark_as_input(&input);
    net.mark_as_output(&output);
    net.set_order(vec![
        Updatable::Cluster(input.clone()),
        Updatable::Linker(in2hid.clone()),
        Updatable::Cluster(hidden.clone()),
        Updatable::Linker(hid2out.clone()),
        Updatable::Cluster(output.clone()),
    ])
    .expect("all order elements are members");

    let mut rng = StdRng::seed_from_u64(7);
    net.randomize(-1.0, 1.0, &mut rng);

    // L'ordre de rétropropagation est l'ordre de propagation inversé.
    let registry = ModifierRegistry::standard();
    let mut algo = BackPropagationAlgo::new(
        &net,
        vec![
            Updatable::Cluster(output.clone()),
            Updatable::Linker(hid2out),
            Updatable::Cluster(hidden),
            Updatable::Linker(in2hid),
            Updatable::Cluster(input.clone()),
        ],
        0.2,
        &registry,
    )
    .expect("backprop order is valid");
    algo.enable_momentum(0.6);

    let mut patterns = PatternSet::new();
    for (a, b, want) in [
        (0.0, 0.0, 0.0),
        (0.0, 1.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 0.0),
    ] {
        let mut p = Pattern::new();
        p.set_inputs_of(&input, vec![a, b]);
        p.set_outputs_of(&output, vec![want]);
        patterns.push(p);
    }

    for epoch in 0..10_000 {
        for p in patterns.iter() {
            algo.learn(p);
        }
        if epoch % 1000 == 0 {
            let mse = patterns.iter().map(|p| algo.calculate_mse(p)).sum::<f32>()
                / patterns.len() as f32;
            println!("epoch {:>5}  mse {:.6}", epoch, mse);
            if mse < 0.001 {
                break;
            }
        }
    }

    println!("\ntrained responses:");
    for p in patterns.iter() {
        let inputs = p.inputs_of(&input).unwrap().to_vec();
        input.set_inputs(&inputs);
        net.step();
        println!(
            "  {:?} -> {:.4} (target {:?})",
            inputs,
            output.outputs().get(0),
            p.outputs_of(&output).unwrap()
        );
    }
}
