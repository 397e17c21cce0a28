use crate::cluster::{Cluster, ClusterTag};
use crate::transfer::TransferFunction;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[test]
fn test_simple_cluster_update() {
    let c = Cluster::simple("c", 2, TransferFunction::Sigmoid { lambda: 1.0 });
    assert_eq!(c.tag(), ClusterTag::Simple);
    assert_eq!(c.size(), 2);
    c.set_inputs(&[0.0, 1.0]);
    c.update();
    assert_relative_eq!(c.outputs().get(0), 0.5);
    assert_relative_eq!(c.outputs().get(1), sigmoid(1.0), epsilon = 1e-6);
    // L'update marque les entrées comme périmées.
    assert!(c.needs_reset());
}

#[test]
fn test_zero_input_forward_pass() {
    // With zero inputs the outputs equal the transfer applied to zero.
    let c = Cluster::simple("z", 3, TransferFunction::Sigmoid { lambda: 1.0 });
    c.update();
    for i in 0..3 {
        assert_relative_eq!(c.outputs().get(i), 0.5);
    }

    let lin = Cluster::simple("l", 2, TransferFunction::Linear { m: 3.0, b: -1.0 });
    lin.update();
    assert_eq!(lin.outputs().to_vec(), vec![-1.0, -1.0]);
}

#[test]
fn test_biased_cluster_subtracts_before_transfer() {
    let c = Cluster::biased("b", 2, TransferFunction::Identity);
    c.biases().unwrap().assign_slice(&[0.25, -0.25]);
    c.set_inputs(&[1.0, 1.0]);
    c.update();
    assert_relative_eq!(c.outputs().get(0), 0.75);
    assert_relative_eq!(c.outputs().get(1), 1.25);
    // pre_transfer exposes the bias-corrected net.
    assert_eq!(c.pre_transfer().to_vec(), vec![0.75, 1.25]);
}

#[test]
fn test_fake_cluster_is_a_live_relay() {
    let c = Cluster::fake("relay", 3);
    assert_eq!(c.tag(), ClusterTag::Fake);
    // Writing the input is immediately visible through the output,
    // without any update() call.
    c.set_inputs(&[1.0, 2.0, 3.0]);
    assert_eq!(c.outputs().to_vec(), vec![1.0, 2.0, 3.0]);
    assert!(c.outputs().aliases(&c.inputs()));

    // A relay never asks to be reset, update() included.
    c.update();
    assert!(!c.needs_reset());
    assert_eq!(c.outputs().to_vec(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_reset_contract() {
    let c = Cluster::simple("c", 2, TransferFunction::Identity);
    c.set_inputs(&[5.0, 5.0]);
    c.update();
    assert!(c.needs_reset());
    c.reset_needed_inputs();
    assert_eq!(c.inputs().to_vec(), vec![0.0, 0.0]);
    assert!(!c.needs_reset());

    // Once accumulation is on the cluster never asks for a reset.
    c.set_inputs(&[5.0, 5.0]);
    c.update();
    c.set_accumulate(true);
    assert!(!c.needs_reset());
    c.reset_needed_inputs();
    assert_eq!(c.inputs().to_vec(), vec![5.0, 5.0]);
}

#[test]
fn test_dde_cluster_recurrence() {
    // y_t = 1.0 * f(x_t) + 0.5 * y_(t-1), identity transfer.
    let c = Cluster::dde("d", 1, TransferFunction::Identity, vec![1.0, 0.5]);
    assert_eq!(c.tag(), ClusterTag::Dde);
    c.set_inputs(&[1.0]);
    c.update();
    assert_relative_eq!(c.outputs().get(0), 1.0);

    c.set_inputs(&[1.0]);
    c.update();
    assert_relative_eq!(c.outputs().get(0), 1.5);

    c.set_inputs(&[1.0]);
    c.update();
    assert_relative_eq!(c.outputs().get(0), 1.75);
}

#[test]
fn test_dde_second_difference_term() {
    // y_t = f(x_t) + 0 * y_(t-1) + 1 * (y_(t-1) - y_(t-2))
    let c = Cluster::dde("d", 1, TransferFunction::Identity, vec![1.0, 0.0, 1.0]);
    c.set_inputs(&[1.0]);
    c.update(); // y = 1 (no history yet)
    c.set_inputs(&[2.0]);
    c.update(); // y = 2 (one entry: difference level empty)
    c.set_inputs(&[0.0]);
    c.update(); // y = 0 + (2 - 1) = 1
    assert_relative_eq!(c.outputs().get(0), 1.0);
}

#[test]
fn test_randomize_touches_only_learnables() {
    let mut rng = StdRng::seed_from_u64(11);
    let simple = Cluster::simple("s", 4, TransferFunction::Identity);
    simple.randomize(-1.0, 1.0, &mut rng);
    assert_eq!(simple.inputs().to_vec(), vec![0.0; 4]);
    assert_eq!(simple.outputs().to_vec(), vec![0.0; 4]);

    let biased = Cluster::biased("b", 4, TransferFunction::Identity);
    biased.randomize(-1.0, 1.0, &mut rng);
    let biases = biased.biases().unwrap().to_vec();
    assert!(biases.iter().any(|b| *b != 0.0));
    assert!(biases.iter().all(|b| (-1.0..=1.0).contains(b)));
    assert_eq!(biased.inputs().to_vec(), vec![0.0; 4]);
}

#[test]
fn test_identity_is_pointer_identity() {
    let a = Cluster::simple("same-name", 1, TransferFunction::Identity);
    let b = Cluster::simple("same-name", 1, TransferFunction::Identity);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_eq!(a.clone().id(), a.id());
}

#[test]
fn test_property_round_trip_biased() {
    let c = Cluster::biased("hidden", 3, TransferFunction::Sigmoid { lambda: 2.0 });
    c.biases().unwrap().assign_slice(&[0.1, -0.2, 0.3]);
    c.set_accumulate(true);

    let back = Cluster::from_properties(&c.save_properties()).expect("round trip failed");
    assert_eq!(back.name(), "hidden");
    assert_eq!(back.size(), 3);
    assert_eq!(back.tag(), ClusterTag::Biased);
    assert!(back.is_accumulate());
    assert_eq!(back.transfer(), TransferFunction::Sigmoid { lambda: 2.0 });
    assert_eq!(back.biases().unwrap().to_vec(), vec![0.1, -0.2, 0.3]);
}

#[test]
fn test_property_round_trip_dde_and_fake() {
    let d = Cluster::dde("d", 2, TransferFunction::Identity, vec![1.0, 0.25]);
    let back = Cluster::from_properties(&d.save_properties()).expect("round trip failed");
    assert_eq!(back.tag(), ClusterTag::Dde);
    assert_eq!(back.coefficients().unwrap().to_vec(), vec![1.0, 0.25]);

    let f = Cluster::fake("f", 2);
    let back = Cluster::from_properties(&f.save_properties()).expect("round trip failed");
    assert_eq!(back.tag(), ClusterTag::Fake);
    assert!(back.outputs().aliases(&back.inputs()));
}

#[test]
fn test_winner_take_all_cluster() {
    let c = Cluster::simple("w", 3, TransferFunction::WinnerTakeAll);
    c.set_inputs(&[0.2, 0.9, 0.1]);
    c.update();
    assert_eq!(c.outputs().to_vec(), vec![0.0, 1.0, 0.0]);
}
