use backprop_nn::{ActivationFunction, DerivativeMode, NetError, Network, NetworkSpec, WeightInit};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn and_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
    let targets = vec![vec![0.0], vec![0.0], vec![0.0], vec![1.0]];
    (inputs, targets)
}

#[test]
fn saved_network_resumes_training_exactly() {
    let (inputs, targets) = and_data();
    let dir = tempdir().unwrap();
    let path = dir.path().join("net.json");

    let mut straight = Network::seeded(&[2, 2, 1], 21).unwrap();
    let mut resumed = straight.clone();

    straight.train(&inputs, &targets, 100, 0.4, 0.8).unwrap();

    resumed.train(&inputs, &targets, 50, 0.4, 0.8).unwrap();
    resumed.save_json(&path).unwrap();
    let mut resumed = Network::load_json(&path).unwrap();
    resumed.train(&inputs, &targets, 50, 0.4, 0.8).unwrap();

    for input in &inputs {
        assert_eq!(straight.forward(input).unwrap(), resumed.forward(input).unwrap());
    }
}

#[test]
fn loading_garbage_is_a_serialization_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Network::load_json(&path), Err(NetError::Serialization(_))));
    assert!(matches!(
        Network::load_json(dir.path().join("missing.json")),
        Err(NetError::Io(_))
    ));
}

#[test]
fn spec_file_drives_construction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spec.json");

    let mut spec = NetworkSpec::new("and", vec![2, 3, 1]).with_seed(4);
    spec.activation = ActivationFunction::Tanh;
    spec.derivative = DerivativeMode::Analytic;
    spec.init = WeightInit::Xavier;
    spec.save_json(&path).unwrap();

    let loaded = NetworkSpec::load_json(&path).unwrap();
    assert_eq!(loaded, spec);

    let network = loaded.build().unwrap();
    assert_eq!(network.architecture(), vec![2, 3, 1]);
    assert_eq!(network.activation(), &ActivationFunction::Tanh);
    for layer in network.layers() {
        for unit in layer.units() {
            assert_eq!(unit.derivative_mode(), DerivativeMode::Analytic);
        }
    }
}

#[test]
fn custom_activation_trains_but_cannot_be_saved() {
    let (inputs, targets) = and_data();
    let mut network = Network::with_options(
        &[2, 1],
        1,
        ActivationFunction::custom("logistic", |x| 1.0 / (1.0 + (-x).exp())),
        WeightInit::Uniform,
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap();
    network.train(&inputs, &targets, 10, 0.5, 0.9).unwrap();

    let dir = tempdir().unwrap();
    let err = network.save_json(dir.path().join("custom.json")).unwrap_err();
    assert!(matches!(err, NetError::Unserializable(_)));
}
