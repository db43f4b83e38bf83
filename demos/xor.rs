use std::sync::mpsc;
use std::thread;

use backprop_nn::{train_loop, EpochStats, Network, NetworkSpec, TrainConfig};

fn main() -> backprop_nn::Result<()> {
    tracing_subscriber::fmt::init();

    let mut network = NetworkSpec::new("xor", vec![2, 2, 1]).with_seed(7).build()?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let (tx, rx) = mpsc::channel::<EpochStats>();
    let printer = thread::spawn(move || {
        for stats in rx {
            if stats.epoch % 1000 == 0 {
                println!("Epoch {}: loss = {:.6}", stats.epoch, stats.train_loss);
            }
        }
    });

    let config = TrainConfig::new(10_000, 0.5, 0.9).with_progress(tx);
    train_loop(&mut network, &inputs, &expected_outputs, &config)?;
    drop(config);
    if printer.join().is_err() {
        tracing::error!("progress printer panicked");
    }

    for input in &inputs {
        println!(
            "Input: {:?} -> Output: {:.4} -> Class: {}",
            input,
            network.forward(input)?[0],
            network.classify(input)?[0]
        );
    }

    let restored = Network::from_json_str(&network.to_json_string()?)?;
    println!("Restored network: {:?}", restored.architecture());
    Ok(())
}
