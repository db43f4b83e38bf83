use backprop_nn::{Network, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SEED: u64 = 2024;
const EPOCHS: usize = 10_000;
const LEARNING_RATE: f64 = 0.5;
const MOMENTUM: f64 = 0.9;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

/// Trains a 2-2-1 network on XOR and prints its truth table.
fn run() -> Result<()> {
    let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
    let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];

    let mut network = Network::seeded(&[2, 2, 1], SEED)?;
    info!(seed = SEED, parameters = network.parameter_count(), "built network");

    network.train(&inputs, &targets, EPOCHS, LEARNING_RATE, MOMENTUM)?;

    for (input, target) in inputs.iter().zip(&targets) {
        let output = network.forward(input)?[0];
        let class = network.classify(input)?[0];
        println!("{input:?} -> {output:.4} (class {class}, target {})", target[0]);
    }
    print!("{network}");
    Ok(())
}
