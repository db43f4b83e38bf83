use std::time::Instant;
use tracing::{debug, info};

use crate::error::{check_len, Result};
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Trains `network` online for `config.epochs` epochs and returns the mean
/// loss of the last completed epoch (0.0 when no epoch ran).
///
/// Every epoch walks the samples in the given order and performs one forward
/// and one backward pass per sample. There is no shuffling and no batching.
///
/// # Errors
/// `DimensionMismatch` when `inputs` and `targets` differ in length or any
/// sample has the wrong width. All shapes are checked before the first update.
pub fn train_loop(
    network: &mut Network,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<f64> {
    check_len(inputs.len(), targets.len())?;
    for (input, target) in inputs.iter().zip(targets) {
        check_len(network.input_width(), input.len())?;
        check_len(network.output_width(), target.len())?;
    }

    info!(
        epochs = config.epochs,
        samples = inputs.len(),
        learning_rate = config.learning_rate,
        momentum = config.momentum,
        "training started"
    );

    let mut reporting = config.progress_tx.is_some();
    let mut last_loss = 0.0;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let train_loss = run_one_epoch(network, inputs, targets, config)?;
        last_loss = train_loss;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        debug!(epoch, train_loss, elapsed_ms, "epoch finished");

        if reporting {
            if let Some(ref tx) = config.progress_tx {
                let stats = EpochStats {
                    epoch,
                    total_epochs: config.epochs,
                    train_loss,
                    elapsed_ms,
                };
                if tx.send(stats).is_err() {
                    debug!(epoch, "progress receiver dropped, reporting stopped");
                    reporting = false;
                }
            }
        }
    }

    info!(final_loss = last_loss, "training finished");
    Ok(last_loss)
}

/// One online pass over the data. Returns the mean loss over all samples.
fn run_one_epoch(
    network: &mut Network,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<f64> {
    if inputs.is_empty() {
        return Ok(0.0);
    }
    let mut total_loss = 0.0;
    for (input, target) in inputs.iter().zip(targets) {
        let output = network.forward(input)?;
        total_loss += MseLoss::loss(&output, target);
        network.backward(target, config.learning_rate, config.momentum)?;
    }
    Ok(total_loss / inputs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use std::sync::mpsc;

    fn or_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![1.0]];
        (inputs, targets)
    }

    #[test]
    fn reports_one_stat_per_epoch() {
        let (inputs, targets) = or_data();
        let mut network = Network::seeded(&[2, 1], 2).unwrap();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig::new(5, 0.5, 0.9).with_progress(tx);

        let last = train_loop(&mut network, &inputs, &targets, &config).unwrap();
        drop(config);

        let stats: Vec<EpochStats> = rx.iter().collect();
        assert_eq!(stats.len(), 5);
        assert_eq!(stats.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(stats.iter().all(|s| s.total_epochs == 5));
        assert_eq!(stats[4].train_loss, last);
    }

    #[test]
    fn loss_falls_over_training() {
        let (inputs, targets) = or_data();
        let mut network = Network::seeded(&[2, 1], 6).unwrap();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig::new(500, 0.5, 0.5).with_progress(tx);
        train_loop(&mut network, &inputs, &targets, &config).unwrap();
        drop(config);

        let stats: Vec<EpochStats> = rx.iter().collect();
        assert!(stats[499].train_loss < stats[0].train_loss);
    }

    #[test]
    fn dropped_receiver_does_not_stop_training() {
        let (inputs, targets) = or_data();
        let mut a = Network::seeded(&[2, 1], 4).unwrap();
        let mut b = a.clone();

        let (tx, rx) = mpsc::channel();
        drop(rx);
        let with_channel = TrainConfig::new(50, 0.5, 0.9).with_progress(tx);
        let loss_a = train_loop(&mut a, &inputs, &targets, &with_channel).unwrap();
        let loss_b = train_loop(&mut b, &inputs, &targets, &TrainConfig::new(50, 0.5, 0.9)).unwrap();

        assert_eq!(loss_a, loss_b);
        assert_eq!(a.to_json_string().unwrap(), b.to_json_string().unwrap());
    }

    #[test]
    fn zero_epochs_leave_network_untouched() {
        let (inputs, targets) = or_data();
        let mut network = Network::seeded(&[2, 1], 1).unwrap();
        let before = network.to_json_string().unwrap();
        let loss = train_loop(&mut network, &inputs, &targets, &TrainConfig::new(0, 0.5, 0.9)).unwrap();
        assert_eq!(loss, 0.0);
        assert_eq!(network.to_json_string().unwrap(), before);
    }

    #[test]
    fn bad_sample_width_fails_before_any_update() {
        let (mut inputs, targets) = or_data();
        inputs[3] = vec![1.0];
        let mut network = Network::seeded(&[2, 1], 1).unwrap();
        let before = network.to_json_string().unwrap();
        let err = train_loop(&mut network, &inputs, &targets, &TrainConfig::new(3, 0.5, 0.9)).unwrap_err();
        assert!(matches!(err, NetError::DimensionMismatch { expected: 2, got: 1 }));
        assert_eq!(network.to_json_string().unwrap(), before);
    }
}
