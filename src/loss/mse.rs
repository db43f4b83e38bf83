/// Mean squared error, used to report training progress.
pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²); 0 for empty slices.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        if predicted.is_empty() {
            return 0.0;
        }
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }
}
