use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Strategy for a unit's initial weight vector (bias weights first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Uniform on the open interval (-0.5, 0.5).
    #[default]
    Uniform,
    /// Deterministic `0.5, 0.4, 0.5, 0.5, 0.4, 0.5, ...`; for tests.
    Alternating,
    /// Xavier (Glorot): N(0, sqrt(1 / fan_in)).
    Xavier,
}

impl WeightInit {
    /// Produces `len` initial weights. `fan_in` counts bias and input
    /// connections; only `Xavier` uses it.
    pub fn weights<R: Rng + ?Sized>(&self, len: usize, fan_in: usize, rng: &mut R) -> Vec<f64> {
        match self {
            WeightInit::Uniform => (0..len).map(|_| open_uniform(rng)).collect(),
            WeightInit::Alternating => (0..len)
                .map(|i| if i % 3 == 1 { 0.4 } else { 0.5 })
                .collect(),
            WeightInit::Xavier => {
                let std_dev = (1.0 / fan_in.max(1) as f64).sqrt();
                (0..len).map(|_| sample_standard_normal(rng) * std_dev).collect()
            }
        }
    }
}

/// `gen::<f64>()` is in [0, 1); the lower bound is rejected to keep (-0.5, 0.5) open.
fn open_uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let w = rng.gen::<f64>() - 0.5;
        if w > -0.5 {
            return w;
        }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_stays_inside_open_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = WeightInit::Uniform.weights(10_000, 3, &mut rng);
        assert_eq!(w.len(), 10_000);
        assert!(w.iter().all(|&x| x > -0.5 && x < 0.5));
    }

    #[test]
    fn alternating_repeats_every_three() {
        let mut rng = StdRng::seed_from_u64(0);
        let w = WeightInit::Alternating.weights(6, 6, &mut rng);
        assert_eq!(w, vec![0.5, 0.4, 0.5, 0.5, 0.4, 0.5]);
    }

    #[test]
    fn same_seed_gives_same_weights() {
        let a = WeightInit::Xavier.weights(16, 4, &mut StdRng::seed_from_u64(42));
        let b = WeightInit::Xavier.weights(16, 4, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.iter().all(|x| x.is_finite()));
    }
}
