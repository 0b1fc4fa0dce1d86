//! Stochastic gradient descent for a linear binary classifier with L2 penalty.
//!
//! Uses the "optimal" learning rate schedule `eta = 1 / (alpha * (t0 + t - 1))`
//! and keeps the weight vector as `scale * w` so the L2 shrinkage applied on
//! every step is O(1) instead of O(dim).

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::features::FeatureVector;
use crate::corpus::Label;

const MIN_SCALE: f64 = 1e-9;
const MAX_DLOSS: f64 = 1e12;

/// Convex surrogate loss minimized by SGD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loss {
    /// `max(0, 1 - y·p)`, a linear SVM
    #[default]
    Hinge,
    /// `ln(1 + exp(-y·p))`, logistic regression
    Log,
}

impl Loss {
    /// Loss of decision value `p` against target `y ∈ {-1, +1}`
    pub fn loss(self, p: f64, y: f64) -> f64 {
        let z = p * y;
        match self {
            Loss::Hinge => (1.0 - z).max(0.0),
            Loss::Log => {
                if z > 18.0 {
                    (-z).exp()
                } else if z < -18.0 {
                    -z
                } else {
                    (-z).exp().ln_1p()
                }
            }
        }
    }

    /// Derivative of the loss with respect to `p`
    pub fn dloss(self, p: f64, y: f64) -> f64 {
        let z = p * y;
        match self {
            Loss::Hinge => {
                if z <= 1.0 {
                    -y
                } else {
                    0.0
                }
            }
            Loss::Log => {
                if z > 18.0 {
                    -y * (-z).exp()
                } else if z < -18.0 {
                    -y
                } else {
                    -y / (z.exp() + 1.0)
                }
            }
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loss::Hinge => write!(f, "hinge"),
            Loss::Log => write!(f, "log"),
        }
    }
}

impl FromStr for Loss {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hinge" => Ok(Loss::Hinge),
            "log" | "logistic" => Ok(Loss::Log),
            other => Err(format!("unknown loss '{}' (expected 'hinge' or 'log')", other)),
        }
    }
}

/// Hyper-parameters of one SGD fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdParams {
    pub loss: Loss,
    /// L2 regularization strength
    pub alpha: f64,
    /// Upper bound on passes over the training data
    pub max_epochs: usize,
    /// Minimum per-sample improvement of the epoch loss
    pub tolerance: f64,
    /// Consecutive epochs without improvement before stopping
    pub n_iter_no_change: usize,
}

impl Default for SgdParams {
    fn default() -> Self {
        Self {
            loss: Loss::Hinge,
            alpha: 1e-4,
            max_epochs: 1000,
            tolerance: 1e-3,
            n_iter_no_change: 5,
        }
    }
}

/// Result of [`fit_sgd`].
#[derive(Debug, Clone)]
pub struct SgdFit {
    pub weights: Array1<f64>,
    pub bias: f64,
    pub epochs: usize,
    pub converged: bool,
}

/// Fits weights and bias over `features`/`labels`.
///
/// Each epoch visits the examples in an order shuffled by an RNG seeded with
/// `seed`, so the fit is reproducible. `dim` is the vocabulary size.
pub fn fit_sgd(
    features: &[FeatureVector],
    labels: &[Label],
    dim: usize,
    params: &SgdParams,
    seed: u64,
) -> SgdFit {
    debug_assert_eq!(features.len(), labels.len());

    let n = features.len();
    let alpha = params.alpha;
    let mut weights = Array1::<f64>::zeros(dim);
    let mut scale = 1.0;
    let mut bias = 0.0;

    // Heuristic for t0 so the first steps are neither tiny nor explosive
    let typw = (1.0 / alpha.sqrt()).sqrt();
    let eta0 = typw / params.loss.dloss(-typw, 1.0).abs().max(1.0);
    let t0 = 1.0 / (eta0 * alpha);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t = 1.0;
    let mut best_loss = f64::INFINITY;
    let mut no_improvement = 0;
    let mut epochs = 0;
    let mut converged = false;

    for epoch in 1..=params.max_epochs {
        epochs = epoch;
        order.shuffle(&mut rng);
        let mut sum_loss = 0.0;

        for &i in &order {
            let x = &features[i];
            let y = labels[i].sign();
            let eta = 1.0 / (alpha * (t0 + t - 1.0));

            let p = x.dot(&weights) * scale + bias;
            sum_loss += params.loss.loss(p, y);
            let update = -eta * params.loss.dloss(p, y).clamp(-MAX_DLOSS, MAX_DLOSS);

            let shrink = 1.0 - eta * alpha;
            if shrink > 0.0 {
                scale *= shrink;
            } else {
                weights.fill(0.0);
                scale = 1.0;
            }

            if update != 0.0 {
                for (j, v) in x.iter() {
                    weights[j] += update * v / scale;
                }
                bias += update;
            }

            if scale < MIN_SCALE {
                weights *= scale;
                scale = 1.0;
            }
            t += 1.0;
        }

        debug!("Epoch {}: total loss {:.6}", epoch, sum_loss);

        if sum_loss > best_loss - params.tolerance * n as f64 {
            no_improvement += 1;
        } else {
            no_improvement = 0;
        }
        if sum_loss < best_loss {
            best_loss = sum_loss;
        }
        if no_improvement >= params.n_iter_no_change {
            converged = true;
            break;
        }
    }

    weights *= scale;
    info!(
        "SGD ({}) finished after {} epochs (converged: {})",
        params.loss, epochs, converged
    );

    SgdFit {
        weights,
        bias,
        epochs,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::features::{TextFeatures, Vectorizer};

    fn separable() -> (Vec<FeatureVector>, Vec<Label>, usize) {
        let texts = [
            "good fine great",
            "good nice",
            "great day",
            "bad awful",
            "awful terrible",
            "bad day terrible",
        ];
        let labels = vec![
            Label::Negative,
            Label::Negative,
            Label::Negative,
            Label::Positive,
            Label::Positive,
            Label::Positive,
        ];
        let vectorizer = Vectorizer::fit(&texts);
        let features = vectorizer.transform_all(&texts);
        (features, labels, vectorizer.vocabulary().len())
    }

    #[test]
    fn test_loss_values() {
        assert_eq!(Loss::Hinge.loss(2.0, 1.0), 0.0);
        assert_eq!(Loss::Hinge.loss(0.0, 1.0), 1.0);
        assert_eq!(Loss::Hinge.dloss(0.5, -1.0), 1.0);
        assert_eq!(Loss::Hinge.dloss(3.0, 1.0), 0.0);
        assert!((Loss::Log.loss(0.0, 1.0) - 2.0f64.ln()).abs() < 1e-12);
        assert!((Loss::Log.dloss(0.0, 1.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_loss_from_str() {
        assert_eq!("hinge".parse::<Loss>().unwrap(), Loss::Hinge);
        assert_eq!("LOG".parse::<Loss>().unwrap(), Loss::Log);
        assert!("squared".parse::<Loss>().is_err());
    }

    #[test]
    fn test_fit_separates_training_data() {
        let (features, labels, dim) = separable();
        for loss in [Loss::Hinge, Loss::Log] {
            let params = SgdParams {
                loss,
                ..SgdParams::default()
            };
            let fit = fit_sgd(&features, &labels, dim, &params, 101);
            for (x, &label) in features.iter().zip(&labels) {
                let score = x.dot(&fit.weights) + fit.bias;
                assert_eq!(Label::from_score(score), label, "loss {}", loss);
            }
        }
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (features, labels, dim) = separable();
        let params = SgdParams::default();
        let a = fit_sgd(&features, &labels, dim, &params, 7);
        let b = fit_sgd(&features, &labels, dim, &params, 7);
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
        assert_eq!(a.epochs, b.epochs);
    }

    #[test]
    fn test_max_epochs_bounds_fit() {
        let (features, labels, dim) = separable();
        let params = SgdParams {
            max_epochs: 2,
            ..SgdParams::default()
        };
        let fit = fit_sgd(&features, &labels, dim, &params, 1);
        assert!(fit.epochs <= 2);
        assert!(fit.weights.iter().all(|w| w.is_finite()));
    }
}
