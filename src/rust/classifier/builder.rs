use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::error::ClassifierError;
use super::features::{TextFeatures, Vectorizer};
use super::metrics::Evaluation;
use super::model::TrainedModel;
use super::normalize::normalize;
use super::sgd::{fit_sgd, Loss, SgdParams};
use crate::corpus::{Corpus, Label, LabeledExample};

/// Seed used for splitting and SGD when none is supplied
pub const DEFAULT_SEED: u64 = 101;
/// Share of the corpus held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.25;

/// A builder for constructing a [`Trainer`] with a fluent interface.
///
/// # Example
/// ```
/// use hs_classifier::{Loss, TrainerBuilder};
///
/// let trainer = TrainerBuilder::new()
///     .with_seed(7)
///     .with_test_fraction(0.2)
///     .with_loss(Loss::Log)
///     .build()
///     .unwrap();
/// assert_eq!(trainer.seed(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct TrainerBuilder {
    seed: u64,
    test_fraction: f64,
    params: SgdParams,
}

impl Default for TrainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerBuilder {
    /// Creates a builder with the default hyper-parameters
    pub fn new() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            params: SgdParams::default(),
        }
    }

    /// Seed for the train/test split and the SGD visiting order
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fraction of the corpus held out for evaluation, in `[0, 1)`
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_loss(mut self, loss: Loss) -> Self {
        self.params.loss = loss;
        self
    }

    /// L2 regularization strength, must be positive
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.params.alpha = alpha;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.params.max_epochs = max_epochs;
        self
    }

    /// Early-stopping tolerance on the per-sample loss improvement
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.params.tolerance = tolerance;
        self
    }

    pub fn with_n_iter_no_change(mut self, n: usize) -> Self {
        self.params.n_iter_no_change = n;
        self
    }

    /// Validates the hyper-parameters and returns the trainer
    ///
    /// # Returns
    /// * `Result<Trainer, ClassifierError>` - a `ConfigurationError` if:
    ///   - `test_fraction` is not within `[0, 1)`
    ///   - `alpha` is not a positive finite number
    ///   - `tolerance` is negative or not finite
    ///   - `max_epochs` or `n_iter_no_change` is zero
    pub fn build(self) -> Result<Trainer, ClassifierError> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(ClassifierError::configuration(format!(
                "test_fraction must be within [0, 1), got {}",
                self.test_fraction
            )));
        }
        if !(self.params.alpha.is_finite() && self.params.alpha > 0.0) {
            return Err(ClassifierError::configuration(format!(
                "alpha must be positive, got {}",
                self.params.alpha
            )));
        }
        if !(self.params.tolerance.is_finite() && self.params.tolerance >= 0.0) {
            return Err(ClassifierError::configuration(format!(
                "tolerance must be non-negative, got {}",
                self.params.tolerance
            )));
        }
        if self.params.max_epochs == 0 {
            return Err(ClassifierError::configuration("max_epochs must be at least 1"));
        }
        if self.params.n_iter_no_change == 0 {
            return Err(ClassifierError::configuration("n_iter_no_change must be at least 1"));
        }

        Ok(Trainer {
            seed: self.seed,
            test_fraction: self.test_fraction,
            params: self.params,
        })
    }
}

/// Fits a [`TrainedModel`] on a labeled corpus and scores it on a held-out split.
#[derive(Debug, Clone)]
pub struct Trainer {
    seed: u64,
    test_fraction: f64,
    params: SgdParams,
}

impl Trainer {
    /// Creates a new TrainerBuilder for fluent construction
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::new()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    pub fn params(&self) -> &SgdParams {
        &self.params
    }

    /// Splits `corpus` into `(train, test)` by a seeded uniform shuffle.
    ///
    /// The test partition holds `ceil(test_fraction * n)` examples.
    pub fn split<'a>(&self, corpus: &'a Corpus) -> (Vec<&'a LabeledExample>, Vec<&'a LabeledExample>) {
        let mut shuffled: Vec<&LabeledExample> = corpus.iter().collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        shuffled.shuffle(&mut rng);

        let n_test = ((self.test_fraction * shuffled.len() as f64).ceil() as usize).min(shuffled.len());
        let train = shuffled.split_off(n_test);
        (train, shuffled)
    }

    /// Trains on `corpus` and evaluates on its held-out partition.
    ///
    /// Texts are normalized before vectorizing (a no-op for text that is already
    /// normalized). The vocabulary and IDF weights only ever see the training
    /// partition.
    ///
    /// # Errors
    /// - `TrainingError` if the training partition is empty or holds a single label
    pub fn train(&self, corpus: &Corpus) -> Result<(TrainedModel, Evaluation), ClassifierError> {
        let (train, test) = self.split(corpus);
        info!("Split corpus: {} train, {} test", train.len(), test.len());

        if train.is_empty() {
            return Err(ClassifierError::training("Training partition is empty"));
        }
        let positives = train.iter().filter(|e| e.label == Label::Positive).count();
        if positives == 0 || positives == train.len() {
            return Err(ClassifierError::training(format!(
                "Training partition holds a single label ({} examples, {} positive)",
                train.len(),
                positives
            )));
        }

        let train_texts: Vec<String> = train.iter().map(|e| normalize(&e.text)).collect();
        let train_labels: Vec<Label> = train.iter().map(|e| e.label).collect();

        let vectorizer = Vectorizer::fit(&train_texts);
        let features = vectorizer.transform_all(&train_texts);
        let dim = vectorizer.vocabulary().len();
        info!("Vocabulary size: {}", dim);

        let fit = fit_sgd(&features, &train_labels, dim, &self.params, self.seed);
        if !fit.converged {
            warn!("SGD reached max_epochs ({}) without converging", self.params.max_epochs);
        }
        let model = TrainedModel::new(vectorizer, fit.weights, fit.bias);

        let test_texts: Vec<String> = test.iter().map(|e| normalize(&e.text)).collect();
        let actual: Vec<Label> = test.iter().map(|e| e.label).collect();
        let predicted: Vec<Label> = model
            .transform_all(&test_texts)
            .iter()
            .map(|features| model.predict_features(features))
            .collect();
        let evaluation = Evaluation::from_predictions(&actual, &predicted);
        info!("Held-out evaluation: {}", evaluation);

        Ok((model, evaluation))
    }
}
