pub mod balance;
pub mod builder;
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod sgd;

pub use balance::balance;
pub use builder::{Trainer, TrainerBuilder, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
pub use error::ClassifierError;
pub use features::{tokenize, FeatureVector, TextFeatures, Vectorizer, Vocabulary};
pub use metrics::{f1_score, Evaluation};
pub use model::{TrainedModel, FORMAT_VERSION};
pub use normalize::{is_mention, normalize};
pub use sgd::{fit_sgd, Loss, SgdFit, SgdParams};

/// Summary of a trained model, as reported by `TrainedModel::info`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub format_version: u32,
    pub vocabulary_size: usize,
    /// Classifier weights that are exactly zero are not counted
    pub nonzero_weights: usize,
    pub bias: f64,
}
