use std::cmp::Ordering;

use ndarray::Array1;

use super::error::ClassifierError;
use super::features::{FeatureVector, TextFeatures, Vectorizer, Vocabulary};
use super::normalize::normalize;
use super::ModelInfo;
use crate::corpus::Label;

/// Version tag written into every persisted artifact.
pub const FORMAT_VERSION: u32 = 1;

/// A trained linear classifier over a frozen TF-IDF feature space.
///
/// This is the only value that crosses the train/inference boundary. It is
/// never mutated after construction, so it can be shared freely across threads.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use hs_classifier::{Corpus, Label, LabeledExample, Trainer};
///
/// let mut examples = Vec::new();
/// for i in 0..10 {
///     examples.push(LabeledExample::new(format!("i hate thing{}", i), Label::Positive));
///     examples.push(LabeledExample::new(format!("i love thing{}", i), Label::Negative));
/// }
/// let (model, _evaluation) = Trainer::builder().build()?.train(&Corpus::new(examples))?;
///
/// assert_eq!(model.predict("I HATE it!"), Label::Positive);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    vocabulary: Vocabulary,
    idf_weights: Array1<f64>,
    classifier_weights: Array1<f64>,
    bias: f64,
    format_version: u32,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<TrainedModel>();
    }
};

impl TextFeatures for TrainedModel {
    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn idf_weights(&self) -> &Array1<f64> {
        &self.idf_weights
    }
}

impl TrainedModel {
    pub(crate) fn new(vectorizer: Vectorizer, classifier_weights: Array1<f64>, bias: f64) -> Self {
        let (vocabulary, idf_weights) = vectorizer.into_parts();
        Self {
            vocabulary,
            idf_weights,
            classifier_weights,
            bias,
            format_version: FORMAT_VERSION,
        }
    }

    /// Reassembles a model from persisted parts, checking every length agrees.
    pub(crate) fn from_parts(
        tokens: Vec<String>,
        idf_weights: Vec<f64>,
        classifier_weights: Vec<f64>,
        bias: f64,
        format_version: u32,
    ) -> Result<Self, ClassifierError> {
        if format_version != FORMAT_VERSION {
            return Err(ClassifierError::persistence(format!(
                "Unsupported format version {} (expected {})",
                format_version, FORMAT_VERSION
            )));
        }
        let vocabulary = Vocabulary::from_tokens(tokens)
            .ok_or_else(|| ClassifierError::persistence("Vocabulary contains duplicate tokens"))?;
        if idf_weights.len() != vocabulary.len() || classifier_weights.len() != vocabulary.len() {
            return Err(ClassifierError::persistence(format!(
                "Dimension mismatch: vocabulary {}, idf {}, weights {}",
                vocabulary.len(),
                idf_weights.len(),
                classifier_weights.len()
            )));
        }
        if !bias.is_finite()
            || idf_weights.iter().any(|w| !w.is_finite())
            || classifier_weights.iter().any(|w| !w.is_finite())
        {
            return Err(ClassifierError::persistence("Model contains non-finite values"));
        }

        Ok(Self {
            vocabulary,
            idf_weights: Array1::from_vec(idf_weights),
            classifier_weights: Array1::from_vec(classifier_weights),
            bias,
            format_version,
        })
    }

    pub fn classifier_weights(&self) -> &Array1<f64> {
        &self.classifier_weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Signed distance-like score for a feature vector; positive means label 1.
    pub fn decision_score(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.classifier_weights) + self.bias
    }

    /// Labels an already vectorized input.
    pub fn predict_features(&self, features: &FeatureVector) -> Label {
        Label::from_score(self.decision_score(features))
    }

    /// Decision score of raw text (normalized here, then vectorized).
    pub fn decision_function(&self, text: &str) -> f64 {
        self.decision_score(&self.transform(&normalize(text)))
    }

    /// Labels raw text. Unknown tokens and empty text are valid inputs.
    pub fn predict(&self, text: &str) -> Label {
        Label::from_score(self.decision_function(text))
    }

    /// IDF weight of `token`, `None` when it is not in the vocabulary
    pub fn idf_of(&self, token: &str) -> Option<f64> {
        self.vocabulary.get(token).map(|idx| self.idf_weights[idx])
    }

    /// Tokens with the largest weights toward `label`, strongest first.
    pub fn top_features(&self, label: Label, k: usize) -> Vec<(String, f64)> {
        let sign = label.sign();
        let mut ranked: Vec<(usize, f64)> = self
            .classifier_weights
            .iter()
            .enumerate()
            .map(|(i, &w)| (i, w * sign))
            .filter(|&(_, w)| w > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(k)
            .map(|(i, _)| (self.vocabulary.tokens()[i].clone(), self.classifier_weights[i]))
            .collect()
    }

    /// Returns a summary of the model's shape
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            format_version: self.format_version,
            vocabulary_size: self.vocabulary.len(),
            nonzero_weights: self.classifier_weights.iter().filter(|w| **w != 0.0).count(),
            bias: self.bias,
        }
    }
}
