//! Batch labeling of unlabeled records with a persisted model.

use log::info;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::classifier::{ClassifierError, TrainedModel};
use crate::corpus::{Label, RawRecord};
use crate::runtime::{create_thread_pool, RuntimeConfig};

/// Label assigned to one inference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionResult {
    /// Raw input text, empty when the record had none
    pub text: String,
    pub predicted_label: Label,
}

impl PredictionResult {
    pub fn new(text: impl Into<String>, predicted_label: Label) -> Self {
        Self {
            text: text.into(),
            predicted_label,
        }
    }
}

fn predict_record(model: &TrainedModel, record: &RawRecord) -> PredictionResult {
    let text = record.text_or_empty();
    PredictionResult::new(text, model.predict(text))
}

/// Labels `records` sequentially, one result per record in input order.
pub fn apply(model: &TrainedModel, records: &[RawRecord]) -> Vec<PredictionResult> {
    records.iter().map(|record| predict_record(model, record)).collect()
}

/// Runs inference across records on a dedicated rayon pool.
///
/// Output is identical to [`apply`]: same order, same labels.
pub struct InferenceRunner {
    pool: ThreadPool,
}

impl InferenceRunner {
    pub fn new(config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        Ok(Self {
            pool: create_thread_pool(config)?,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn apply(&self, model: &TrainedModel, records: &[RawRecord]) -> Vec<PredictionResult> {
        info!("Labeling {} records on {} threads", records.len(), self.threads());
        let results: Vec<PredictionResult> = self.pool.install(|| {
            records
                .par_iter()
                .map(|record| predict_record(model, record))
                .collect()
        });
        let positives = results.iter().filter(|r| r.predicted_label == Label::Positive).count();
        info!("Labeled {} records ({} positive)", results.len(), positives);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Vectorizer;
    use ndarray::Array1;

    fn model() -> TrainedModel {
        let vectorizer = Vectorizer::fit(&["hate you", "love you"]);
        TrainedModel::new(vectorizer, Array1::from_vec(vec![1.5, 0.0, -1.5]), -0.05)
    }

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::from_text("I HATE you"),
            RawRecord::missing(),
            RawRecord::from_text("love love"),
            RawRecord::from_text("totally unknown words"),
            RawRecord::from_text("@hate http://hate.com"),
        ]
    }

    #[test]
    fn test_apply_is_total_and_ordered() {
        let results = apply(&model(), &records());
        let labels: Vec<Label> = results.iter().map(|r| r.predicted_label).collect();
        assert_eq!(
            labels,
            vec![Label::Positive, Label::Negative, Label::Negative, Label::Negative, Label::Negative]
        );
        assert_eq!(results[0].text, "I HATE you");
        assert_eq!(results[1].text, "");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = model();
        let records: Vec<RawRecord> = records().into_iter().cycle().take(500).collect();
        let runner = InferenceRunner::new(&RuntimeConfig::with_threads(4)).unwrap();
        assert_eq!(runner.apply(&model, &records), apply(&model, &records));
    }

    #[test]
    fn test_empty_batch() {
        let runner = InferenceRunner::new(&RuntimeConfig::default()).unwrap();
        assert!(runner.apply(&model(), &[]).is_empty());
    }
}
