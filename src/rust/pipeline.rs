//! End-to-end training and labeling runs.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::classifier::{balance, ClassifierError, Evaluation, Trainer, TrainedModel};
use crate::config::PipelineConfig;
use crate::corpus::{load_inference_table, load_training_corpus, save_labeled_table, Corpus, Label};
use crate::inference::{InferenceRunner, PredictionResult};
use crate::model_store::{load_model, save_model};

/// Outcome of a successful training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model: TrainedModel,
    pub evaluation: Evaluation,
    /// Examples read from the source corpus
    pub corpus_size: usize,
    /// Examples handed to the trainer, after balancing
    pub training_size: usize,
}

/// Normalize, balance, train and evaluate.
pub struct TrainingPipeline {
    config: PipelineConfig,
    trainer: Trainer,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig, trainer: Trainer) -> Self {
        Self { config, trainer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn run(&self, corpus: &Corpus) -> Result<TrainingReport, ClassifierError> {
        info!(
            "Training on {} examples ({} negative, {} positive)",
            corpus.len(),
            corpus.count(Label::Negative),
            corpus.count(Label::Positive)
        );
        let normalized = corpus.normalized();

        let prepared = if self.config.balance {
            balance(&normalized, self.config.balance_seed)?
        } else {
            normalized
        };

        let (model, evaluation) = self.trainer.train(&prepared)?;
        info!("Model F1 score: {:.4}", evaluation.f1);

        Ok(TrainingReport {
            model,
            evaluation,
            corpus_size: corpus.len(),
            training_size: prepared.len(),
        })
    }

    pub fn run_from_path(&self, corpus_path: impl AsRef<Path>) -> Result<TrainingReport, ClassifierError> {
        let corpus = load_training_corpus(corpus_path, &self.config.schema)?;
        self.run(&corpus)
    }

    /// Trains from `corpus_path` and persists the model to `artifact_path`.
    ///
    /// Nothing is written unless training succeeds.
    pub fn run_and_save(
        &self,
        corpus_path: impl AsRef<Path>,
        artifact_path: impl AsRef<Path>,
    ) -> Result<TrainingReport, ClassifierError> {
        let report = self.run_from_path(corpus_path)?;
        save_model(&report.model, artifact_path)?;
        Ok(report)
    }
}

/// Settings of one labeling run over a CSV file.
#[derive(Debug, Clone)]
pub struct LabelingJob {
    pub model_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub text_column: String,
    /// Append an `is_mention` column
    pub flag_mentions: bool,
}

/// Loads the model, labels every row of the input table and writes the output table.
pub fn run_labeling(job: &LabelingJob, runner: &InferenceRunner) -> Result<Vec<PredictionResult>, ClassifierError> {
    let model = load_model(&job.model_path)?;
    let table = load_inference_table(&job.input_path, &job.text_column)?;
    if table.is_empty() {
        warn!("Inference table {:?} has no rows", job.input_path);
    }
    let predictions = runner.apply(&model, &table.records);
    save_labeled_table(&job.output_path, &table, &predictions, job.flag_mentions)?;
    Ok(predictions)
}
