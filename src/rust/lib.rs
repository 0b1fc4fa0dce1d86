//! A reproducible hate speech classifier for scraped social media posts:
//! text normalization, class balancing, TF-IDF features and a linear model
//! fitted by SGD, with versioned model artifacts and parallel batch inference.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hs_classifier::{Corpus, Label, LabeledExample, PipelineConfig, Trainer, TrainingPipeline};
//!
//! let mut examples = Vec::new();
//! for i in 0..12 {
//!     examples.push(LabeledExample::new(format!("RT @user: I hate group{}!!", i), Label::Positive));
//! }
//! for i in 0..20 {
//!     examples.push(LabeledExample::new(format!("what a lovely day{} http://t.co/x", i), Label::Negative));
//! }
//!
//! let pipeline = TrainingPipeline::new(PipelineConfig::default(), Trainer::builder().build()?);
//! let report = pipeline.run(&Corpus::new(examples))?;
//! println!("Model F1 score: {:.4}", report.evaluation.f1);
//!
//! assert_eq!(report.model.predict("i HATE them"), Label::Positive);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A [`TrainedModel`] is immutable and can be shared across threads using `Arc`,
//! or handed to an [`InferenceRunner`] to label a batch in parallel:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hs_classifier::{Corpus, InferenceRunner, Label, LabeledExample, RawRecord, RuntimeConfig, Trainer};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let examples: Corpus = (0..10)
//!     .flat_map(|i| {
//!         vec![
//!             LabeledExample::new(format!("hate post {}", i), Label::Positive),
//!             LabeledExample::new(format!("nice post {}", i), Label::Negative),
//!         ]
//!     })
//!     .collect();
//! let (model, _) = Trainer::builder().build()?.train(&examples)?;
//! let model = Arc::new(model);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let model = Arc::clone(&model);
//!     handles.push(thread::spawn(move || model.predict("test text")));
//! }
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! let runner = InferenceRunner::new(&RuntimeConfig::with_threads(2))?;
//! let labels = runner.apply(&model, &[RawRecord::from_text("hate"), RawRecord::missing()]);
//! assert_eq!(labels.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod inference;
pub mod model_store;
pub mod pipeline;
mod runtime;

pub use classifier::{
    balance, f1_score, is_mention, normalize, ClassifierError, Evaluation, FeatureVector, Loss, ModelInfo,
    TextFeatures, TrainedModel, Trainer, TrainerBuilder, Vectorizer, Vocabulary,
};
pub use config::PipelineConfig;
pub use corpus::{
    load_inference_table, load_training_corpus, save_labeled_table, Corpus, CorpusSchema, InferenceTable, Label,
    LabeledExample, RawRecord,
};
pub use inference::{apply, InferenceRunner, PredictionResult};
pub use model_store::{load_model, read_model, save_model, write_model, ModelStore};
pub use pipeline::{run_labeling, LabelingJob, TrainingPipeline, TrainingReport};
pub use runtime::{create_thread_pool, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
