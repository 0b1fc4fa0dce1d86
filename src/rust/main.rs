use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use hs_classifier::{
    load_model, run_labeling, CorpusSchema, InferenceRunner, Label, LabelingJob, Loss, ModelStore, PipelineConfig,
    RuntimeConfig, Trainer, TrainingPipeline,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model on a labeled CSV corpus and save the artifact
    Train(TrainArgs),
    /// Label every row of an unlabeled CSV table with a saved model
    Apply(ApplyArgs),
    /// Print a summary of a saved model
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ModelLocation {
    /// Artifact path; overrides --name
    #[arg(short, long)]
    model: Option<PathBuf>,
    /// Model name inside the default model directory
    #[arg(long, default_value = "default")]
    name: String,
}

impl ModelLocation {
    fn resolve(&self) -> Result<PathBuf> {
        match &self.model {
            Some(path) => Ok(path.clone()),
            None => {
                let store = ModelStore::new_default().context("Failed to open the default model directory")?;
                Ok(store.get_model_path(&self.name))
            }
        }
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Labeled CSV corpus
    #[arg(short, long)]
    input: PathBuf,
    #[command(flatten)]
    location: ModelLocation,
    #[arg(long, default_value = "text")]
    text_column: String,
    #[arg(long, default_value = "label")]
    label_column: String,
    /// Train on the corpus as-is, without equalizing class counts
    #[arg(long)]
    no_balance: bool,
    #[arg(long, default_value_t = hs_classifier::classifier::DEFAULT_SEED)]
    balance_seed: u64,
    /// Seed for the train/test split and SGD
    #[arg(long, default_value_t = hs_classifier::classifier::DEFAULT_SEED)]
    seed: u64,
    #[arg(long, default_value_t = hs_classifier::classifier::DEFAULT_TEST_FRACTION)]
    test_fraction: f64,
    /// hinge or log
    #[arg(long, default_value = "hinge")]
    loss: Loss,
    #[arg(long, default_value_t = 1e-4)]
    alpha: f64,
    #[arg(long, default_value_t = 1000)]
    max_epochs: usize,
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f64,
}

#[derive(Args)]
struct ApplyArgs {
    /// Unlabeled CSV table
    #[arg(short, long)]
    input: PathBuf,
    /// Where to write the labeled table
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    location: ModelLocation,
    #[arg(long, default_value = "text")]
    text_column: String,
    /// Append an is_mention column (1 when the text starts with '@')
    #[arg(long)]
    flag_mentions: bool,
    /// Inference threads; 0 uses every core
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Args)]
struct InspectArgs {
    #[command(flatten)]
    location: ModelLocation,
    /// Number of strongest tokens to list per label
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn train(args: TrainArgs) -> Result<()> {
    let trainer = Trainer::builder()
        .with_seed(args.seed)
        .with_test_fraction(args.test_fraction)
        .with_loss(args.loss)
        .with_alpha(args.alpha)
        .with_max_epochs(args.max_epochs)
        .with_tolerance(args.tolerance)
        .build()
        .context("Invalid training configuration")?;
    let config = PipelineConfig::default()
        .with_schema(CorpusSchema::new(args.text_column, args.label_column))
        .with_balance(!args.no_balance)
        .with_balance_seed(args.balance_seed);

    let artifact = args.location.resolve()?;
    let start_time = Instant::now();
    let report = TrainingPipeline::new(config, trainer)
        .run_and_save(&args.input, &artifact)
        .with_context(|| format!("Training on {} failed", args.input.display()))?;
    info!("Training took {:.2?}", start_time.elapsed());

    println!("Model F1 score: {:.4}", report.evaluation.f1);
    println!("Held-out evaluation: {}", report.evaluation);
    println!(
        "Trained on {} examples ({} read); model saved to {}",
        report.training_size,
        report.corpus_size,
        artifact.display()
    );
    Ok(())
}

fn apply(args: ApplyArgs) -> Result<()> {
    let runner = InferenceRunner::new(&RuntimeConfig::with_threads(args.threads))?;
    let job = LabelingJob {
        model_path: args.location.resolve()?,
        input_path: args.input,
        output_path: args.output,
        text_column: args.text_column,
        flag_mentions: args.flag_mentions,
    };

    let start_time = Instant::now();
    let predictions = run_labeling(&job, &runner)
        .with_context(|| format!("Labeling {} failed", job.input_path.display()))?;
    info!("Labeling took {:.2?}", start_time.elapsed());

    let positives = predictions.iter().filter(|p| p.predicted_label == Label::Positive).count();
    println!(
        "Labeled {} rows ({} predicted hate speech); wrote {}",
        predictions.len(),
        positives,
        job.output_path.display()
    );
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let path = args.location.resolve()?;
    let model = load_model(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let info = model.info();

    println!("Model: {}", path.display());
    println!("  Format version:  {}", info.format_version);
    println!("  Vocabulary size: {}", info.vocabulary_size);
    println!("  Non-zero weights: {}", info.nonzero_weights);
    println!("  Bias: {:.6}", info.bias);
    for label in [Label::Positive, Label::Negative] {
        println!("  Strongest tokens for label {}:", label);
        for (token, weight) in model.top_features(label, args.top) {
            match model.idf_of(&token) {
                Some(idf) => println!("    {:<20} weight {:+.4}  idf {:.4}", token, weight, idf),
                None => println!("    {:<20} weight {:+.4}", token, weight),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => train(args),
        Command::Apply(args) => apply(args),
        Command::Inspect(args) => inspect(args),
    }
}
