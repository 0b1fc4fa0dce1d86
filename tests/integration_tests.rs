use env_logger::{Builder, Env};
use hs_classifier::{
    load_model, run_labeling, ClassifierError, CorpusSchema, InferenceRunner, Label, LabelingJob, PipelineConfig,
    RuntimeConfig, Trainer, TrainingPipeline,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn write_training_csv(path: &Path) {
    let mut csv = String::from("id,label,tweet\n");
    for i in 0..12 {
        csv.push_str(&format!("{},1,\"RT @troll{}: I hate you all, get out!!\"\n", i, i));
    }
    for i in 0..30 {
        csv.push_str(&format!("{},0,Beautiful evening at the beach with family {} https://t.co/{}\n", 100 + i, i, i));
    }
    fs::write(path, csv).unwrap();
}

fn pipeline(balance: bool) -> TrainingPipeline {
    let config = PipelineConfig::default()
        .with_schema(CorpusSchema::new("tweet", "label"))
        .with_balance(balance);
    TrainingPipeline::new(config, Trainer::builder().build().unwrap())
}

#[test]
fn test_train_save_apply() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempdir()?;
    let training = dir.path().join("train.csv");
    let artifact = dir.path().join("models").join("model.hsc");
    write_training_csv(&training);

    let report = pipeline(true).run_and_save(&training, &artifact)?;
    assert_eq!(report.corpus_size, 42);
    assert_eq!(report.training_size, 60);
    assert!(artifact.exists());

    let input = dir.path().join("scraped.csv");
    fs::write(
        &input,
        "fips,Tweet,place\n\
         06001,@mayor I hate you all,Oakland\n\
         06003,Beautiful evening at the beach,Alpine\n\
         06005\n\
         06007,,Butte\n",
    )?;
    let output = dir.path().join("labeled.csv");
    let job = LabelingJob {
        model_path: artifact,
        input_path: input,
        output_path: output.clone(),
        text_column: "Tweet".to_string(),
        flag_mentions: true,
    };
    let runner = InferenceRunner::new(&RuntimeConfig::with_threads(2))?;
    let predictions = run_labeling(&job, &runner)?;

    let labels: Vec<Label> = predictions.iter().map(|p| p.predicted_label).collect();
    assert_eq!(labels[0], Label::Positive);
    assert_eq!(labels[1], Label::Negative);
    assert_eq!(predictions.len(), 4);
    assert_eq!(predictions[2].text, "");

    let written = fs::read_to_string(&output)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "fips,Tweet,place,predicted_label,is_mention");
    assert_eq!(lines[1], "06001,@mayor I hate you all,Oakland,1,1");
    assert_eq!(lines[2], "06003,Beautiful evening at the beach,Alpine,0,0");
    assert_eq!(lines.len(), 5);

    // Rows without usable text are labeled by the sign of the bias alone
    let bias_label = Label::from_score(load_model(&job.model_path)?.bias());
    assert_eq!(predictions[2].predicted_label, bias_label);
    assert_eq!(predictions[3].predicted_label, bias_label);
    assert_eq!(lines[3], format!("06005,,,{},0", bias_label));
    assert_eq!(lines[4], format!("06007,,Butte,{},0", bias_label));
    Ok(())
}

#[test]
fn test_single_class_corpus_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempdir()?;
    let training = dir.path().join("train.csv");
    let mut csv = String::from("tweet,label\n");
    for i in 0..10 {
        csv.push_str(&format!("just a normal post {},0\n", i));
    }
    fs::write(&training, csv)?;

    let artifact = dir.path().join("model.hsc");
    let err = pipeline(false).run_and_save(&training, &artifact).unwrap_err();
    assert!(matches!(err, ClassifierError::TrainingError(_)));
    assert!(!artifact.exists());

    let err = pipeline(true).run_and_save(&training, &artifact).unwrap_err();
    assert!(matches!(err, ClassifierError::DataShapeError(_)));
    assert!(!artifact.exists());
    Ok(())
}

#[test]
fn test_corrupted_artifact_fails_labeling() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempdir()?;
    let artifact = dir.path().join("model.hsc");
    fs::write(&artifact, "{\"format_version\":7,\"sha256\":\"abc\"}\n{}")?;
    let input = dir.path().join("in.csv");
    fs::write(&input, "text\nhello\n")?;

    let job = LabelingJob {
        model_path: artifact,
        input_path: input,
        output_path: dir.path().join("out.csv"),
        text_column: "text".to_string(),
        flag_mentions: false,
    };
    let runner = InferenceRunner::new(&RuntimeConfig::default())?;
    let err = run_labeling(&job, &runner).unwrap_err();
    assert!(matches!(err, ClassifierError::PersistenceError(_)));
    assert!(!dir.path().join("out.csv").exists());
    Ok(())
}

#[test]
fn test_missing_text_column_in_inference_table() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempdir()?;
    let training = dir.path().join("train.csv");
    let artifact = dir.path().join("model.hsc");
    write_training_csv(&training);
    pipeline(true).run_and_save(&training, &artifact)?;

    let input = dir.path().join("in.csv");
    fs::write(&input, "fips,body\n06001,hello\n")?;
    let job = LabelingJob {
        model_path: artifact,
        input_path: input,
        output_path: dir.path().join("out.csv"),
        text_column: "Tweet".to_string(),
        flag_mentions: false,
    };
    let runner = InferenceRunner::new(&RuntimeConfig::default())?;
    let err = run_labeling(&job, &runner).unwrap_err();
    assert!(matches!(err, ClassifierError::DataShapeError(_)));
    Ok(())
}
