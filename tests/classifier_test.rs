use hs_classifier::{
    normalize, Corpus, Label, LabeledExample, Loss, PipelineConfig, TextFeatures, TrainedModel, Trainer,
    TrainingPipeline,
};
use std::sync::Arc;
use std::thread;

const HATE_TARGETS: [&str; 10] = [
    "them", "those people", "that group", "the neighbors", "everyone there", "outsiders", "the team",
    "strangers", "those guys", "the others",
];
const PLEASANT_THINGS: [&str; 10] = [
    "sunny mornings", "fresh coffee", "long walks", "good books", "warm soup", "quiet parks", "kind words",
    "old friends", "garden flowers", "lazy sundays",
];

fn hate_corpus() -> Corpus {
    let mut examples = Vec::new();
    for (target, thing) in HATE_TARGETS.iter().zip(PLEASANT_THINGS.iter()) {
        examples.push(LabeledExample::new(format!("RT @someone: I HATE {}!!", target), Label::Positive));
        examples.push(LabeledExample::new(format!("I really enjoy {} http://t.co/abc", thing), Label::Negative));
    }
    Corpus::new(examples)
}

fn setup_test_model() -> TrainedModel {
    let (model, _) = Trainer::builder()
        .build()
        .unwrap()
        .train(&hate_corpus())
        .expect("Failed to train model");
    model
}

#[test]
fn test_end_to_end_classification() -> Result<(), Box<dyn std::error::Error>> {
    let corpus = hate_corpus();
    assert_eq!(corpus.count(Label::Positive), 10);
    assert_eq!(corpus.count(Label::Negative), 10);

    let (model, evaluation) = Trainer::builder().build()?.train(&corpus)?;

    assert_eq!(evaluation.support(), 5);
    assert!((0.0..=1.0).contains(&evaluation.f1));
    assert_eq!(model.predict("they hate it"), Label::Positive);
    assert_eq!(model.predict("i really enjoy it"), Label::Negative);
    Ok(())
}

#[test]
fn test_end_to_end_with_log_loss() -> Result<(), Box<dyn std::error::Error>> {
    let (model, _) = Trainer::builder().with_loss(Loss::Log).build()?.train(&hate_corpus())?;
    assert_eq!(model.predict("@x HATE!!!"), Label::Positive);
    assert_eq!(model.predict("really enjoy"), Label::Negative);
    Ok(())
}

#[test]
fn test_hate_weighs_toward_positive() {
    let model = setup_test_model();
    let idx = model.vocabulary().get("hate").expect("hate is in the training vocabulary");
    assert!(model.classifier_weights()[idx] > 0.0);

    let positive = model.top_features(Label::Positive, model.vocabulary().len());
    assert!(positive.iter().any(|(token, _)| token == "hate"));
    let negative = model.top_features(Label::Negative, model.vocabulary().len());
    assert!(!negative.iter().any(|(token, _)| token == "hate"));
}

#[test]
fn test_vocabulary_is_normalized() {
    let model = setup_test_model();
    for token in model.vocabulary().tokens() {
        assert_eq!(&normalize(token), token);
        assert_ne!(token, "rt");
        assert!(!token.starts_with("http"));
    }
}

#[test]
fn test_unknown_and_empty_input() {
    let model = setup_test_model();
    let _ = model.predict("");
    let _ = model.predict("completely novel vocabulary");
    assert_eq!(model.decision_function(""), model.bias());
    assert_eq!(model.decision_function("zzz qqq"), model.bias());
}

#[test]
fn test_thread_safety() {
    let model = Arc::new(setup_test_model());
    let expected = model.predict("i hate them");
    let mut handles = vec![];

    for _ in 0..3 {
        let model = Arc::clone(&model);
        let handle = thread::spawn(move || model.predict("i hate them"));
        handles.push(handle);
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_pipeline_balances_before_training() -> Result<(), Box<dyn std::error::Error>> {
    let mut examples = hate_corpus().into_examples();
    examples.truncate(14);
    examples.extend((0..6).map(|i| LabeledExample::new(format!("nice weather {}", i), Label::Negative)));
    let corpus = Corpus::new(examples);
    assert_eq!(corpus.count(Label::Positive), 7);
    assert_eq!(corpus.count(Label::Negative), 13);

    let pipeline = TrainingPipeline::new(PipelineConfig::default(), Trainer::builder().build()?);
    let report = pipeline.run(&corpus)?;
    assert_eq!(report.corpus_size, 20);
    assert_eq!(report.training_size, 26);
    assert_eq!(report.model.predict("i hate you"), Label::Positive);
    Ok(())
}
