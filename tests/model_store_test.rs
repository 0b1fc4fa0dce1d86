use hs_classifier::{
    load_model, read_model, save_model, write_model, ClassifierError, Corpus, Label, LabeledExample, ModelStore,
    TrainedModel, Trainer,
};
use std::fs;
use tempfile::tempdir;

fn trained_model() -> TrainedModel {
    let corpus: Corpus = (0..10)
        .flat_map(|i| {
            vec![
                LabeledExample::new(format!("i hate crowd{}", i), Label::Positive),
                LabeledExample::new(format!("i love rain{}", i), Label::Negative),
            ]
        })
        .collect();
    Trainer::builder().build().unwrap().train(&corpus).unwrap().0
}

const PROBES: [&str; 6] = ["i hate", "i love rain3", "", "unseen tokens only", "HATE HATE love", "crowd7"];

#[test]
fn test_round_trip_preserves_predictions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("model.hsc");
    let model = trained_model();

    save_model(&model, &path)?;
    assert!(path.exists());
    assert!(!dir.path().join("nested").join("model.hsc.partial").exists());

    let restored = load_model(&path)?;
    assert_eq!(restored, model);
    for probe in PROBES {
        assert_eq!(restored.predict(probe), model.predict(probe));
        assert_eq!(restored.decision_function(probe), model.decision_function(probe));
    }
    Ok(())
}

#[test]
fn test_missing_artifact_is_configuration_error() {
    let dir = tempdir().unwrap();
    let err = load_model(dir.path().join("absent.hsc")).unwrap_err();
    assert!(matches!(err, ClassifierError::ConfigurationError(_)));
}

#[test]
fn test_unknown_version_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("model.hsc");
    save_model(&trained_model(), &path)?;

    let content = fs::read_to_string(&path)?.replacen("\"format_version\":1", "\"format_version\":99", 1);
    fs::write(&path, content)?;

    let err = load_model(&path).unwrap_err();
    assert!(matches!(err, ClassifierError::PersistenceError(ref msg) if msg.contains("99")));
    Ok(())
}

#[test]
fn test_corrupted_artifacts_rejected() {
    let mut buf = Vec::new();
    write_model(&trained_model(), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let (header, payload) = text.split_once('\n').unwrap();

    let cases = vec![
        String::new(),
        "garbage".to_string(),
        format!("{}\n", header),
        format!("{}\n{}", header, &payload[..payload.len() / 2]),
        format!("not json\n{}", payload),
        format!("{}\n{}", header.replace("\"sha256\":\"", "\"sha256\":\"00"), payload),
    ];
    for case in cases {
        let err = read_model(case.as_bytes()).unwrap_err();
        assert!(matches!(err, ClassifierError::PersistenceError(_)), "accepted {:?}", case);
    }
}

#[test]
fn test_named_models() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ModelStore::new(dir.path().join("models"))?;
    assert!(!store.is_model_saved("baseline"));
    assert!(!store.verify_model("baseline")?);

    let model = trained_model();
    let path = store.save(&model, "baseline")?;
    assert!(path.ends_with("baseline/model.hsc"));
    assert!(store.is_model_saved("baseline"));
    assert!(store.verify_model("baseline")?);
    assert_eq!(store.list_models()?, vec!["baseline".to_string()]);
    assert_eq!(store.load("baseline")?, model);

    store.remove_model("baseline")?;
    assert!(!store.is_model_saved("baseline"));
    Ok(())
}

#[test]
fn test_tampered_payload_fails_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ModelStore::new(dir.path())?;
    let path = store.save(&trained_model(), "m")?;

    let content = fs::read_to_string(&path)?.replacen("\"hate\"", "\"hats\"", 1);
    fs::write(&path, content)?;

    assert!(!store.verify_model("m")?);
    assert!(matches!(store.load("m").unwrap_err(), ClassifierError::PersistenceError(_)));
    Ok(())
}

#[test]
fn test_default_models_dir() {
    // Test with environment variable
    std::env::set_var("HS_CLASSIFIER_HOME", "/tmp/hs-test-home");
    let path = ModelStore::get_default_models_dir();
    assert_eq!(path, std::path::PathBuf::from("/tmp/hs-test-home/models"));
    std::env::remove_var("HS_CLASSIFIER_HOME");

    // Test without environment variable
    let path = ModelStore::get_default_models_dir();
    assert!(path.ends_with("hs-classifier/models"));
}
