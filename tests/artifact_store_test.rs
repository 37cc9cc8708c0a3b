use jobtriage::{
    ArtifactError, ArtifactStore, Classifier, Corpus, LabeledEmail, Trainer, VectorizerConfig,
};
use tempfile::tempdir;

fn email(subject: &str, body: &str, label: &str) -> LabeledEmail {
    LabeledEmail {
        subject: subject.to_string(),
        body: body.to_string(),
        label: label.to_string(),
    }
}

fn job_corpus() -> Corpus {
    let mut corpus = Corpus::default();
    for _ in 0..10 {
        corpus.push(email(
            "Interview Invitation",
            "We would like to schedule a coding interview",
            "Interview Scheduled",
        ));
        corpus.push(email(
            "Application Status",
            "Unfortunately we will not move forward",
            "Rejected",
        ));
    }
    corpus
}

fn trained_classifier() -> Classifier {
    let (classifier, _) = Trainer::new()
        .train_corpus(&job_corpus())
        .expect("training failed");
    classifier
}

#[test]
fn test_save_load_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ArtifactStore::new(dir.path())?;
    let classifier = trained_classifier();
    store.save(&classifier)?;

    let loaded = store.load()?;
    assert_eq!(loaded.labels(), classifier.labels());

    for text in [
        "Interview Invitation schedule a call",
        "Unfortunately we will not move forward",
        "",
        "completely unknown words",
    ] {
        let original = classifier.predict(text);
        let reloaded = loaded.predict(text);
        assert_eq!(original.label, reloaded.label);
        for (label, probability) in &original.probabilities {
            assert_eq!(*probability, reloaded.probabilities[label]);
        }
    }
    Ok(())
}

#[test]
fn test_availability_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ArtifactStore::new(dir.path())?;
    assert!(!store.is_available());

    store.save(&trained_classifier())?;
    assert!(store.is_available());
    assert!(store.vectorizer_path().exists());
    assert!(store.classifier_path().exists());

    store.remove()?;
    assert!(!store.is_available());
    Ok(())
}

#[test]
fn test_save_replaces_existing_pair() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ArtifactStore::new(dir.path())?;
    store.save(&trained_classifier())?;

    // retrain with a third class and overwrite
    let mut corpus = job_corpus();
    for _ in 0..10 {
        corpus.push(email(
            "Offer Letter",
            "We are pleased to extend an offer with salary details",
            "Offer",
        ));
    }
    let (retrained, _) = Trainer::new().train_corpus(&corpus)?;
    store.save(&retrained)?;

    let loaded = store.load()?;
    assert_eq!(
        loaded.labels(),
        ["Interview Scheduled", "Offer", "Rejected"]
    );
    Ok(())
}

#[test]
fn test_mismatched_pair_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let wide_dir = tempdir()?;
    let narrow_dir = tempdir()?;
    let wide_store = ArtifactStore::new(wide_dir.path())?;
    let narrow_store = ArtifactStore::new(narrow_dir.path())?;

    wide_store.save(&trained_classifier())?;

    let (narrow, _) = Trainer::new()
        .with_vectorizer_config(VectorizerConfig {
            max_features: 3,
            ..VectorizerConfig::default()
        })
        .train_corpus(&job_corpus())?;
    narrow_store.save(&narrow)?;

    // splice the wide vectorizer into the narrow store
    std::fs::copy(wide_store.vectorizer_path(), narrow_store.vectorizer_path())?;

    let result = narrow_store.load();
    assert!(matches!(result, Err(ArtifactError::Mismatch { .. })));
    Ok(())
}

#[test]
fn test_missing_half_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = ArtifactStore::new(dir.path())?;
    store.save(&trained_classifier())?;

    std::fs::remove_file(store.classifier_path())?;
    assert!(!store.is_available());
    assert!(matches!(store.load(), Err(ArtifactError::NotFound(_))));
    Ok(())
}
