use std::sync::Arc;
use std::thread;

use jobtriage::{Corpus, LabeledEmail, Trainer};

fn email(subject: &str, body: &str, label: &str) -> LabeledEmail {
    LabeledEmail {
        subject: subject.to_string(),
        body: body.to_string(),
        label: label.to_string(),
    }
}

fn job_corpus() -> Corpus {
    let mut corpus = Corpus::default();
    for _ in 0..20 {
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

#[test]
fn test_end_to_end_classification() -> Result<(), Box<dyn std::error::Error>> {
    let (classifier, report) = Trainer::new().train_corpus(&job_corpus())?;

    let prediction = classifier.predict("Interview Invitation schedule a call");
    assert_eq!(prediction.label, "Interview Scheduled");
    assert!(prediction.confidence > 0.5);

    let prediction = classifier.predict("Unfortunately we will not move forward");
    assert_eq!(prediction.label, "Rejected");

    assert!(report.accuracy > 0.9);
    Ok(())
}

#[test]
fn test_probabilities_are_valid() -> Result<(), Box<dyn std::error::Error>> {
    let (classifier, _) = Trainer::new().train_corpus(&job_corpus())?;

    for text in [
        "Interview Invitation schedule a call",
        "Unfortunately we will not move forward",
        "something else entirely",
    ] {
        let prediction = classifier.predict(text);
        let sum: f32 = prediction.probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-5, "probabilities summed to {}", sum);
        assert!(prediction
            .probabilities
            .values()
            .all(|p| (0.0..=1.0).contains(p)));

        let max = prediction
            .probabilities
            .values()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(prediction.confidence, max);
        assert_eq!(
            prediction.probabilities[&prediction.label],
            prediction.confidence
        );
    }
    Ok(())
}

#[test]
fn test_out_of_vocabulary_text_degrades_gracefully() -> Result<(), Box<dyn std::error::Error>> {
    let (classifier, _) = Trainer::new().train_corpus(&job_corpus())?;

    let prediction = classifier.predict("zzzz qqqq completely unknown terms");
    assert!(classifier.labels().contains(&prediction.label));
    let sum: f32 = prediction.probabilities.values().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    // the corpus is balanced, so an all-unknown input should sit near the prior
    assert!(prediction.confidence < 0.75);
    Ok(())
}

#[test]
fn test_training_is_deterministic_across_runs() -> Result<(), Box<dyn std::error::Error>> {
    let corpus = job_corpus();
    let (first, _) = Trainer::new().with_seed(42).train_corpus(&corpus)?;
    let (second, _) = Trainer::new().with_seed(42).train_corpus(&corpus)?;

    for text in [
        "Interview Invitation schedule a call",
        "Unfortunately we will not move forward",
        "status update on your application",
    ] {
        let a = first.predict(text);
        let b = second.predict(text);
        assert_eq!(a.label, b.label);
        for (label, probability) in &a.probabilities {
            assert!((probability - b.probabilities[label]).abs() < 1e-6);
        }
    }
    Ok(())
}

#[test]
fn test_thread_safety() -> Result<(), Box<dyn std::error::Error>> {
    let (classifier, _) = Trainer::new().train_corpus(&job_corpus())?;
    let classifier = Arc::new(classifier);
    let mut handles = vec![];

    for _ in 0..3 {
        let classifier = Arc::clone(&classifier);
        handles.push(thread::spawn(move || {
            let prediction = classifier.predict("schedule a coding interview");
            assert_eq!(prediction.label, "Interview Scheduled");
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    Ok(())
}

#[test]
fn test_classifier_info() -> Result<(), Box<dyn std::error::Error>> {
    let (classifier, _) = Trainer::new().train_corpus(&job_corpus())?;
    let info = classifier.info();
    assert_eq!(info.num_classes, 2);
    assert_eq!(info.class_labels, ["Interview Scheduled", "Rejected"]);
    assert!(info.vocabulary_size > 0);
    Ok(())
}
