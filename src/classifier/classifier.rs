use std::collections::HashMap;

use serde::Serialize;

use super::model::LinearModel;
use super::utils::argmax;
use super::vectorizer::TfidfVectorizer;

/// The outcome of classifying one email.
///
/// `probabilities` maps every known label to its probability; the values sum
/// to 1 within floating tolerance, `confidence` is the maximum of them, and
/// `label` is the arg-max. The struct serializes directly into the shape the
/// HTTP shell returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    pub probabilities: HashMap<String, f32>,
}

/// A fitted email classifier: a TF-IDF vectorizer paired with the linear
/// model trained on its feature space.
///
/// # Thread Safety
///
/// Prediction never mutates the fitted state, so a `Classifier` is
/// `Send + Sync` and can be shared across threads behind an `Arc`:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use std::thread;
/// use jobtriage::{Corpus, LabeledEmail, Trainer};
///
/// let mut corpus = Corpus::default();
/// for _ in 0..10 {
///     corpus.push(LabeledEmail {
///         subject: "Interview invitation".into(),
///         body: "We would like to schedule a coding interview".into(),
///         label: "Interview Scheduled".into(),
///     });
///     corpus.push(LabeledEmail {
///         subject: "Application status".into(),
///         body: "Unfortunately we will not move forward".into(),
///         label: "Rejected".into(),
///     });
/// }
/// let (classifier, _) = Trainer::new().train_corpus(&corpus)?;
///
/// let classifier = Arc::new(classifier);
/// let mut handles = vec![];
/// for _ in 0..3 {
///     let classifier = Arc::clone(&classifier);
///     handles.push(thread::spawn(move || {
///         classifier.predict("schedule an interview");
///     }));
/// }
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    vectorizer: TfidfVectorizer,
    model: LinearModel,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Pairs a fitted vectorizer with a fitted model. Callers guarantee the
    /// two agree on dimensionality; the trainer does so by construction and
    /// the artifact store checks before handing the pair over.
    pub(crate) fn new(vectorizer: TfidfVectorizer, model: LinearModel) -> Self {
        Self { vectorizer, model }
    }

    /// Classifies free text and returns the label, its confidence, and the
    /// full probability distribution.
    ///
    /// Deterministic given the same fitted state. Text made entirely of
    /// unknown terms maps to the zero vector and still yields a valid,
    /// low-confidence prediction.
    pub fn predict(&self, text: &str) -> Prediction {
        let features = self.vectorizer.transform(text);
        let probabilities = self.model.predict_probabilities(&features);

        let best = argmax(&probabilities);
        let confidence = probabilities[best];
        let label = self.model.labels()[best].clone();
        let probabilities = self
            .model
            .labels()
            .iter()
            .cloned()
            .zip(probabilities.iter().copied())
            .collect();

        Prediction {
            label,
            confidence,
            probabilities,
        }
    }

    /// Known labels, in the order learned at fit time.
    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.model.labels().len(),
            class_labels: self.model.labels().to_vec(),
            vocabulary_size: self.vectorizer.dimension(),
        }
    }

    pub(crate) fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub(crate) fn model(&self) -> &LinearModel {
        &self.model
    }
}
