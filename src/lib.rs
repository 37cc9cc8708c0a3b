//! A lightweight classifier for job-search email triage.
//!
//! Emails are vectorized with TF-IDF over case-folded unigrams and bigrams
//! and classified by a multinomial logistic regression trained from a
//! hand-labeled CSV corpus. The fitted vectorizer and model persist as two
//! independent artifacts that an [`InferenceService`] loads once and serves
//! from.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jobtriage::{Corpus, LabeledEmail, Trainer};
//!
//! let mut corpus = Corpus::default();
//! for _ in 0..10 {
//!     corpus.push(LabeledEmail {
//!         subject: "Interview Invitation".into(),
//!         body: "We would like to schedule a coding interview".into(),
//!         label: "Interview Scheduled".into(),
//!     });
//!     corpus.push(LabeledEmail {
//!         subject: "Application Status".into(),
//!         body: "Unfortunately we will not move forward".into(),
//!         label: "Rejected".into(),
//!     });
//! }
//!
//! let (classifier, report) = Trainer::new().train_corpus(&corpus)?;
//! let prediction = classifier.predict("schedule an interview");
//! assert_eq!(prediction.label, "Interview Scheduled");
//! println!("holdout accuracy: {:.2}", report.accuracy);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! Training persists two artifacts through an [`ArtifactStore`]; an
//! [`InferenceService`] loads them once and answers single, batch, and
//! category queries. A missing artifact pair leaves the service in a
//! queryable "model unavailable" state rather than failing startup:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jobtriage::{ArtifactStore, InferenceService};
//!
//! let dir = tempfile::tempdir()?;
//! let service = InferenceService::new(ArtifactStore::new(dir.path())?);
//! assert!(!service.is_available());
//! # Ok(())
//! # }
//! ```

pub mod artifact_store;
pub mod classifier;
pub mod corpus;
pub mod service;
pub mod trainer;

pub use artifact_store::{ArtifactError, ArtifactStore};
pub use classifier::{
    Classifier, ClassifierInfo, LinearModel, PredictError, Prediction, TfidfVectorizer,
    VectorizerConfig,
};
pub use corpus::{Corpus, LabeledEmail};
pub use service::{EmailInput, InferenceService};
pub use trainer::{ClassMetrics, TrainError, Trainer, TrainingConfig, TrainingReport};

pub fn init_logger() {
    env_logger::init();
}
