#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod model;
mod utils;
mod vectorizer;

pub use classifier::{Classifier, Prediction};
pub use error::PredictError;
pub use model::LinearModel;
pub use vectorizer::{TfidfVectorizer, VectorizerConfig};

pub(crate) use model::FitOptions;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes, in the order learned at fit time
    pub class_labels: Vec<String>,
    /// Number of terms in the fitted vocabulary
    pub vocabulary_size: usize,
}
