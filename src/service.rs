use std::sync::{Arc, RwLock};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::artifact_store::{ArtifactError, ArtifactStore};
use crate::classifier::{Classifier, PredictError, Prediction};

/// One email in a batch prediction request. Missing fields deserialize to
/// empty strings, matching the corpus null-coalescing rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailInput {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Serves predictions from a persisted artifact pair without retraining.
///
/// The service owns its model state explicitly instead of keeping it in
/// process-wide globals. A missing or corrupt artifact pair leaves the
/// service in a degraded "model unavailable" state that callers can query
/// with [`is_available`](Self::is_available); it never aborts startup.
///
/// Reloading after a retrain swaps the model behind an `RwLock` in a single
/// assignment, so concurrent in-flight predictions observe either the old or
/// the new model, never a mixture.
pub struct InferenceService {
    store: ArtifactStore,
    model: RwLock<Option<Arc<Classifier>>>,
}

impl InferenceService {
    /// Creates a service in the unloaded state.
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            model: RwLock::new(None),
        }
    }

    /// Creates a service and attempts an initial load, logging rather than
    /// propagating a failure.
    pub fn with_initial_load(store: ArtifactStore) -> Self {
        let service = Self::new(store);
        if let Err(e) = service.load() {
            warn!("Model artifacts not loaded: {}", e);
        }
        service
    }

    /// Loads (or reloads) the artifact pair. Idempotent; last load wins.
    ///
    /// On failure the previous model, if any, stays in service and the error
    /// is returned for diagnosis.
    pub fn load(&self) -> Result<(), ArtifactError> {
        match self.store.load() {
            Ok(classifier) => {
                info!(
                    "Inference service ready with {} categories",
                    classifier.labels().len()
                );
                *self.write_slot() = Some(Arc::new(classifier));
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to load model artifacts from {:?}: {}",
                    self.store.artifacts_dir(),
                    e
                );
                Err(e)
            }
        }
    }

    /// True once a load has succeeded.
    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }

    /// Classifies one email.
    ///
    /// # Errors
    /// * `PredictError::ModelUnavailable` before a successful load
    /// * `PredictError::EmptyInput` if subject and body are both empty after
    ///   trimming
    pub fn predict(&self, subject: &str, body: &str) -> Result<Prediction, PredictError> {
        let classifier = self.current().ok_or(PredictError::ModelUnavailable)?;
        if subject.trim().is_empty() && body.trim().is_empty() {
            return Err(PredictError::EmptyInput);
        }
        Ok(classifier.predict(&format!("{} {}", subject, body)))
    }

    /// Classifies a batch, one result per input in input order.
    ///
    /// Items fail independently; a malformed item yields its own error and
    /// never aborts the rest of the batch.
    pub fn predict_batch(&self, emails: &[EmailInput]) -> Vec<Result<Prediction, PredictError>> {
        emails
            .iter()
            .map(|email| self.predict(&email.subject, &email.body))
            .collect()
    }

    /// The label set of the loaded model, in the order learned at fit time.
    pub fn categories(&self) -> Result<Vec<String>, PredictError> {
        let classifier = self.current().ok_or(PredictError::ModelUnavailable)?;
        Ok(classifier.labels().to_vec())
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn current(&self) -> Option<Arc<Classifier>> {
        self.model
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<Classifier>>> {
        self.model
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
