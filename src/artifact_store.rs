use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, LinearModel, TfidfVectorizer};

const SCHEMA_VERSION: u32 = 1;
const VECTORIZER_FILE: &str = "vectorizer.bin";
const CLASSIFIER_FILE: &str = "classifier.bin";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode artifact: {0}")]
    Encode(bincode::Error),
    #[error("Failed to decode artifact {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[error("Unsupported artifact schema version {found} (expected {expected})")]
    SchemaVersion { expected: u32, found: u32 },
    #[error("Artifact mismatch: vectorizer provides {vocabulary} features but classifier expects {features}")]
    Mismatch { vocabulary: usize, features: usize },
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    payload: T,
}

/// Owns the on-disk location of the two persisted artifacts: the fitted
/// vectorizer and the fitted classifier.
///
/// The two files are independent but only valid as a pair; `load` verifies
/// the schema version of each and that their dimensionalities agree before
/// handing out a usable [`Classifier`]. Saving stages both files and then
/// renames them into place, so a failed save never clobbers a valid pair.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at the default artifacts directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("JOBTRIAGE_CACHE") {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("jobtriage").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("jobtriage").join("artifacts");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("jobtriage").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self { artifacts_dir })
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.artifacts_dir.join(VECTORIZER_FILE)
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.artifacts_dir.join(CLASSIFIER_FILE)
    }

    /// True when both artifact files exist. Says nothing about whether they
    /// decode; `load` is the authority on that.
    pub fn is_available(&self) -> bool {
        let vectorizer_path = self.vectorizer_path();
        let classifier_path = self.classifier_path();
        log::debug!(
            "Checking artifacts: {:?} (exists: {}), {:?} (exists: {})",
            vectorizer_path,
            vectorizer_path.exists(),
            classifier_path,
            classifier_path.exists()
        );
        vectorizer_path.exists() && classifier_path.exists()
    }

    /// Persists both halves of a fitted classifier.
    pub fn save(&self, classifier: &Classifier) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.artifacts_dir)?;

        let vectorizer_path = self.vectorizer_path();
        let classifier_path = self.classifier_path();
        let vectorizer_staged = staged_path(&vectorizer_path);
        let classifier_staged = staged_path(&classifier_path);

        write_envelope(&vectorizer_staged, classifier.vectorizer())?;
        if let Err(error) = write_envelope(&classifier_staged, classifier.model()) {
            let _ = fs::remove_file(&vectorizer_staged);
            return Err(error);
        }

        // Both staged; promote. A failure here leaves at worst one renamed
        // file plus a valid previous counterpart of the other.
        fs::rename(&vectorizer_staged, &vectorizer_path)?;
        fs::rename(&classifier_staged, &classifier_path)?;

        log::info!("Saved model artifacts to {:?}", self.artifacts_dir);
        Ok(())
    }

    /// Loads and validates the artifact pair.
    ///
    /// # Errors
    /// * `NotFound` if either file is missing
    /// * `Decode` / `SchemaVersion` on a corrupt or stale artifact
    /// * `Mismatch` if the two artifacts disagree on dimensionality
    pub fn load(&self) -> Result<Classifier, ArtifactError> {
        let vectorizer: TfidfVectorizer = self.read_envelope(&self.vectorizer_path())?;
        let model: LinearModel = self.read_envelope(&self.classifier_path())?;

        if vectorizer.dimension() != model.num_features() {
            log::error!(
                "Artifact pair in {:?} is inconsistent: vectorizer dimension {} vs model features {}",
                self.artifacts_dir,
                vectorizer.dimension(),
                model.num_features()
            );
            return Err(ArtifactError::Mismatch {
                vocabulary: vectorizer.dimension(),
                features: model.num_features(),
            });
        }

        log::info!(
            "Loaded model artifacts from {:?}: {} classes, {} features",
            self.artifacts_dir,
            model.labels().len(),
            model.num_features()
        );
        Ok(Classifier::new(vectorizer, model))
    }

    /// Removes both artifact files if present.
    pub fn remove(&self) -> Result<(), ArtifactError> {
        let vectorizer_path = self.vectorizer_path();
        let classifier_path = self.classifier_path();

        if vectorizer_path.exists() {
            fs::remove_file(&vectorizer_path)?;
        }
        if classifier_path.exists() {
            fs::remove_file(&classifier_path)?;
        }
        Ok(())
    }

    fn read_envelope<T: DeserializeOwned>(&self, path: &Path) -> Result<T, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let envelope: Envelope<T> =
            bincode::deserialize(&bytes).map_err(|source| ArtifactError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(ArtifactError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: envelope.schema_version,
            });
        }
        Ok(envelope.payload)
    }
}

fn write_envelope<T: Serialize>(path: &Path, payload: &T) -> Result<(), ArtifactError> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        payload,
    };
    let bytes = bincode::serialize(&envelope).map_err(ArtifactError::Encode)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
