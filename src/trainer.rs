use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use log::info;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::artifact_store::{ArtifactError, ArtifactStore};
use crate::classifier::{Classifier, FitOptions, LinearModel, TfidfVectorizer, VectorizerConfig};
use crate::corpus::Corpus;

/// Data and pipeline errors surfaced by a training run. All of them abort
/// the run cleanly; no partial artifacts are ever written.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Corpus file not found: {0:?} (run the data preparation tooling first)")]
    CorpusNotFound(PathBuf),
    #[error("Failed to read corpus: {0}")]
    Csv(#[from] csv::Error),
    #[error("Corpus line {line}: label must not be empty")]
    MissingLabel { line: usize },
    #[error("Corpus contains no documents")]
    EmptyCorpus,
    #[error("Vocabulary is empty after frequency filtering; the corpus is too small or min_document_frequency is too high")]
    DegenerateVocabulary,
    #[error("Training data contains only the class '{0}'; at least 2 distinct labels are required")]
    SingleClass(String),
    #[error("Class '{label}' has {count} example(s); at least 2 are required for a stratified split")]
    InsufficientSamples { label: String, count: usize },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Configuration surface for one training run. Every knob has a fixed
/// default and can be overridden per run through the `Trainer` builders.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// CSV corpus with a `subject,body,label` header
    pub corpus_path: PathBuf,
    /// Fraction of the corpus held out for evaluation
    pub holdout_fraction: f32,
    /// Seed for the stratified split; same corpus and seed give the same split
    pub seed: u64,
    pub vectorizer: VectorizerConfig,
    /// Iteration budget for the gradient-descent fit
    pub max_iterations: usize,
    pub learning_rate: f32,
    pub l2_penalty: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("emails.csv"),
            holdout_fraction: 0.2,
            seed: 42,
            vectorizer: VectorizerConfig::default(),
            max_iterations: 1000,
            learning_rate: 0.5,
            l2_penalty: 1e-4,
        }
    }
}

/// Precision, recall, F1 and support for one label on the holdout set.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

/// Evaluation summary for one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Holdout accuracy
    pub accuracy: f32,
    /// Per-label holdout metrics, in label order
    pub per_class: Vec<ClassMetrics>,
    /// Label counts over the full corpus, most frequent first
    pub label_distribution: Vec<(String, usize)>,
    pub train_size: usize,
    pub holdout_size: usize,
    /// Whether the fit converged within the iteration budget
    pub converged: bool,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_class
            .iter()
            .map(|m| m.label.len())
            .max()
            .unwrap_or(8)
            .max(8);

        writeln!(
            f,
            "{:>width$}  precision    recall  f1-score   support",
            "",
            width = width
        )?;
        writeln!(f)?;
        for metrics in &self.per_class {
            writeln!(
                f,
                "{:>width$}      {:.3}     {:.3}     {:.3}  {:>8}",
                metrics.label,
                metrics.precision,
                metrics.recall,
                metrics.f1,
                metrics.support,
                width = width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}                          {:.3}  {:>8}",
            "accuracy",
            self.accuracy,
            self.holdout_size,
            width = width
        )?;
        writeln!(
            f,
            "\nTrained on {} emails, evaluated on {}{}",
            self.train_size,
            self.holdout_size,
            if self.converged {
                ""
            } else {
                " (fit did not fully converge)"
            }
        )
    }
}

/// Orchestrates one full train/evaluate/persist cycle.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use jobtriage::{ArtifactStore, Trainer};
///
/// let store = ArtifactStore::new_default()?;
/// let report = Trainer::new()
///     .with_corpus_path("emails.csv")
///     .with_seed(42)
///     .run(&store)?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.corpus_path = path.into();
        self
    }

    pub fn with_holdout_fraction(mut self, fraction: f32) -> Self {
        self.config.holdout_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_vectorizer_config(mut self, config: VectorizerConfig) -> Self {
        self.config.vectorizer = config;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Loads the configured corpus and trains on it.
    pub fn train(&self) -> Result<(Classifier, TrainingReport), TrainError> {
        let corpus = Corpus::load(&self.config.corpus_path)?;
        self.train_corpus(&corpus)
    }

    /// Trains on an in-memory corpus: stratified split, vectorizer and model
    /// fit on the training partition only, evaluation on the holdout.
    pub fn train_corpus(&self, corpus: &Corpus) -> Result<(Classifier, TrainingReport), TrainError> {
        if corpus.is_empty() {
            return Err(TrainError::EmptyCorpus);
        }

        let distribution = corpus.label_distribution();
        info!(
            "Training on {} emails across {} labels",
            corpus.len(),
            distribution.len()
        );
        for (label, count) in &distribution {
            info!("  {}: {}", label, count);
        }

        let texts = corpus.texts();
        let labels = corpus.labels();
        let (train_indices, holdout_indices) =
            stratified_split(&labels, self.config.holdout_fraction, self.config.seed)?;

        // The holdout partition must not leak into vocabulary construction.
        let train_texts: Vec<String> = train_indices.iter().map(|&i| texts[i].clone()).collect();
        let train_labels: Vec<String> = train_indices.iter().map(|&i| labels[i].clone()).collect();

        let vectorizer = TfidfVectorizer::fit(self.config.vectorizer.clone(), &train_texts)?;

        let mut features = Array2::zeros((train_texts.len(), vectorizer.dimension()));
        for (row, text) in train_texts.iter().enumerate() {
            features.row_mut(row).assign(&vectorizer.transform(text));
        }

        let options = FitOptions {
            max_iterations: self.config.max_iterations,
            learning_rate: self.config.learning_rate,
            l2_penalty: self.config.l2_penalty,
            ..FitOptions::default()
        };
        let (model, converged) = LinearModel::fit(&features, &train_labels, &options)?;

        let classifier = Classifier::new(vectorizer, model);
        let report = evaluate(
            &classifier,
            corpus,
            &holdout_indices,
            train_indices.len(),
            distribution,
            converged,
        );
        info!("Holdout accuracy: {:.4}", report.accuracy);

        Ok((classifier, report))
    }

    /// Trains and persists both artifacts. On any failure the previously
    /// persisted artifacts are left untouched.
    pub fn run(&self, store: &ArtifactStore) -> Result<TrainingReport, TrainError> {
        let (classifier, report) = self.train()?;
        store.save(&classifier)?;
        Ok(report)
    }
}

/// Partitions row indices into train and holdout sets, preserving per-class
/// proportions. Each class contributes `round(n * fraction)` holdout rows,
/// clamped so both partitions keep at least one row per class.
fn stratified_split(
    labels: &[String],
    holdout_fraction: f32,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainError> {
    let mut by_class: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(index);
    }

    let mut classes: Vec<&str> = by_class.keys().copied().collect();
    classes.sort_unstable();
    if classes.len() < 2 {
        return Err(TrainError::SingleClass(
            classes.first().map(|c| c.to_string()).unwrap_or_default(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();
    for class in classes {
        let mut indices = by_class.remove(class).unwrap_or_default();
        let count = indices.len();
        if count < 2 {
            return Err(TrainError::InsufficientSamples {
                label: class.to_string(),
                count,
            });
        }
        indices.shuffle(&mut rng);
        let take = ((count as f32 * holdout_fraction).round() as usize).clamp(1, count - 1);
        holdout.extend(indices.drain(..take));
        train.extend(indices);
    }
    train.sort_unstable();
    holdout.sort_unstable();

    Ok((train, holdout))
}

fn evaluate(
    classifier: &Classifier,
    corpus: &Corpus,
    holdout: &[usize],
    train_size: usize,
    label_distribution: Vec<(String, usize)>,
    converged: bool,
) -> TrainingReport {
    let labels = classifier.labels();
    let index_of: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| (label.as_str(), index))
        .collect();

    let mut true_positive = vec![0usize; labels.len()];
    let mut false_positive = vec![0usize; labels.len()];
    let mut false_negative = vec![0usize; labels.len()];
    let mut support = vec![0usize; labels.len()];
    let mut correct = 0usize;

    let rows = corpus.rows();
    for &index in holdout {
        let row = &rows[index];
        let prediction = classifier.predict(&row.text());
        let actual = index_of[row.label.as_str()];
        let predicted = index_of[prediction.label.as_str()];
        support[actual] += 1;
        if predicted == actual {
            correct += 1;
            true_positive[actual] += 1;
        } else {
            false_positive[predicted] += 1;
            false_negative[actual] += 1;
        }
    }

    let per_class = labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let tp = true_positive[index] as f32;
            let precision_denominator = tp + false_positive[index] as f32;
            let recall_denominator = tp + false_negative[index] as f32;
            let precision = if precision_denominator > 0.0 {
                tp / precision_denominator
            } else {
                0.0
            };
            let recall = if recall_denominator > 0.0 {
                tp / recall_denominator
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support: support[index],
            }
        })
        .collect();

    TrainingReport {
        accuracy: if holdout.is_empty() {
            0.0
        } else {
            correct as f32 / holdout.len() as f32
        },
        per_class,
        label_distribution,
        train_size,
        holdout_size: holdout.len(),
        converged,
    }
}
