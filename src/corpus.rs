use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::trainer::TrainError;

/// One ground-truth training example. The label set is open-ended; whatever
/// strings the corpus carries become the classes learned at fit time.
///
/// Subject and body default to empty strings when the CSV omits them, so the
/// pipeline never sees a null text field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledEmail {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub label: String,
}

impl LabeledEmail {
    /// Subject and body joined by a single space, the text the pipeline
    /// trains and predicts on.
    pub fn text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

/// The authoritative labeled dataset: an ordered collection of emails read
/// from a UTF-8 CSV with a `subject,body,label` header.
///
/// The corpus is append-only from the point of view of this crate; import
/// and annotation tools maintain the file externally. Duplicate rows are a
/// known corpus defect and are deliberately not resolved here.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    rows: Vec<LabeledEmail>,
}

impl Corpus {
    /// Reads the corpus from a CSV file.
    ///
    /// # Errors
    /// * `TrainError::CorpusNotFound` if the file does not exist
    /// * `TrainError::Csv` on malformed CSV
    /// * `TrainError::MissingLabel` if a row has an empty label
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrainError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrainError::CorpusNotFound(path.to_path_buf()));
        }

        info!("Loading corpus from {:?}", path);
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for (index, record) in reader.deserialize::<LabeledEmail>().enumerate() {
            let row = record?;
            if row.label.trim().is_empty() {
                // header occupies line 1
                return Err(TrainError::MissingLabel { line: index + 2 });
            }
            rows.push(row);
        }
        info!("Loaded {} labeled emails", rows.len());

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<LabeledEmail>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: LabeledEmail) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[LabeledEmail] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Training texts in row order.
    pub fn texts(&self) -> Vec<String> {
        self.rows.iter().map(LabeledEmail::text).collect()
    }

    /// Labels in row order.
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.label.clone()).collect()
    }

    /// Per-label counts, most frequent first; ties resolve alphabetically.
    pub fn label_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in &self.rows {
            match counts.iter_mut().find(|(label, _)| *label == row.label) {
                Some((_, count)) => *count += 1,
                None => counts.push((row.label.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}
