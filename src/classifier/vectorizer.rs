use std::collections::{HashMap, HashSet};

use log::info;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::utils::l2_normalize;
use crate::trainer::TrainError;

/// Tunable knobs for vocabulary construction. The defaults match the
/// reference configuration; they are starting points, not contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Cap on the vocabulary size, keeping the most frequent terms
    pub max_features: usize,
    /// Terms seen in fewer distinct documents than this are dropped
    pub min_document_frequency: usize,
    /// Extend the vocabulary with adjacent-word bigrams
    pub bigrams: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_document_frequency: 2,
            bigrams: true,
        }
    }
}

/// A TF-IDF vectorizer over case-folded unigrams and bigrams.
///
/// Fitting derives the vocabulary and per-term inverse-document-frequency
/// weights from a training corpus; both are immutable afterwards. Transforms
/// are deterministic given a fitted instance, and terms outside the
/// vocabulary contribute nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: HashMap<String, usize>,
    idf: Array1<f32>,
}

impl TfidfVectorizer {
    /// Fits a vocabulary and IDF weights on the given documents.
    ///
    /// # Errors
    /// * `TrainError::EmptyCorpus` if `texts` is empty
    /// * `TrainError::DegenerateVocabulary` if no term survives the
    ///   document-frequency filter
    pub fn fit(config: VectorizerConfig, texts: &[String]) -> Result<Self, TrainError> {
        if texts.is_empty() {
            return Err(TrainError::EmptyCorpus);
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let terms = extract_terms(text, config.bigrams);
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *corpus_frequency.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *document_frequency.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut retained: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|&(_, df)| df >= config.min_document_frequency)
            .collect();

        if retained.len() > config.max_features {
            retained.sort_by(|a, b| {
                corpus_frequency[&b.0]
                    .cmp(&corpus_frequency[&a.0])
                    .then_with(|| a.0.cmp(&b.0))
            });
            retained.truncate(config.max_features);
        }
        if retained.is_empty() {
            return Err(TrainError::DegenerateVocabulary);
        }

        // Index assignment is lexicographic so two fits over the same corpus
        // produce identical feature spaces.
        retained.sort_by(|a, b| a.0.cmp(&b.0));

        let total_documents = texts.len() as f32;
        let mut vocabulary = HashMap::with_capacity(retained.len());
        let mut idf = Array1::zeros(retained.len());
        for (index, (term, df)) in retained.into_iter().enumerate() {
            idf[index] = ((1.0 + total_documents) / (1.0 + df as f32)).ln() + 1.0;
            vocabulary.insert(term, index);
        }

        info!(
            "Fitted vocabulary of {} terms from {} documents",
            vocabulary.len(),
            texts.len()
        );

        Ok(Self {
            config,
            vocabulary,
            idf,
        })
    }

    /// Maps text to an L2-normalized TF-IDF vector over the fitted
    /// vocabulary. Empty or fully out-of-vocabulary text yields the zero
    /// vector, which is a valid input downstream.
    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut counts = Array1::<f32>::zeros(self.vocabulary.len());
        for term in extract_terms(text, self.config.bigrams) {
            if let Some(&index) = self.vocabulary.get(&term) {
                counts[index] += 1.0;
            }
        }
        l2_normalize(&(counts * &self.idf))
    }

    /// Number of terms in the fitted vocabulary.
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    #[cfg(test)]
    fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }
}

fn extract_terms(text: &str, bigrams: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2 && STOP_WORDS.binary_search(w).is_err())
        .collect();

    let mut terms: Vec<String> = words.iter().map(|w| (*w).to_string()).collect();
    if bigrams {
        for pair in words.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }
    }
    terms
}

// Sorted for binary search. High-frequency English function words; tokens
// shorter than two characters never reach the lookup.
static STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "re", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your", "yours",
];
