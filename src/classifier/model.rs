use std::collections::HashMap;

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::utils::softmax;
use crate::trainer::TrainError;

/// Knobs for the gradient-descent fit. Tolerance and step size rarely need
/// adjusting; the iteration budget is surfaced through `TrainingConfig`.
#[derive(Debug, Clone)]
pub(crate) struct FitOptions {
    pub max_iterations: usize,
    pub learning_rate: f32,
    pub l2_penalty: f32,
    pub tolerance: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            learning_rate: 0.5,
            l2_penalty: 1e-4,
            tolerance: 1e-4,
        }
    }
}

/// A multinomial logistic-regression model: one weight row and intercept per
/// known label, over the vectorizer's feature space.
///
/// The label list is learned at fit time, sorted lexicographically, and
/// carried inside the model so the persisted artifact is self-describing.
/// Prediction is deterministic and side-effect-free; a fitted model is never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    labels: Vec<String>,
    weights: Array2<f32>,
    intercepts: Array1<f32>,
}

impl LinearModel {
    /// Fits class weights by full-batch gradient descent on the softmax
    /// cross-entropy, with per-class loss weighting inversely proportional
    /// to class frequency.
    ///
    /// Returns the model and whether the gradient converged within the
    /// iteration budget. Non-convergence is reported, not fatal: the model
    /// is still usable.
    ///
    /// # Errors
    /// * `TrainError::SingleClass` if `labels` holds fewer than 2 distinct
    ///   values
    pub(crate) fn fit(
        features: &Array2<f32>,
        labels: &[String],
        options: &FitOptions,
    ) -> Result<(Self, bool), TrainError> {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(TrainError::SingleClass(classes.pop().unwrap_or_default()));
        }

        let class_index: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(index, label)| (label.as_str(), index))
            .collect();
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| class_index[label.as_str()])
            .collect();

        let samples = features.nrows();
        let dimensions = features.ncols();
        let class_count = classes.len();

        // Balanced class weighting: n / (k * n_c), so rare labels are not
        // drowned out by frequent ones.
        let mut class_sizes = vec![0usize; class_count];
        for &target in &targets {
            class_sizes[target] += 1;
        }
        let sample_weights: Vec<f32> = targets
            .iter()
            .map(|&target| samples as f32 / (class_count as f32 * class_sizes[target] as f32))
            .collect();
        let total_weight: f32 = sample_weights.iter().sum();

        let mut weights = Array2::<f32>::zeros((class_count, dimensions));
        let mut intercepts = Array1::<f32>::zeros(class_count);
        let mut converged = false;

        for iteration in 0..options.max_iterations {
            // residual = softmax(XWᵀ + b) - onehot(y), rows scaled by the
            // normalized sample weight
            let mut residual = features.dot(&weights.t());
            residual += &intercepts;
            for (row_index, mut row) in residual.axis_iter_mut(Axis(0)).enumerate() {
                let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                row.mapv_inplace(|v| (v - max).exp());
                let sum = row.sum();
                row.mapv_inplace(|v| v / sum);
                row[targets[row_index]] -= 1.0;
                let scale = sample_weights[row_index] / total_weight;
                row.mapv_inplace(|v| v * scale);
            }

            let mut gradient = residual.t().dot(features);
            gradient.zip_mut_with(&weights, |g, &w| *g += options.l2_penalty * w);
            let intercept_gradient = residual.sum_axis(Axis(0));

            let largest = gradient
                .iter()
                .chain(intercept_gradient.iter())
                .fold(0.0f32, |m, &g| m.max(g.abs()));
            if largest < options.tolerance {
                debug!("Gradient descent converged after {} iterations", iteration);
                converged = true;
                break;
            }

            weights.zip_mut_with(&gradient, |w, &g| *w -= options.learning_rate * g);
            intercepts.zip_mut_with(&intercept_gradient, |b, &g| {
                *b -= options.learning_rate * g;
            });
        }

        if !converged {
            warn!(
                "Gradient descent did not converge within {} iterations; the model is usable but may be suboptimal",
                options.max_iterations
            );
        }

        Ok((
            Self {
                labels: classes,
                weights,
                intercepts,
            },
            converged,
        ))
    }

    /// Probability per known label, in label order. Values are in [0, 1]
    /// and sum to 1 within floating tolerance.
    pub fn predict_probabilities(&self, features: &Array1<f32>) -> Array1<f32> {
        let scores = self.weights.dot(features) + &self.intercepts;
        softmax(&scores)
    }

    /// Known labels, in the lexicographic order learned at fit time.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Dimensionality of the feature space this model was fitted on.
    pub fn num_features(&self) -> usize {
        self.weights.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_fixture() -> (Array2<f32>, Vec<String>) {
        let features = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.9, 0.1],
        ];
        let labels = vec![
            "Interview Scheduled".to_string(),
            "Interview Scheduled".to_string(),
            "Interview Scheduled".to_string(),
            "Rejected".to_string(),
            "Rejected".to_string(),
            "Rejected".to_string(),
        ];
        (features, labels)
    }

    #[test]
    fn test_fit_separates_classes() {
        let (features, labels) = separable_fixture();
        let (model, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();

        let probs = model.predict_probabilities(&array![1.0, 0.0, 0.0]);
        assert_eq!(model.labels()[0], "Interview Scheduled");
        assert!(probs[0] > 0.9);

        let probs = model.predict_probabilities(&array![0.0, 1.0, 0.0]);
        assert!(probs[1] > 0.9);
    }

    #[test]
    fn test_labels_sorted_and_deduplicated() {
        let (features, labels) = separable_fixture();
        let (model, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        assert_eq!(model.labels(), ["Interview Scheduled", "Rejected"]);
    }

    #[test]
    fn test_single_class_rejected() {
        let features = array![[1.0, 0.0], [0.0, 1.0]];
        let labels = vec!["Applied".to_string(), "Applied".to_string()];
        let result = LinearModel::fit(&features, &labels, &FitOptions::default());
        assert!(matches!(result, Err(TrainError::SingleClass(label)) if label == "Applied"));
    }

    #[test]
    fn test_probabilities_are_valid() {
        let (features, labels) = separable_fixture();
        let (model, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        let probs = model.predict_probabilities(&array![0.5, 0.5, 0.2]);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((probs.sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_vector_is_valid_input() {
        let (features, labels) = separable_fixture();
        let (model, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        let probs = model.predict_probabilities(&Array1::zeros(3));
        assert!((probs.sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (features, labels) = separable_fixture();
        let (first, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        let (second, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        assert_eq!(first.weights, second.weights);
        assert_eq!(first.intercepts, second.intercepts);
    }

    #[test]
    fn test_class_weighting_counters_imbalance() {
        // 8:2 imbalance; without balanced weighting the minority class would
        // sit well below the majority on its own examples.
        let mut rows = vec![[1.0f32, 0.0]; 8];
        rows.extend(vec![[0.0f32, 1.0]; 2]);
        let features =
            Array2::from_shape_vec((10, 2), rows.into_iter().flatten().collect()).unwrap();
        let mut labels = vec!["Applied".to_string(); 8];
        labels.extend(vec!["Offer".to_string(); 2]);

        let (model, _) = LinearModel::fit(&features, &labels, &FitOptions::default()).unwrap();
        let probs = model.predict_probabilities(&array![0.0, 1.0]);
        assert!(probs[1] > 0.9, "minority class prob was {}", probs[1]);
    }
}
