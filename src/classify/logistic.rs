use crate::classify::tfidf::SparseVector;
use crate::classify::BinaryClassifier;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Weight classes inversely to their frequency.
    pub balanced: bool,
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            balanced: true,
            tolerance: 1e-6,
        }
    }
}

/// L2-regularized logistic regression fitted by accelerated full-batch
/// gradient descent. The intercept is not regularized.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub(crate) fn class_weights(labels: &[bool], balanced: bool) -> (f64, f64) {
    if !balanced {
        return (1.0, 1.0);
    }
    let n = labels.len() as f64;
    let positives = labels.iter().filter(|&&y| y).count() as f64;
    let negatives = n - positives;
    let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 0.0 };
    (weight(negatives), weight(positives))
}

impl LogisticRegression {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[bool],
        dimension: usize,
        params: &LogisticParams,
    ) -> Result<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(EtlError::TrainingError {
                message: format!(
                    "logistic regression needs matching non-empty rows and labels (got {} and {})",
                    rows.len(),
                    labels.len()
                ),
            });
        }

        let (negative_weight, positive_weight) = class_weights(labels, params.balanced);
        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&y| if y { positive_weight } else { negative_weight })
            .collect();

        // Lipschitz bound of the gradient gives a safe fixed step.
        let curvature: f64 = rows
            .iter()
            .zip(&sample_weights)
            .map(|(row, s)| s * (row.squared_norm() + 1.0))
            .sum();
        let step = 1.0 / (1.0 + params.c * curvature / 4.0);

        let mut weights = vec![0.0; dimension];
        let mut intercept = 0.0;
        let mut prev_weights = weights.clone();
        let mut prev_intercept = intercept;
        let mut momentum_t = 1.0f64;

        for iteration in 0..params.max_iter {
            let next_t = (1.0 + (1.0 + 4.0 * momentum_t * momentum_t).sqrt()) / 2.0;
            let beta = (momentum_t - 1.0) / next_t;
            momentum_t = next_t;

            let look_weights: Vec<f64> = weights
                .iter()
                .zip(&prev_weights)
                .map(|(w, p)| w + beta * (w - p))
                .collect();
            let look_intercept = intercept + beta * (intercept - prev_intercept);

            let mut gradient = look_weights.clone();
            let mut intercept_gradient = 0.0;
            for ((row, &y), s) in rows.iter().zip(labels).zip(&sample_weights) {
                let p = sigmoid(row.dot(&look_weights) + look_intercept);
                let residual = params.c * s * (p - if y { 1.0 } else { 0.0 });
                for (i, v) in row.iter() {
                    gradient[i] += residual * v;
                }
                intercept_gradient += residual;
            }

            prev_weights = std::mem::replace(
                &mut weights,
                look_weights
                    .iter()
                    .zip(&gradient)
                    .map(|(w, g)| w - step * g)
                    .collect(),
            );
            prev_intercept = intercept;
            intercept = look_intercept - step * intercept_gradient;

            let gradient_norm = gradient
                .iter()
                .chain(std::iter::once(&intercept_gradient))
                .map(|g| g * g)
                .sum::<f64>()
                .sqrt();
            if gradient_norm < params.tolerance {
                tracing::debug!("Logistic regression converged after {} iterations", iteration + 1);
                break;
            }
        }

        Ok(Self { weights, intercept })
    }

    pub fn decision(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    pub fn probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision(features))
    }
}

impl BinaryClassifier for LogisticRegression {
    fn predict(&self, features: &[f64]) -> bool {
        self.decision(features) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tfidf::TfidfVectorizer;

    fn toy_data() -> (TfidfVectorizer, Vec<SparseVector>, Vec<bool>) {
        let texts = [
            "I reached out to a friend and felt hopeful",
            "Going for a run helped me cope",
            "I am proud I asked for help",
            "Everything is pointless and I am worthless",
            "I cannot stop crying and nobody cares",
            "I hate myself and everything is dark",
            "I slept badly and feel empty",
            "Nobody would notice if I vanished",
        ];
        let labels = vec![true, true, true, false, false, false, false, false];
        let vectorizer = TfidfVectorizer::fit(&texts).unwrap();
        let rows = vectorizer.transform_all(&texts);
        (vectorizer, rows, labels)
    }

    #[test]
    fn test_separates_training_data() {
        let (vectorizer, rows, labels) = toy_data();
        let model =
            LogisticRegression::fit(&rows, &labels, vectorizer.dimension(), &LogisticParams::default())
                .unwrap();

        for (row, &label) in rows.iter().zip(&labels) {
            let dense = row.to_dense(vectorizer.dimension());
            assert_eq!(model.predict(&dense), label);
        }
    }

    #[test]
    fn test_generalizes_on_shared_vocabulary() {
        let (vectorizer, rows, labels) = toy_data();
        let model =
            LogisticRegression::fit(&rows, &labels, vectorizer.dimension(), &LogisticParams::default())
                .unwrap();

        let hopeful = vectorizer.transform("a friend helped me feel hopeful").to_dense(vectorizer.dimension());
        let dark = vectorizer.transform("everything is dark and pointless").to_dense(vectorizer.dimension());
        assert!(model.probability(&hopeful) > model.probability(&dark));
        assert!(model.predict(&hopeful));
        assert!(!model.predict(&dark));
    }

    #[test]
    fn test_balanced_weights_favor_minority_class() {
        let labels = [true, false, false, false];
        let (negative, positive) = class_weights(&labels, true);
        assert!((positive - 2.0).abs() < 1e-12);
        assert!((negative - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(class_weights(&labels, false), (1.0, 1.0));
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let err = LogisticRegression::fit(&[], &[], 3, &LogisticParams::default()).unwrap_err();
        assert!(matches!(err, EtlError::TrainingError { .. }));
    }
}
