use crate::classify::boosting::{BoostedTrees, BoostingParams};
use crate::classify::corpus::LabeledSet;
use crate::classify::logistic::{LogisticParams, LogisticRegression};
use crate::classify::tfidf::TfidfVectorizer;
use crate::classify::BinaryClassifier;
use crate::domain::settings::ModelKind;
use crate::utils::error::{EtlError, Result};
use rand::Rng;
use std::f64::consts::PI;

/// Majority vote of a classifier over Gaussian-perturbed copies of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoisyVoter {
    pub rounds: usize,
    pub noise_std: f64,
}

fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

impl NoisyVoter {
    pub fn new(rounds: usize, noise_std: f64) -> Self {
        Self {
            rounds: rounds.max(1),
            noise_std,
        }
    }

    /// Positive only when positive votes strictly outnumber negative ones.
    pub fn vote<R: Rng + ?Sized>(
        &self,
        classifier: &dyn BinaryClassifier,
        features: &[f64],
        rng: &mut R,
    ) -> bool {
        if self.noise_std == 0.0 {
            return classifier.predict(features);
        }

        let mut perturbed = vec![0.0; features.len()];
        let mut positive = 0usize;
        for _ in 0..self.rounds {
            for (p, x) in perturbed.iter_mut().zip(features) {
                *p = x + self.noise_std * standard_normal(rng);
            }
            if classifier.predict(&perturbed) {
                positive += 1;
            }
        }
        positive * 2 > self.rounds
    }
}

/// A vectorizer, a trained model and a voter for one self-state.
pub struct EvidenceDetector {
    vectorizer: TfidfVectorizer,
    classifier: Box<dyn BinaryClassifier>,
    voter: NoisyVoter,
}

impl EvidenceDetector {
    pub fn train(
        set: &LabeledSet,
        kind: ModelKind,
        voter: NoisyVoter,
        logistic: &LogisticParams,
        boosting: &BoostingParams,
    ) -> Result<Self> {
        if set.is_empty() {
            return Err(EtlError::TrainingError {
                message: "training set is empty".to_string(),
            });
        }

        let vectorizer = TfidfVectorizer::fit(&set.texts)?;
        let rows = vectorizer.transform_all(&set.texts);
        let classifier: Box<dyn BinaryClassifier> = match kind {
            ModelKind::Logistic => Box::new(LogisticRegression::fit(
                &rows,
                &set.labels,
                vectorizer.dimension(),
                logistic,
            )?),
            ModelKind::Boosted => Box::new(BoostedTrees::fit(&rows, &set.labels, boosting)?),
        };

        tracing::info!(
            "Trained {:?} detector on {} sentences ({} positive, {} features)",
            kind,
            set.len(),
            set.positives(),
            vectorizer.dimension()
        );

        Ok(Self {
            vectorizer,
            classifier,
            voter,
        })
    }

    pub fn is_evidence<R: Rng + ?Sized>(&self, sentence: &str, rng: &mut R) -> bool {
        let features = self
            .vectorizer
            .transform(sentence)
            .to_dense(self.vectorizer.dimension());
        self.voter.vote(self.classifier.as_ref(), &features, rng)
    }
}
