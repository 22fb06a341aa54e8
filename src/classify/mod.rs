//! Classical evidence detectors: TF-IDF features, logistic regression and
//! gradient-boosted trees, applied per sentence with noise-perturbation voting.

pub mod boosting;
pub mod corpus;
pub mod logistic;
pub mod sentences;
pub mod tfidf;
pub mod voting;

use crate::domain::settings::ModelKind;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};

pub use boosting::{BoostedTrees, BoostingParams};
pub use corpus::{LabeledSet, SelfState, TrainingCorpus};
pub use logistic::{LogisticParams, LogisticRegression};
pub use sentences::split_sentences;
pub use tfidf::{SparseVector, TfidfVectorizer};
pub use voting::{EvidenceDetector, NoisyVoter};

/// A trained binary classifier over dense feature rows.
pub trait BinaryClassifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> bool;
}

/// Both fields are required when a detector table appears in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub model: ModelKind,
    pub vote_rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub training_path: String,
    pub input_path: String,
    pub output_path: String,
    pub output_file: String,
    pub seed: u64,
    pub noise_std: f64,
    pub wellbeing_score: u8,
    pub adaptive: DetectorSettings,
    pub maladaptive: DetectorSettings,
    pub logistic: LogisticParams,
    pub boosting: BoostingParams,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            training_path: "train_data_classified.json".to_string(),
            input_path: "test_predict.json".to_string(),
            output_path: "./output".to_string(),
            output_file: "test_submission.json".to_string(),
            seed: 42,
            noise_std: 1e-3,
            wellbeing_score: 1,
            adaptive: DetectorSettings {
                model: ModelKind::Logistic,
                vote_rounds: 50,
            },
            maladaptive: DetectorSettings {
                model: ModelKind::Boosted,
                vote_rounds: 100,
            },
            logistic: LogisticParams::default(),
            boosting: BoostingParams::default(),
        }
    }
}

impl Validate for ClassifierSettings {
    fn validate(&self) -> Result<()> {
        validate_path("classifier.training_path", &self.training_path)?;
        validate_path("classifier.input_path", &self.input_path)?;
        validate_path("classifier.output_path", &self.output_path)?;
        validate_non_empty_string("classifier.output_file", &self.output_file)?;
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(EtlError::InvalidConfigValueError {
                field: "classifier.noise_std".to_string(),
                value: self.noise_std.to_string(),
                reason: "Noise std must be a non-negative number".to_string(),
            });
        }
        validate_range("classifier.wellbeing_score", self.wellbeing_score, 1, 10)?;
        validate_positive_number("classifier.adaptive.vote_rounds", self.adaptive.vote_rounds, 1)?;
        validate_positive_number(
            "classifier.maladaptive.vote_rounds",
            self.maladaptive.vote_rounds,
            1,
        )?;
        validate_positive_number("classifier.logistic.max_iter", self.logistic.max_iter, 1)?;
        validate_positive_number(
            "classifier.boosting.n_estimators",
            self.boosting.n_estimators,
            1,
        )?;
        validate_positive_number("classifier.boosting.max_depth", self.boosting.max_depth, 1)?;
        validate_range("classifier.boosting.learning_rate", self.boosting.learning_rate, 0.0, 1.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_pair_logistic_adaptive_with_boosted_maladaptive() {
        let settings = ClassifierSettings::default();
        assert_eq!(settings.adaptive.model, ModelKind::Logistic);
        assert_eq!(settings.adaptive.vote_rounds, 50);
        assert_eq!(settings.maladaptive.model, ModelKind::Boosted);
        assert_eq!(settings.maladaptive.vote_rounds, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_noise_std_only_needs_to_be_non_negative() {
        let mut settings = ClassifierSettings::default();
        settings.noise_std = 2.5;
        assert!(settings.validate().is_ok());

        settings.noise_std = -0.1;
        assert!(settings.validate().is_err());

        settings.noise_std = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_vote_rounds_rejected() {
        let mut settings = ClassifierSettings::default();
        settings.maladaptive.vote_rounds = 0;
        assert!(settings.validate().is_err());
    }
}
