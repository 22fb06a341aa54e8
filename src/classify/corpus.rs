use crate::utils::error::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const ADAPTIVE_KEY: &str = "adaptive-state";
pub const MALADAPTIVE_KEY: &str = "maladaptive-state";
pub const NEITHER_KEY: &str = "neither-state";

/// Labeled sentences grouped by self-state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingCorpus {
    #[serde(rename = "adaptive-state", default)]
    pub adaptive: Vec<String>,
    #[serde(rename = "maladaptive-state", default)]
    pub maladaptive: Vec<String>,
    #[serde(rename = "neither-state", default)]
    pub neither: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfState {
    Adaptive,
    Maladaptive,
    Neither,
}

impl SelfState {
    pub fn key(&self) -> &'static str {
        match self {
            SelfState::Adaptive => ADAPTIVE_KEY,
            SelfState::Maladaptive => MALADAPTIVE_KEY,
            SelfState::Neither => NEITHER_KEY,
        }
    }
}

/// One-vs-rest training set: texts with a positive/negative label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledSet {
    pub texts: Vec<String>,
    pub labels: Vec<bool>,
}

impl LabeledSet {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&y| y).count()
    }
}

impl TrainingCorpus {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn sentences(&self, state: SelfState) -> &[String] {
        match state {
            SelfState::Adaptive => &self.adaptive,
            SelfState::Maladaptive => &self.maladaptive,
            SelfState::Neither => &self.neither,
        }
    }

    /// Negatives first, then positives, then shuffled together.
    pub fn one_vs_rest<R: Rng + ?Sized>(&self, positive: SelfState, rng: &mut R) -> LabeledSet {
        let negatives = [SelfState::Adaptive, SelfState::Maladaptive, SelfState::Neither]
            .into_iter()
            .filter(|s| *s != positive);

        let mut pairs: Vec<(String, bool)> = negatives
            .flat_map(|state| self.sentences(state).iter().map(|t| (t.clone(), false)))
            .chain(self.sentences(positive).iter().map(|t| (t.clone(), true)))
            .collect();
        pairs.shuffle(rng);

        let (texts, labels) = pairs.into_iter().unzip();
        LabeledSet { texts, labels }
    }
}
