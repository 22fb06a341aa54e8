use crate::classify::{
    split_sentences, ClassifierSettings, DetectorSettings, EvidenceDetector, NoisyVoter,
    SelfState, TrainingCorpus,
};
use crate::core::prompt_pipeline::to_pretty_json;
use crate::core::timeline_reader::{TimelineBatch, TimelineReader};
use crate::core::{Pipeline, Storage};
use crate::domain::model::{PostAnalysis, Submission, TimelineAnalysis};
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

pub struct EvidenceInput {
    pub corpus: TrainingCorpus,
    pub batch: TimelineBatch,
}

/// Trains per-state sentence detectors on a labeled corpus and tags the
/// sentences of every post as adaptive or maladaptive evidence.
pub struct EvidencePipeline<S: Storage> {
    corpus_storage: S,
    corpus_file: String,
    reader: TimelineReader<S>,
    output: S,
    settings: ClassifierSettings,
}

impl<S: Storage> EvidencePipeline<S> {
    pub fn new(
        corpus_storage: S,
        corpus_file: &str,
        reader: TimelineReader<S>,
        output: S,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            corpus_storage,
            corpus_file: corpus_file.to_string(),
            reader,
            output,
            settings,
        }
    }

    fn train_detector<R: Rng + ?Sized>(
        &self,
        corpus: &TrainingCorpus,
        state: SelfState,
        detector: &DetectorSettings,
        rng: &mut R,
    ) -> Result<EvidenceDetector> {
        let set = corpus.one_vs_rest(state, rng);
        tracing::info!(
            "🎯 Training {} detector ({:?}, {} vote rounds)",
            state.key(),
            detector.model,
            detector.vote_rounds
        );
        EvidenceDetector::train(
            &set,
            detector.model,
            NoisyVoter::new(detector.vote_rounds, self.settings.noise_std),
            &self.settings.logistic,
            &self.settings.boosting,
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for EvidencePipeline<S> {
    type Input = EvidenceInput;
    type Output = Submission;

    fn name(&self) -> &str {
        "evidence-classifier"
    }

    async fn extract(&self) -> Result<EvidenceInput> {
        let bytes = self.corpus_storage.read_file(&self.corpus_file).await?;
        let corpus = TrainingCorpus::from_json(&bytes)?;
        tracing::info!(
            "Loaded corpus: {} adaptive, {} maladaptive, {} neither sentences",
            corpus.sentences(SelfState::Adaptive).len(),
            corpus.sentences(SelfState::Maladaptive).len(),
            corpus.sentences(SelfState::Neither).len()
        );

        let batch = self.reader.read_all().await?;
        Ok(EvidenceInput { corpus, batch })
    }

    async fn transform(&self, data: EvidenceInput) -> Result<Submission> {
        let mut rng = StdRng::seed_from_u64(self.settings.seed);

        let adaptive = self.train_detector(
            &data.corpus,
            SelfState::Adaptive,
            &self.settings.adaptive,
            &mut rng,
        )?;
        let maladaptive = self.train_detector(
            &data.corpus,
            SelfState::Maladaptive,
            &self.settings.maladaptive,
            &mut rng,
        )?;

        let mut submission = Submission::new();
        for timeline in &data.batch.timelines {
            let mut analysis = TimelineAnalysis::default();
            for post in &timeline.posts {
                let mut post_analysis = PostAnalysis {
                    wellbeing_score: self.settings.wellbeing_score,
                    ..PostAnalysis::default()
                };
                for sentence in split_sentences(&post.post) {
                    if adaptive.is_evidence(&sentence, &mut rng) {
                        post_analysis.adaptive_evidence.push(sentence.clone());
                    }
                    if maladaptive.is_evidence(&sentence, &mut rng) {
                        post_analysis.maladaptive_evidence.push(sentence);
                    }
                }
                analysis.post_level.insert(post.post_id.clone(), post_analysis);
            }
            tracing::debug!(
                "Classified {} posts of timeline {}",
                timeline.posts.len(),
                timeline.timeline_id
            );
            submission.insert(timeline.timeline_id.clone(), analysis);
        }

        Ok(submission)
    }

    async fn load(&self, result: Submission) -> Result<String> {
        let data = to_pretty_json(&result, b"  ")?;
        self.output
            .write_file(&self.settings.output_file, &data)
            .await?;

        let output_path = Path::new(&self.settings.output_path).join(&self.settings.output_file);
        Ok(output_path.to_string_lossy().into_owned())
    }
}
