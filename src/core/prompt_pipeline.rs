use crate::core::prompts::{render, PromptTask};
use crate::core::response::{string_list, text_field, wellbeing_score, Fields};
use crate::core::retry::QueryRunner;
use crate::core::timeline_reader::{TimelineBatch, TimelineReader};
use crate::core::{ConfigProvider, Pipeline, Storage, TextGenerator};
use crate::domain::model::{PostAnalysis, RunStats, Submission, Timeline, TimelineAnalysis};
use crate::domain::settings::PromptStyle;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Submission plus the counters gathered while producing it.
#[derive(Debug, Clone)]
pub struct AnalysisBatch {
    pub submission: Submission,
    pub stats: RunStats,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    execution_id: &'a str,
    model: &'a str,
    prompt_style: PromptStyle,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    #[serde(flatten)]
    stats: &'a RunStats,
}

/// File-system safe form of a model name such as `llama3.1:8b`.
pub fn sanitize_model_name(model: &str) -> String {
    model
        .chars()
        .map(|c| {
            if c == '/' || c == ':' || c == '\\' || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

pub fn submission_file_name(model: &str, suffix: &str) -> String {
    format!("{}_{}_submission.json", sanitize_model_name(model), suffix)
}

pub fn summary_file_name(model: &str, suffix: &str) -> String {
    format!("{}_{}_run_summary.json", sanitize_model_name(model), suffix)
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T, indent: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Runs the four analysis prompts for every post of every timeline, for one model.
pub struct PromptPipeline<S: Storage, G: TextGenerator> {
    reader: TimelineReader<S>,
    output: S,
    runner: QueryRunner<G>,
    model: String,
    name: String,
    output_dir: String,
    file_suffix: String,
    prompt_style: PromptStyle,
    execution_id: String,
}

impl<S: Storage, G: TextGenerator> PromptPipeline<S, G> {
    pub fn new<C: ConfigProvider>(
        reader: TimelineReader<S>,
        output: S,
        generator: G,
        model: &str,
        config: &C,
    ) -> Self {
        Self {
            reader,
            output,
            runner: QueryRunner::new(generator, config.retry_policy(), config.parse_mode()),
            model: model.to_string(),
            name: format!("prompt:{}", model),
            output_dir: config.output_path().to_string(),
            file_suffix: config.file_suffix().to_string(),
            prompt_style: config.prompt_style(),
            execution_id: format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S")),
        }
    }

    pub fn with_execution_id(mut self, execution_id: String) -> Self {
        self.execution_id = execution_id;
        self
    }

    async fn ask(&self, task: PromptTask, text: &str, stats: &mut RunStats) -> Fields {
        let prompt = render(self.prompt_style, task, text);
        let outcome = self.runner.query(&self.model, task, &prompt).await;
        stats.queries += 1;
        if outcome.exhausted {
            stats.exhausted_queries += 1;
        }
        outcome.fields
    }

    async fn analyze_timeline(&self, timeline: &Timeline, stats: &mut RunStats) -> TimelineAnalysis {
        let mut analysis = TimelineAnalysis::default();

        for post in &timeline.posts {
            tracing::debug!("Analyzing post {} of {}", post.post_id, timeline.timeline_id);

            let evidence = self.ask(PromptTask::ExtractEvidence, &post.post, stats).await;
            let wellbeing = self.ask(PromptTask::PredictWellbeing, &post.post, stats).await;
            let summary = self.ask(PromptTask::SummarizePost, &post.post, stats).await;

            let post_analysis = PostAnalysis {
                adaptive_evidence: string_list(&evidence, "adaptive_evidence"),
                maladaptive_evidence: string_list(&evidence, "maladaptive_evidence"),
                summary: text_field(&summary, "summary"),
                wellbeing_score: wellbeing_score(&wellbeing),
            };
            if analysis
                .post_level
                .insert(post.post_id.clone(), post_analysis)
                .is_some()
            {
                tracing::warn!(
                    "Duplicate post id {} in timeline {}; keeping the later one",
                    post.post_id,
                    timeline.timeline_id
                );
            }
            stats.posts += 1;
        }

        let timeline_fields = self
            .ask(PromptTask::SummarizeTimeline, &timeline.joined_text(), stats)
            .await;
        analysis.timeline_level.summary = text_field(&timeline_fields, "summary");

        analysis
    }
}

#[async_trait::async_trait]
impl<S: Storage, G: TextGenerator> Pipeline for PromptPipeline<S, G> {
    type Input = TimelineBatch;
    type Output = AnalysisBatch;

    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self) -> Result<TimelineBatch> {
        let batch = self.reader.read_all().await?;
        if batch.timelines.is_empty() {
            tracing::warn!("No timelines found; the submission will be empty");
        }
        Ok(batch)
    }

    async fn transform(&self, data: TimelineBatch) -> Result<AnalysisBatch> {
        let started_at = Utc::now();
        let mut stats = RunStats {
            skipped_files: data.skipped_files,
            ..RunStats::default()
        };
        let mut submission = Submission::new();
        let total = data.timelines.len();

        for (i, timeline) in data.timelines.iter().enumerate() {
            tracing::info!(
                "🧠 [{}] timeline {}/{}: {} ({} posts)",
                self.model,
                i + 1,
                total,
                timeline.timeline_id,
                timeline.posts.len()
            );
            let analysis = self.analyze_timeline(timeline, &mut stats).await;
            if submission
                .insert(timeline.timeline_id.clone(), analysis)
                .is_some()
            {
                tracing::warn!(
                    "Duplicate timeline id {}; keeping the later one",
                    timeline.timeline_id
                );
            }
            stats.timelines += 1;
        }

        if stats.exhausted_queries > 0 {
            tracing::warn!(
                "⚠️ {} of {} queries exhausted their retries and used defaults",
                stats.exhausted_queries,
                stats.queries
            );
        }

        Ok(AnalysisBatch {
            submission,
            stats,
            started_at,
        })
    }

    async fn load(&self, result: AnalysisBatch) -> Result<String> {
        let file_name = submission_file_name(&self.model, &self.file_suffix);
        let data = to_pretty_json(&result.submission, b"    ")?;
        self.output.write_file(&file_name, &data).await?;

        let summary = RunSummary {
            execution_id: &self.execution_id,
            model: &self.model,
            prompt_style: self.prompt_style,
            started_at: result.started_at,
            finished_at: Utc::now(),
            stats: &result.stats,
        };
        let summary_name = summary_file_name(&self.model, &self.file_suffix);
        self.output
            .write_file(&summary_name, &to_pretty_json(&summary, b"    ")?)
            .await?;

        let output_path = Path::new(&self.output_dir).join(&file_name);
        Ok(output_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Post;
    use crate::domain::settings::{ParseMode, RetryPolicy};
    use crate::utils::error::EtlError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStorage {
        fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.get(path).ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn list_files(&self, extension: &str) -> Result<Vec<String>> {
            let suffix = format!(".{}", extension);
            let mut names: Vec<String> = self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.ends_with(&suffix))
                .cloned()
                .collect();
            names.sort();
            Ok(names)
        }
    }

    /// Answers by task, recognized from the response-format block of the prompt.
    struct CannedGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Arc<CannedGenerator> {
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = if prompt.contains("adaptive_evidence") {
                r#"{"adaptive_evidence": ["I called a friend"], "maladaptive_evidence": "I can't sleep"}"#
            } else if prompt.contains("wellbeing_score") {
                if prompt.contains("broken") {
                    "no idea"
                } else {
                    r#"{"wellbeing_score": "6"}"#
                }
            } else if prompt.contains("Timeline:") {
                r#"{"summary": "Mixed but improving."}"#
            } else {
                r#"{"summary": "Post summary."}"#
            };
            Ok(reply.to_string())
        }
    }

    struct TestConfig {
        models: Vec<String>,
    }

    impl ConfigProvider for TestConfig {
        fn endpoint(&self) -> &str {
            "http://localhost:11434"
        }
        fn models(&self) -> &[String] {
            &self.models
        }
        fn input_path(&self) -> &str {
            "in"
        }
        fn output_path(&self) -> &str {
            "out"
        }
        fn file_suffix(&self) -> &str {
            "full_timeline"
        }
        fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy::new(2, Duration::ZERO)
        }
        fn request_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
        fn prompt_style(&self) -> PromptStyle {
            PromptStyle::Default
        }
        fn parse_mode(&self) -> ParseMode {
            ParseMode::Strict
        }
        fn json_mode(&self) -> bool {
            true
        }
    }

    fn pipeline(
        input: MemoryStorage,
        output: MemoryStorage,
        generator: Arc<CannedGenerator>,
    ) -> PromptPipeline<MemoryStorage, Arc<CannedGenerator>> {
        let config = TestConfig {
            models: vec!["llama3.1:8b".to_string()],
        };
        PromptPipeline::new(
            TimelineReader::new(input),
            output,
            generator,
            "llama3.1:8b",
            &config,
        )
        .with_execution_id("test_run".to_string())
    }

    fn timeline(id: &str, posts: &[(&str, &str)]) -> Timeline {
        Timeline {
            timeline_id: id.to_string(),
            posts: posts
                .iter()
                .map(|(pid, text)| Post {
                    post_id: pid.to_string(),
                    post: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_file_names_are_sanitized() {
        assert_eq!(
            submission_file_name("llama3.1:8b", "full_timeline"),
            "llama3.1_8b_full_timeline_submission.json"
        );
        assert_eq!(summary_file_name("org/model x", "begin"), "org_model_x_begin_run_summary.json");
    }

    #[tokio::test]
    async fn test_transform_asks_four_kinds_of_question_in_order() {
        let generator = Arc::new(CannedGenerator::new());
        let pipeline = pipeline(
            MemoryStorage::default(),
            MemoryStorage::default(),
            Arc::clone(&generator),
        );

        let batch = TimelineBatch {
            timelines: vec![timeline("t1", &[("p1", "I called a friend."), ("p2", "I can't sleep.")])],
            skipped_files: 0,
        };
        let result = pipeline.transform(batch).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 7);
        assert!(prompts[0].contains("adaptive_evidence"));
        assert!(prompts[1].contains("wellbeing_score"));
        assert!(prompts[2].contains("post-level summary"));
        assert!(prompts[6].contains("\"I called a friend.\n\nI can't sleep.\""));

        let analysis = &result.submission["t1"];
        assert_eq!(analysis.timeline_level.summary, "Mixed but improving.");
        let p1 = &analysis.post_level["p1"];
        assert_eq!(p1.adaptive_evidence, vec!["I called a friend"]);
        assert_eq!(p1.maladaptive_evidence, vec!["I can't sleep"]);
        assert_eq!(p1.wellbeing_score, 6);
        assert_eq!(p1.summary, "Post summary.");
        assert_eq!(result.stats.posts, 2);
        assert_eq!(result.stats.queries, 7);
        assert_eq!(result.stats.exhausted_queries, 0);
    }

    #[tokio::test]
    async fn test_exhausted_score_defaults_to_five() {
        let generator = Arc::new(CannedGenerator::new());
        let pipeline = pipeline(
            MemoryStorage::default(),
            MemoryStorage::default(),
            Arc::clone(&generator),
        );

        let batch = TimelineBatch {
            timelines: vec![timeline("t1", &[("p1", "broken")])],
            skipped_files: 2,
        };
        let result = pipeline.transform(batch).await.unwrap();

        assert_eq!(result.submission["t1"].post_level["p1"].wellbeing_score, 5);
        assert_eq!(result.stats.exhausted_queries, 1);
        assert_eq!(result.stats.skipped_files, 2);
        // evidence + 2 score attempts + summary + timeline summary
        assert_eq!(generator.prompts.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_full_run_writes_submission_and_summary() {
        let input = MemoryStorage::default();
        input.put(
            "timeline_a.json",
            r#"{"timeline_id": "a", "posts": [{"post_id": "a1", "post": "Ça va mieux."}]}"#,
        );
        let output = MemoryStorage::default();
        let pipeline = pipeline(input, output.clone(), Arc::new(CannedGenerator::new()));

        let data = pipeline.extract().await.unwrap();
        let result = pipeline.transform(data).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(
            path,
            Path::new("out")
                .join("llama3.1_8b_full_timeline_submission.json")
                .to_string_lossy()
        );

        let written = output.get("llama3.1_8b_full_timeline_submission.json").unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\n    \"a\": {"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["a"]["post_level"]["a1"]["well-being score"], 6);

        let summary: serde_json::Value = serde_json::from_slice(
            &output.get("llama3.1_8b_full_timeline_run_summary.json").unwrap(),
        )
        .unwrap();
        assert_eq!(summary["execution_id"], "test_run");
        assert_eq!(summary["model"], "llama3.1:8b");
        assert_eq!(summary["timelines"], 1);
        assert_eq!(summary["queries"], 4);
    }
}
