use crate::config::cli::LocalStorage;
use crate::core::etl::EtlEngine;
use crate::core::llm_client::OllamaClient;
use crate::core::prompt_pipeline::PromptPipeline;
use crate::core::timeline_reader::TimelineReader;
use crate::core::ConfigProvider;
use crate::utils::error::{ErrorSeverity, Result};

/// Outcome of running every configured model once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// `(model, submission path)` for each model that finished.
    pub written: Vec<(String, String)>,
    pub failed: Vec<(String, ErrorSeverity)>,
}

impl RunReport {
    pub fn worst_severity(&self) -> Option<ErrorSeverity> {
        self.failed.iter().map(|(_, severity)| *severity).max()
    }

    pub fn exit_code(&self) -> i32 {
        self.worst_severity().map_or(0, ErrorSeverity::exit_code)
    }
}

async fn run_model<C: ConfigProvider>(config: &C, model: &str, monitor_enabled: bool) -> Result<String> {
    let client = OllamaClient::new(
        config.endpoint(),
        config.request_timeout(),
        config.json_mode(),
    )?;
    let pipeline = PromptPipeline::new(
        TimelineReader::for_path(config.input_path()),
        LocalStorage::new(config.output_path().to_string()),
        client,
        model,
        config,
    );

    EtlEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
}

/// Runs the models in order; a failed model is logged and the next one still runs.
pub async fn run_models<C: ConfigProvider>(config: &C, monitor_enabled: bool) -> RunReport {
    let mut report = RunReport::default();

    for model in config.models() {
        tracing::info!("🤖 Running model {}", model);
        match run_model(config, model, monitor_enabled).await {
            Ok(output_path) => {
                tracing::info!("📁 [{}] Output saved to: {}", model, output_path);
                report.written.push((model.clone(), output_path));
            }
            Err(e) => {
                tracing::error!(
                    "❌ Model {} failed: {} (Category: {:?}, Severity: {:?})",
                    model,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                report.failed.push((model.clone(), e.severity()));
            }
        }
    }

    report
}
