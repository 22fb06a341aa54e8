use crate::classify::ClassifierSettings;
use crate::config::{DEFAULT_ENDPOINT, DEFAULT_MODELS};
use crate::core::ConfigProvider;
use crate::domain::settings::{ParseMode, PromptStyle, RetryPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub run: RunSection,
    pub classifier: Option<ClassifierSettings>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub json_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub delay_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub models: Vec<String>,
    pub input_path: String,
    pub output_path: String,
    pub file_suffix: Option<String>,
    pub prompt_style: Option<PromptStyle>,
    pub response_parsing: Option<ParseMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: None,
            json_mode: None,
        }
    }
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            input_path: "./timelines".to_string(),
            output_path: "./output".to_string(),
            file_suffix: None,
            prompt_style: None,
            response_parsing: None,
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("server.endpoint", &self.server.endpoint)?;
        validate_non_empty_list("run.models", &self.run.models)?;
        validate_path("run.input_path", &self.run.input_path)?;
        validate_path("run.output_path", &self.run.output_path)?;
        validate_non_empty_string("run.file_suffix", self.file_suffix())?;

        if let Some(attempts) = self.retry.attempts {
            validate_positive_number("retry.attempts", attempts as usize, 1)?;
        }
        if let Some(delay) = self.retry.delay_seconds {
            Duration::try_from_secs_f64(delay).map_err(|e| EtlError::InvalidConfigValueError {
                field: "retry.delay_seconds".to_string(),
                value: delay.to_string(),
                reason: format!("Delay must be a non-negative number of seconds ({})", e),
            })?;
        }
        if let Some(timeout) = self.server.timeout_seconds {
            validate_positive_number("server.timeout_seconds", timeout as usize, 1)?;
        }
        if let Some(classifier) = &self.classifier {
            classifier.validate()?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        self.classifier.clone().unwrap_or_default()
    }
}

#[cfg(feature = "cli")]
impl From<&crate::config::CliConfig> for RunConfig {
    fn from(cli: &crate::config::CliConfig) -> Self {
        Self {
            server: ServerConfig {
                endpoint: cli.endpoint.clone(),
                timeout_seconds: Some(cli.timeout_secs),
                json_mode: Some(!cli.no_json_format),
            },
            retry: RetryConfig {
                attempts: Some(cli.retry_attempts),
                delay_seconds: Some(cli.retry_delay_secs),
            },
            run: RunSection {
                models: cli.models.clone(),
                input_path: cli.input_path.clone(),
                output_path: cli.output_path.clone(),
                file_suffix: Some(cli.file_suffix.clone()),
                prompt_style: Some(cli.prompt_style),
                response_parsing: Some(cli.response_parsing),
            },
            classifier: None,
            monitoring: Some(MonitoringConfig {
                enabled: cli.monitor,
                json_logs: Some(cli.json_logs),
            }),
        }
    }
}

impl ConfigProvider for RunConfig {
    fn endpoint(&self) -> &str {
        &self.server.endpoint
    }

    fn models(&self) -> &[String] {
        &self.run.models
    }

    fn input_path(&self) -> &str {
        &self.run.input_path
    }

    fn output_path(&self) -> &str {
        &self.run.output_path
    }

    fn file_suffix(&self) -> &str {
        self.run.file_suffix.as_deref().unwrap_or("full_timeline")
    }

    fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::new(
            self.retry.attempts.unwrap_or(defaults.max_attempts),
            self.retry
                .delay_seconds
                .and_then(|d| Duration::try_from_secs_f64(d).ok())
                .unwrap_or(defaults.delay),
        )
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_seconds.unwrap_or(30))
    }

    fn prompt_style(&self) -> PromptStyle {
        self.run.prompt_style.unwrap_or_default()
    }

    fn parse_mode(&self) -> ParseMode {
        self.run.response_parsing.unwrap_or_default()
    }

    fn json_mode(&self) -> bool {
        self.server.json_mode.unwrap_or(true)
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::ModelKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_run_config() {
        let toml_content = r#"
[server]
endpoint = "http://gpu-box:11434"
timeout_seconds = 60
json_mode = false

[retry]
attempts = 3
delay_seconds = 0.5

[run]
models = ["gemma2", "mistral"]
input_path = "./test-timelines"
output_path = "./expert_prompt_test"
file_suffix = "begin"
prompt_style = "expert"
response_parsing = "lenient"

[monitoring]
enabled = true
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.endpoint(), "http://gpu-box:11434");
        assert_eq!(config.models(), &["gemma2".to_string(), "mistral".to_string()]);
        assert_eq!(config.file_suffix(), "begin");
        assert_eq!(config.prompt_style(), PromptStyle::Expert);
        assert_eq!(config.parse_mode(), ParseMode::Lenient);
        assert!(!config.json_mode());
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(3, Duration::from_millis(500))
        );
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();

        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.models().len(), 5);
        assert_eq!(config.file_suffix(), "full_timeline");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.json_mode());
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SELFSTATE_TEST_ENDPOINT", "http://10.0.0.7:11434");

        let toml_content = r#"
[server]
endpoint = "${SELFSTATE_TEST_ENDPOINT}"
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.endpoint, "http://10.0.0.7:11434");

        std::env::remove_var("SELFSTATE_TEST_ENDPOINT");
    }

    #[test]
    fn test_unset_env_var_left_verbatim() {
        let toml_content = r#"
[server]
endpoint = "${SELFSTATE_SURELY_UNSET_VAR}"
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.endpoint, "${SELFSTATE_SURELY_UNSET_VAR}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let no_models = RunConfig::from_toml_str(
            r#"
[run]
models = []
input_path = "./in"
output_path = "./out"
"#,
        )
        .unwrap();
        assert!(no_models.validate().is_err());

        let zero_attempts = RunConfig::from_toml_str("[retry]\nattempts = 0\n").unwrap();
        assert!(zero_attempts.validate().is_err());

        let negative_delay = RunConfig::from_toml_str("[retry]\ndelay_seconds = -1.0\n").unwrap();
        assert!(negative_delay.validate().is_err());
    }

    #[test]
    fn test_huge_delay_rejected_without_panic() {
        let config = RunConfig::from_toml_str("[retry]\ndelay_seconds = 1e30\n").unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            EtlError::InvalidConfigValueError { ref field, .. } if field == "retry.delay_seconds"
        ));
        assert_eq!(config.retry_policy().delay, RetryPolicy::default().delay);
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config = RunConfig::from_toml_str(
            "[server]\ntimeout_seconds = 90\n\n[run]\nmodels = [\"gemma2\"]\n",
        )
        .unwrap();

        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout(), Duration::from_secs(90));
        assert_eq!(config.models(), &["gemma2".to_string()]);
        assert_eq!(config.input_path(), "./timelines");
        assert_eq!(config.output_path(), "./output");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = RunConfig::from_toml_str("[server\nendpoint = ").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_classifier_section_overrides_selected_fields() {
        let toml_content = r#"
[classifier]
training_path = "data/train_data_classified.json"
noise_std = 0.01

[classifier.maladaptive]
model = "logistic"
vote_rounds = 11

[classifier.boosting]
n_estimators = 50
"#;

        let config = RunConfig::from_toml_str(toml_content).unwrap();
        let classifier = config.classifier_settings();

        assert_eq!(classifier.training_path, "data/train_data_classified.json");
        assert_eq!(classifier.noise_std, 0.01);
        assert_eq!(classifier.maladaptive.model, ModelKind::Logistic);
        assert_eq!(classifier.maladaptive.vote_rounds, 11);
        assert_eq!(classifier.adaptive.vote_rounds, 50);
        assert_eq!(classifier.boosting.n_estimators, 50);
        assert_eq!(classifier.boosting.max_depth, 4);
        assert_eq!(classifier.seed, 42);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[run]\nmodels = [\"llama3.1\"]\ninput_path = \"in\"\noutput_path = \"out\"\n")
            .unwrap();

        let config = RunConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.models(), &["llama3.1".to_string()]);
    }
}
