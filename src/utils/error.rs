use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration field '{field}' failed to load: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Model response could not be parsed: {message}")]
    ResponseParseError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Training error: {message}")]
    TrainingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Io,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ResponseParseError { .. } | EtlError::TrainingError { .. } => {
                ErrorCategory::Model
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ResponseParseError { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::TrainingError { .. } => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether a query that failed with this error is worth sending again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EtlError::ApiError(_) | EtlError::ResponseParseError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the inference server is running and the endpoint is reachable"
            }
            ErrorCategory::Configuration => "Review the command-line flags or the TOML config file",
            ErrorCategory::Data => "Check that the input files follow the timeline JSON layout",
            ErrorCategory::Io => "Check that the input and output paths exist and are writable",
            ErrorCategory::Model => {
                "Try a different model or switch response parsing to 'lenient'"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => {
                "The inference server did not answer in time".to_string()
            }
            EtlError::ApiError(e) if e.is_connect() => {
                "Could not connect to the inference server".to_string()
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            other => other.to_string(),
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        self.severity().exit_code()
    }
}

impl ErrorSeverity {
    /// Exit codes are not ordered by severity; compare severities, then map.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(e: toml::de::Error) -> Self {
        EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
