pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::settings::{ParseMode, PromptStyle};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODELS: [&str; 5] = ["llama2", "llama3.1", "llama3.2", "mistral", "gemma2"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "selfstate-etl")]
#[command(about = "Score timelines of posts for adaptive and maladaptive self-states with local LLMs")]
pub struct CliConfig {
    /// TOML run configuration; when given, the run flags below are ignored
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Models to run, one submission file each
    #[arg(long, value_delimiter = ',', default_values = DEFAULT_MODELS)]
    pub models: Vec<String>,

    /// Directory of timeline JSON files, or a single JSON file
    #[arg(long, default_value = "./timelines")]
    pub input_path: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "full_timeline")]
    pub file_suffix: String,

    #[arg(long, value_enum, default_value_t = PromptStyle::Default)]
    pub prompt_style: PromptStyle,

    #[arg(long, value_enum, default_value_t = ParseMode::Strict)]
    pub response_parsing: ParseMode,

    /// Do not ask the server to constrain output to JSON
    #[arg(long)]
    pub no_json_format: bool,

    #[arg(long, default_value = "5")]
    pub retry_attempts: u32,

    #[arg(long, default_value = "2")]
    pub retry_delay_secs: f64,

    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,

    #[arg(long, help = "List the planned work without calling the server")]
    pub dry_run: bool,
}
