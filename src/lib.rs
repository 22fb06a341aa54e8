pub mod classify;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::RunConfig;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{
    etl::EtlEngine, evidence_pipeline::EvidencePipeline, llm_client::OllamaClient,
    prompt_pipeline::PromptPipeline, runner::run_models, timeline_reader::TimelineReader,
};
pub use utils::error::{EtlError, Result};
