pub mod etl;
pub mod evidence_pipeline;
pub mod llm_client;
pub mod prompt_pipeline;
pub mod prompts;
pub mod response;
pub mod retry;
pub mod runner;
pub mod timeline_reader;

pub use crate::domain::model::{Submission, TimelineAnalysis};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TextGenerator};
pub use crate::utils::error::Result;
