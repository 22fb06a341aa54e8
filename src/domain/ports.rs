use crate::domain::settings::{ParseMode, PromptStyle, RetryPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// File names (relative to the storage root) with the given extension, sorted.
    fn list_files(
        &self,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn models(&self) -> &[String];
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn file_suffix(&self) -> &str;
    fn retry_policy(&self) -> RetryPolicy;
    fn request_timeout(&self) -> Duration;
    fn prompt_style(&self) -> PromptStyle;
    fn parse_mode(&self) -> ParseMode;
    fn json_mode(&self) -> bool;
}

/// A text-generation backend: one prompt in, raw model text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Self::Input>;
    async fn transform(&self, data: Self::Input) -> Result<Self::Output>;
    async fn load(&self, result: Self::Output) -> Result<String>;
}
