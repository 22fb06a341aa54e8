use crate::core::TextGenerator;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint, non-streaming.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    json_mode: bool,
}

impl OllamaClient {
    pub fn new(endpoint: &str, timeout: Duration, json_mode: bool) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            json_mode,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: self.json_mode.then_some("json"),
        };

        tracing::debug!("POST {} (model: {})", self.generate_url(), model);
        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("Generate response status: {}", response.status());
        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}
