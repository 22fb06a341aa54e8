use crate::core::prompts::PromptTask;
use crate::core::response::{parse_response, Fields};
use crate::core::TextGenerator;
use crate::domain::settings::{ParseMode, RetryPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub fields: Fields,
    pub attempts: u32,
    /// Every attempt failed and `fields` is empty.
    pub exhausted: bool,
}

/// Sends prompts through a generator, retrying failed or unparsable answers.
pub struct QueryRunner<G: TextGenerator> {
    generator: G,
    policy: RetryPolicy,
    parse_mode: ParseMode,
}

impl<G: TextGenerator> QueryRunner<G> {
    pub fn new(generator: G, policy: RetryPolicy, parse_mode: ParseMode) -> Self {
        Self {
            generator,
            policy,
            parse_mode,
        }
    }

    /// Never fails: after the last failed attempt the outcome carries an empty object.
    pub async fn query(&self, model: &str, task: PromptTask, prompt: &str) -> QueryOutcome {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let result = match self.generator.generate(model, prompt).await {
                Ok(raw) => parse_response(&raw, self.parse_mode, task),
                Err(e) => Err(e),
            };

            match result {
                Ok(fields) => {
                    tracing::debug!("{} answered on attempt {}", task.name(), attempt);
                    return QueryOutcome {
                        fields,
                        attempts: attempt,
                        exhausted: false,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!("❌ {} failed with a non-retryable error: {}", task.name(), e);
                    return QueryOutcome {
                        fields: Fields::new(),
                        attempts: attempt,
                        exhausted: true,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ {} failed: {}. Retrying... (Attempt {}/{})",
                        task.name(),
                        e,
                        attempt,
                        max_attempts
                    );
                    if attempt < max_attempts && !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        tracing::error!(
            "❌ {} reached max retries ({}). Returning empty result.",
            task.name(),
            max_attempts
        );
        QueryOutcome {
            fields: Fields::new(),
            attempts: max_attempts,
            exhausted: true,
        }
    }
}
