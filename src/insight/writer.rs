//! Writer completions API client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, PipelineError};
use crate::insight::{CompletionRequest, CompletionService};

const DEFAULT_BASE_URL: &str = "https://api.writer.com";
const COMPLETIONS_PATH: &str = "/v1/completions";

pub const API_KEY_ENV: &str = "WRITER_API_KEY";
pub const BASE_URL_ENV: &str = "WRITER_BASE_URL";

pub struct WriterClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WriterClient {
    /// Build a client from `WRITER_API_KEY` (and optional `WRITER_BASE_URL`),
    /// loading `.env` first.
    pub fn from_env(timeout: Duration) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            AppError::new(
                2,
                format!("Missing {API_KEY_ENV} in environment (.env). Use --no-insight to skip analysis."),
            )
        })?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url, timeout)
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{COMPLETIONS_PATH}", self.base_url)
    }
}

impl CompletionService for WriterClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, PipelineError> {
        debug!(
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            prompt_chars = request.prompt.len(),
            "sending completion request"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| PipelineError::Analysis(format!("Completion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(PipelineError::Analysis(format!(
                "Completion request failed with status {status}: {}",
                body.trim()
            )));
        }

        let body: CompletionResponse = resp
            .json()
            .map_err(|e| PipelineError::Analysis(format!("Failed to parse completion response: {e}")))?;

        first_choice_text(body)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

fn first_choice_text(body: CompletionResponse) -> Result<String, PipelineError> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.text)
        .ok_or_else(|| PipelineError::Analysis("Completion response contained no choices.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_first_choice() {
        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"text":"first","log_probs":null},{"text":"second"}],"model":"m"}"#)
                .unwrap();
        assert_eq!(first_choice_text(body).unwrap(), "first");
    }

    #[test]
    fn empty_choices_is_an_analysis_error() {
        let body: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice_text(body), Err(PipelineError::Analysis(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = WriterClient::new("k", "http://localhost:1234/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/completions");
    }

    #[test]
    fn unreachable_service_is_an_analysis_error() {
        // Port 9 (discard) is not expected to accept HTTP on loopback.
        let client = WriterClient::new("k", "http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = CompletionRequest {
            model: "m".to_string(),
            prompt: "p".to_string(),
            temperature: 0.0,
            max_tokens: 1,
        };
        assert!(matches!(client.complete(&request), Err(PipelineError::Analysis(_))));
    }
}
