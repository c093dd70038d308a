//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Vision models take
//! base64 images alongside the prompt; the single `response` string becomes
//! one candidate.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};

use super::types::{Candidate, Completion, CompletionRequest};
use super::ExtractionBackend;

pub const DEFAULT_MODEL: &str = "llama3.2-vision";

#[derive(Debug, Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// `OLLAMA_HOST` is required; `OLLAMA_MODEL` is optional.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::config("OLLAMA_HOST is not set").with_component("backend"))?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(&host, &model))
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl ExtractionBackend for OllamaBackend {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion> {
        let images = request
            .image
            .iter()
            .map(|image| base64::engine::general_purpose::STANDARD.encode(&image.data))
            .collect();

        let body = OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            images,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::backend(format!("Ollama error {}", status))
                .with_context("status", status.as_u16())
                .with_context("body", error_text)
                .with_context("model", self.model.clone()));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AppError::backend("failed to decode Ollama response").caused_by(e))?;
        debug!("Ollama response: {}", ollama_response.response);

        Ok(Completion::new(vec![Candidate::single(
            ollama_response.response,
        )]))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
