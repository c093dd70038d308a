//! Extraction client: prompt, backend call, candidate parsing
//!
//! In image mode the input file is read, sent inline, and removed once the
//! backend has answered, whatever the parse outcome. A failed backend call
//! leaves the file in place so the caller can retry.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{
    parse_candidates, AIClient, CandidatePolicy, Completion, CompletionRequest, ExtractionBackend,
    ImageInput,
};
use crate::config::{AppConfig, Vocabulary};
use crate::error::{AppError, Result};
use crate::models::Transaction;
use crate::prompts::{build_prompt, PromptInput};

#[derive(Debug, Clone)]
pub struct ExtractionClient {
    backend: AIClient,
    vocabulary: Vocabulary,
    policy: CandidatePolicy,
    timeout: Duration,
}

impl ExtractionClient {
    pub fn new(
        backend: AIClient,
        vocabulary: Vocabulary,
        policy: CandidatePolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            vocabulary,
            policy,
            timeout,
        }
    }

    pub fn from_config(backend: AIClient, config: &AppConfig) -> Self {
        Self::new(
            backend,
            config.vocabulary.clone(),
            config.extraction.candidate_policy,
            config.extraction.timeout,
        )
    }

    pub fn backend(&self) -> &AIClient {
        &self.backend
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Extract a transaction from an image on disk
    ///
    /// The file id sent to the backend is the last path segment.
    pub async fn extract_image(&self, path: &Path) -> Result<Transaction> {
        let file_id = file_id_for(path);
        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::file("failed to read image")
                .caused_by(e)
                .with_context("path", path.display().to_string())
        })?;

        let input = PromptInput::image(file_id.clone());
        let image = ImageInput::new(ImageInput::mime_type_for(&file_id), data);
        let request = CompletionRequest::with_image(build_prompt(&input, &self.vocabulary), image);

        let completion = self.generate(&request, &input).await?;

        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(path = %path.display(), "Removed processed image"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove processed image"),
        }

        Ok(parse_candidates(&completion, self.policy))
    }

    /// Extract a transaction from a chat message
    ///
    /// `current_date` (`YYYY-MM-DD`) is used when the message names no date.
    pub async fn extract_text(&self, message: &str, current_date: &str) -> Result<Transaction> {
        let input = PromptInput::text(message, current_date);
        let request = CompletionRequest::text(build_prompt(&input, &self.vocabulary));
        let completion = self.generate(&request, &input).await?;
        Ok(parse_candidates(&completion, self.policy))
    }

    async fn generate(
        &self,
        request: &CompletionRequest,
        input: &PromptInput,
    ) -> Result<Completion> {
        debug!(
            model = self.backend.model(),
            mode = %input.kind(),
            "Requesting extraction"
        );
        match tokio::time::timeout(self.timeout, self.backend.generate(request)).await {
            Ok(Ok(completion)) => {
                debug!(candidates = completion.candidates.len(), "Extraction backend answered");
                Ok(completion)
            }
            Ok(Err(e)) => Err(e
                .with_component("backend")
                .with_context("mode", input.kind().as_str())
                .with_context("model", self.backend.model())),
            Err(_) => Err(AppError::timeout("extraction backend timed out")
                .with_component("backend")
                .with_context("mode", input.kind().as_str())
                .with_context("timeout_secs", self.timeout.as_secs())),
        }
    }
}

/// Last path segment of an input reference
pub fn file_id_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
