//! Mock backend for testing
//!
//! Returns scripted candidates (or a scripted failure) and records every
//! request it receives, so tests can assert on prompts and attached images.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AppError, Result};

use super::types::{Candidate, Completion, CompletionRequest};
use super::ExtractionBackend;

#[derive(Debug, Clone)]
enum Script {
    Candidates(Vec<Candidate>),
    Fail(String),
}

/// Mock extraction backend
///
/// Clones share the request log, so a test can keep one handle while the
/// pipeline owns another.
#[derive(Debug, Clone)]
pub struct MockBackend {
    script: Script,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A healthy backend that answers with a single grocery transaction
    pub fn new() -> Self {
        Self::with_candidates(vec![Candidate::single(
            r#"{"title":"Groceries","transaction_date":"2025-03-30","amount":"150,000","notes":"Weekly groceries","category":"Groceries"}"#,
        )])
    }

    /// Answer every request with these candidates
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            script: Script::Candidates(candidates),
            requests: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }

    /// Answer every request with one single-part candidate per text
    pub fn with_responses(texts: &[&str]) -> Self {
        Self::with_candidates(texts.iter().map(|t| Candidate::single(*t)).collect())
    }

    /// Fail every request with a backend error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            healthy: false,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.script {
            Script::Candidates(candidates) => Ok(Completion::new(candidates.clone())),
            Script::Fail(message) => Err(AppError::backend(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
