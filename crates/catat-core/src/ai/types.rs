//! Extraction backend request/response types
//!
//! These types are backend-agnostic and used across all implementations.

use serde::{Deserialize, Serialize};

/// An image attached to an extraction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// e.g. `image/jpeg`
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Guess the MIME type from a file name; unknown extensions are JPEG
    pub fn mime_type_for(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "heif" => "image/heif",
            "gif" => "image/gif",
            _ => "image/jpeg",
        }
    }
}

/// One call to the extraction backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Present in image mode only
    pub image: Option<ImageInput>,
}

impl CompletionRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// One independent completion, made of one or more text fragments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub parts: Vec<String>,
}

impl Candidate {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// A candidate with a single text fragment
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            parts: vec![text.into()],
        }
    }

    /// All fragments joined in order
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

/// Everything the backend returned for one request, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub candidates: Vec<Candidate>,
}

impl Completion {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

/// Which successfully decoded candidate is kept when several decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// Each successful decode replaces the previous one
    #[default]
    LastWins,
    /// The first successful decode is kept
    FirstWins,
}

impl CandidatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastWins => "last_wins",
            Self::FirstWins => "first_wins",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(ImageInput::mime_type_for("receipt.PNG"), "image/png");
        assert_eq!(ImageInput::mime_type_for("photo_1.jpg"), "image/jpeg");
        assert_eq!(ImageInput::mime_type_for("scan.webp"), "image/webp");
        assert_eq!(ImageInput::mime_type_for("no_extension"), "image/jpeg");
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let candidate = Candidate::new(vec!["{\"amount\":".into(), "\"10\"}".into()]);
        assert_eq!(candidate.text(), "{\"amount\":\"10\"}");
    }
}
