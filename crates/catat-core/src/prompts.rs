//! Extraction prompt construction
//!
//! The prompt is a pure function of the input and the configured
//! vocabularies: the same parameters always produce byte-identical text.

use crate::config::Vocabulary;
use crate::models::InputKind;

/// What the prompt asks the backend to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// A receipt or transfer screenshot attached to the request
    Image {
        /// Echoed back by the backend as `file_id`
        file_id: String,
    },
    /// A free-text chat message
    Text {
        message: String,
        /// `YYYY-MM-DD`, used when the message names no date
        current_date: String,
    },
}

impl PromptInput {
    pub fn image(file_id: impl Into<String>) -> Self {
        Self::Image {
            file_id: file_id.into(),
        }
    }

    pub fn text(message: impl Into<String>, current_date: impl Into<String>) -> Self {
        Self::Text {
            message: message.into(),
            current_date: current_date.into(),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Image { .. } => InputKind::Image,
            Self::Text { .. } => InputKind::Text,
        }
    }
}

/// Build the extraction prompt
pub fn build_prompt(input: &PromptInput, vocabulary: &Vocabulary) -> String {
    let categories = vocabulary.categories.join(" / ");

    let mut fields = format!(
        "Fields:
  - title (summary of the transaction notes)
  - transaction_date (format always YYYY-MM-DD)
  - amount (ALWAYS use positive numbers in rupiah. Format: 1,000,000 for 1 million, 100,000 for 100k. Never use negative numbers, the transaction type is determined by context words like \"spent\", \"bought\", \"earned\", \"received\")
  - notes (details of the transaction, containing items bought)
  - category ({})",
        categories
    );

    let (input_desc, date_line, example_file_id) = match input {
        PromptInput::Image { file_id } => {
            fields.push_str(&format!(
                "\n  - destination_number\n  - source_account (only {})\n  - file_id {}",
                vocabulary.accounts.join(" / "),
                file_id
            ));
            ("from the image".to_string(), String::new(), file_id.as_str())
        }
        PromptInput::Text {
            message,
            current_date,
        } => {
            fields.push_str("\n  - file_id should be empty");
            (
                format!("from the following message: {}", message),
                format!(
                    "  - transaction_date should be {} (format always YYYY-MM-DD)\n",
                    current_date
                ),
                "",
            )
        }
    };

    format!(
        r#"Please extract the following data {input_desc} and return it as valid JSON.

{fields}
{date_line}IMPORTANT:
Respond ONLY with raw JSON.
No explanation, no formatting, no code blocks.

Example:
{{
  "title": "Spent on Lunch at ABC Cafe",
  "transaction_date": "2025-03-30",
  "amount": "150,000",
  "notes": "Lunch payment at ABC cafe - always use positive amounts regardless of whether it's spending or earning",
  "destination_number": "0524012911",
  "source_account": "Gopay",
  "category": "Eating Out",
  "file_id": "{example_file_id}"
}}"#
    )
}
