//! Prompt command implementation

use anyhow::{Context, Result};
use catat_core::config::AppConfig;
use catat_core::ledger::ledger_today;
use catat_core::prompts::{build_prompt, PromptInput};

/// Print the extraction prompt for an image file id or a message
pub fn cmd_prompt(
    config: &AppConfig,
    image: Option<&str>,
    message: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let input = prompt_input(image, message, date)?;
    println!("{}", build_prompt(&input, &config.vocabulary));
    Ok(())
}

pub fn prompt_input(
    image: Option<&str>,
    message: Option<&str>,
    date: Option<&str>,
) -> Result<PromptInput> {
    match (image, message) {
        (Some(file_id), None) => Ok(PromptInput::image(file_id)),
        (None, Some(message)) => {
            let date = match date {
                Some(d) => {
                    chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))?;
                    d.to_string()
                }
                None => ledger_today(),
            };
            Ok(PromptInput::text(message, date))
        }
        _ => anyhow::bail!("Pass exactly one of --image or --message"),
    }
}
