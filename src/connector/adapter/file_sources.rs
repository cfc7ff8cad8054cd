//! File-backed sources for the orchestration: the prompt document, the
//! recipients document, and the HTML email template.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{DomainError, PromptSpec, Recipients, ReportKind};

/// Load the prompt document: a JSON object keyed by report-kind identifier,
/// each entry carrying `{prompt, model}`.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<HashMap<String, PromptSpec>, DomainError> {
    let path = path.as_ref();
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|e| {
        DomainError::config(format!("failed to parse prompt file {}: {e}", path.display()))
    })
}

/// Look a report kind up in a loaded prompt document.
pub fn prompt_for(
    prompts: &HashMap<String, PromptSpec>,
    kind: ReportKind,
) -> Result<PromptSpec, DomainError> {
    prompts
        .get(kind.key())
        .cloned()
        .ok_or_else(|| DomainError::config(format!("prompt file has no entry for '{}'", kind.key())))
}

/// Load the recipients document (`{to, cc}` address lists).
pub fn load_recipients(path: impl AsRef<Path>) -> Result<Recipients, DomainError> {
    let path = path.as_ref();
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|e| {
        DomainError::config(format!(
            "failed to parse recipients file {}: {e}",
            path.display()
        ))
    })
}

/// Load the HTML email template.
pub fn load_template(path: impl AsRef<Path>) -> Result<String, DomainError> {
    read_file(path.as_ref())
}

fn read_file(path: &Path) -> Result<String, DomainError> {
    if !path.exists() {
        return Err(DomainError::not_found(format!("file not found: {}", path.display())));
    }
    Ok(std::fs::read_to_string(path)?)
}
