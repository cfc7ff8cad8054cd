use serde::Deserialize;

/// One entry of the prompt document: the templated prompt text and the model
/// it should be sent to.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptSpec {
    pub prompt: String,
    pub model: String,
}

impl PromptSpec {
    /// Render the prompt: trim surrounding whitespace and substitute every
    /// `{name}` placeholder with its computed value.
    pub fn render(&self, vars: &[(&str, String)]) -> String {
        fill_placeholders(self.prompt.trim(), vars)
    }
}

/// Replace `{name}` tokens with their values. Unknown tokens are left as-is.
pub fn fill_placeholders(text: &str, vars: &[(&str, String)]) -> String {
    let mut out = text.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
