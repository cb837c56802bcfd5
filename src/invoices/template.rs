use std::path::Path;

use anyhow::Context;

/// Static HTML with `{{name}}` placeholders, loaded once at startup.
#[derive(Debug, Clone)]
pub struct InvoiceTemplate {
    html: String,
}

pub const PLACEHOLDERS: [&str; 4] = ["amount", "address", "hash", "baseUrl"];

impl InvoiceTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read invoice template {}", path.display()))?;

        let template = Self::new(html);
        for name in PLACEHOLDERS {
            if !template.contains(name) {
                tracing::warn!(placeholder = name, path = %path.display(), "Template has no placeholder");
            }
        }
        Ok(template)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.html.contains(&token(name))
    }

    /// Replace every occurrence of each `{{key}}`. Tokens without a value are left as-is.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(self.html.clone(), |html, (key, value)| {
                html.replace(&token(key), value)
            })
    }
}

fn token(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}
