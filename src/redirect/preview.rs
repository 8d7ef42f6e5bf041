//! Preview document rendering for crawlers.

use anyhow::Context;

use crate::models::Link;

pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/preview.html");

/// HTML template with `{{title}}`, `{{description}}`, `{{imageUrl}}` and
/// `{{url}}` placeholders. Values are substituted verbatim.
#[derive(Debug, Clone)]
pub struct PreviewTemplate {
    source: String,
}

impl Default for PreviewTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PreviewTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub async fn from_file(path: &str) -> anyhow::Result<Self> {
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read preview template {path}"))?;
        Ok(Self::new(source))
    }

    /// Substitute placeholders in a single pass. Text coming from the link is
    /// never scanned for placeholders itself.
    pub fn render(&self, link: &Link) -> String {
        let mut out = String::with_capacity(self.source.len() + 256);
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            match placeholder_value(tail, link) {
                Some((value, len)) => {
                    out.push_str(value);
                    rest = &tail[len..];
                }
                None => {
                    out.push_str("{{");
                    rest = &tail[2..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Value and token length of the placeholder `tail` starts with.
fn placeholder_value<'a>(tail: &str, link: &'a Link) -> Option<(&'a str, usize)> {
    let placeholders: [(&str, &'a str); 4] = [
        ("{{title}}", link.title.as_str()),
        ("{{description}}", link.description.as_str()),
        ("{{imageUrl}}", link.image_url.as_str()),
        ("{{url}}", link.original_url.as_str()),
    ];

    placeholders
        .into_iter()
        .find(|(token, _)| tail.starts_with(*token))
        .map(|(token, value)| (value, token.len()))
}
