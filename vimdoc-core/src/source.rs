//! Loading source documents from disk

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::markdown;
use crate::node::DocumentNode;

/// Markup language of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Markdown,
    Html,
}

impl InputFormat {
    /// Guess the format from the file extension, falling back to the content
    pub fn detect(path: Option<&Path>, text: &str) -> Self {
        let extension = path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("html" | "htm" | "xhtml") => InputFormat::Html,
            Some("md" | "markdown" | "mkd" | "txt") => InputFormat::Markdown,
            _ if text.trim_start().starts_with('<') => InputFormat::Html,
            _ => InputFormat::Markdown,
        }
    }
}

/// A parsed document together with metadata found while reading it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    pub root: DocumentNode,
    /// Title from front matter or the HTML `<title>`
    pub title: Option<String>,
}

impl SourceDocument {
    /// Load and parse a document from a file path
    pub fn load(path: &Path, config: &Config) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let format = InputFormat::detect(Some(path), &text);
        log::debug!("Reading {} as {:?}", path.display(), format);
        Self::parse(&text, format, config)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse document text in the given format
    pub fn parse(text: &str, format: InputFormat, config: &Config) -> Result<Self> {
        match format {
            InputFormat::Markdown => Ok(markdown::parse(text)),
            #[cfg(feature = "html")]
            InputFormat::Html => Ok(crate::html::parse(text, &config.html)?),
            #[cfg(not(feature = "html"))]
            InputFormat::Html => {
                let _ = config;
                anyhow::bail!("HTML input requires the `html` feature")
            }
        }
    }
}
