//! Configuration management for vimdoc

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub anchors: AnchorConfig,
    pub html: HtmlConfig,
    pub extract: ExtractConfig,
}

/// Layout of the generated help file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Column at which text is wrapped and tags are aligned
    pub text_width: usize,
    /// Indentation added for each level of block quote nesting
    pub shift_width: usize,
    /// Minimum indentation of code block lines
    pub code_indent: usize,
    /// A list compacts when none of its items spans more lines than this
    pub compact_threshold: usize,
    /// Emit the table of contents block
    pub toc: bool,
    /// Last line of the help file, empty to omit
    pub modeline: String,
}

/// How heading tags are made unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Placed between a colliding tag and its numeric suffix
    pub suffix_separator: String,
    /// Number of suffixes tried before giving up
    pub max_suffix: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Id of the element holding the document content
    pub content_id: String,
    /// Selectors of elements dropped before conversion, e.g. `h3 a.anchor`
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Markdown heading level used for each script
    pub start_level: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            text_width: 79,
            shift_width: 2,
            code_indent: 4,
            compact_threshold: 1,
            toc: true,
            modeline: "vim: ft=help".to_string(),
        }
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            suffix_separator: "-".to_string(),
            max_suffix: 100,
        }
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            content_id: "content".to_string(),
            ignore: Vec::new(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { start_level: 1 }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "vimdoc")
            .map(|proj_dirs| proj_dirs.config_dir().join("vimdoc.toml"))
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.convert.text_width < 20 {
            anyhow::bail!(
                "Config file {} sets text_width to {}, at least 20 columns are needed",
                path.display(),
                config.convert.text_width
            );
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
