//! Function documentation extracted from Vim scripts
//!
//! Public functions and the comments directly below their `function!` line
//! are collected from every script in a directory tree and rendered as
//! Markdown, which is then embedded between two marker comments in a
//! README style document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use thiserror::Error;

use crate::wrap::{compact, wrap};

pub const START_MARKER: &str = "<!-- Start of generated documentation -->";
pub const END_MARKER: &str = "<!-- End of generated documentation -->";

static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^function! ([^(]+)\(").expect("valid function regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"\s?(.*)$"#).expect("valid comment regex"));
/// Matches dates written as `%B %e, %Y at %H:%M`
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+\s+\d{1,2},\s+\d{4}\s+at\s+\d\d:\d\d").expect("valid timestamp regex")
});

const SKIPPED_LABELS: [&str; 3] = ["Author", "Last Change", "URL"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract script prologue from {}", path.display())]
    MissingPrologue { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A public function and the comment lines documenting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDoc {
    pub name: String,
    pub comments: Vec<String>,
}

impl FunctionDoc {
    fn is_documented(&self) -> bool {
        self.comments.iter().any(|line| !line.trim().is_empty())
    }
}

/// Documentation found in a single Vim script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDoc {
    /// Path relative to the scanned directory
    pub path: PathBuf,
    /// One line summary of the script
    pub synopsis: String,
    pub description: Vec<String>,
    pub functions: Vec<FunctionDoc>,
}

impl ScriptDoc {
    /// Shallow parse of a script: the prologue comment and public functions
    pub fn parse(path: &Path, text: &str) -> Result<Self, ExtractError> {
        let mut lines = text.lines().peekable();

        let mut prologue = Vec::new();
        while let Some(caps) = lines.peek().copied().and_then(|line| COMMENT_RE.captures(line)) {
            lines.next();
            let text = caps.get(1).map_or("", |m| m.as_str());
            let skipped = text
                .split_once(':')
                .is_some_and(|(label, _)| SKIPPED_LABELS.contains(&label));
            if !skipped {
                prologue.push(text.to_string());
            }
        }

        if prologue.is_empty() {
            return Err(ExtractError::MissingPrologue {
                path: path.to_path_buf(),
            });
        }
        let synopsis = prologue.remove(0).trim().trim_end_matches('.').to_string();
        let description: Vec<String> = prologue
            .into_iter()
            .skip_while(|line| line.trim().is_empty())
            .collect();
        log::debug!("Extracted synopsis: {synopsis}");

        let mut functions = Vec::new();
        while let Some(line) = lines.next() {
            let Some(caps) = FUNCTION_RE.captures(line) else {
                continue;
            };
            let name = caps[1].to_string();
            let mut comments = Vec::new();
            while let Some(caps) = lines.peek().copied().and_then(|line| COMMENT_RE.captures(line)) {
                lines.next();
                comments.push(caps.get(1).map_or("", |m| m.as_str()).to_string());
            }
            if is_public_function(&name) {
                log::debug!("Found function: {name}()");
                functions.push(FunctionDoc { name, comments });
            }
        }

        log::info!(
            "Found {} function{} in {}",
            functions.len(),
            if functions.len() == 1 { "" } else { "s" },
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            synopsis,
            description,
            functions,
        })
    }
}

/// Global functions start with an upper case letter, autoload functions contain `#`
pub fn is_public_function(name: &str) -> bool {
    let upper = name.chars().next().is_some_and(char::is_uppercase);
    let global = !name.contains(':') && upper;
    let autoload = name.contains('#') && !upper;
    global || autoload
}

/// Vim scripts below `dir`, relative to it and sorted case-insensitively
pub fn find_vim_scripts(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    log::info!("Scanning {} for Vim scripts", dir.display());
    let mut scripts = Vec::new();
    let walker = walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "vim") {
            let path = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            log::debug!("Found {}", path.display());
            scripts.push(path.to_path_buf());
        }
    }
    scripts.sort_by_key(|path| path.to_string_lossy().to_lowercase());
    Ok(scripts)
}

/// Parse every Vim script below `dir`, keeping those that define public functions
pub fn extract_scripts(dir: &Path) -> Result<Vec<ScriptDoc>, ExtractError> {
    let mut docs = Vec::new();
    for path in find_vim_scripts(dir)? {
        let full = dir.join(&path);
        let text = fs::read_to_string(&full).map_err(|source| ExtractError::Read {
            path: full.clone(),
            source,
        })?;
        let doc = ScriptDoc::parse(&path, &text)?;
        if !doc.functions.is_empty() {
            docs.push(doc);
        }
    }
    Ok(docs)
}

/// Render the extracted documentation as Markdown
///
/// `date` is embedded in the introduction and ignored when comparing
/// generated documents, see [`ignore_timestamp`].
pub fn generate_documentation(scripts: &[ScriptDoc], start_level: usize, date: &str) -> String {
    let function_count: usize = scripts.iter().map(|s| s.functions.len()).sum();
    let intro = format!(
        "The documentation of the {} functions below was extracted from {} Vim scripts on {}.",
        function_count,
        scripts.len(),
        compact(date)
    );

    let mut output = vec![wrap(&intro, 79, "", "").join("\n")];
    let level = start_level.max(1);
    for script in scripts.iter().filter(|s| !s.functions.is_empty()) {
        output.push(format!("{} {}", "#".repeat(level), script.synopsis));
        if !script.description.is_empty() {
            output.push(script.description.join("\n"));
        }
        for function in script.functions.iter().filter(|f| f.is_documented()) {
            output.push(format!("{} The `{}()` function", "#".repeat(level + 1), function.name));
            output.push(function.comments.join("\n"));
        }
    }
    output.join("\n\n")
}

/// Replace the text between the documentation markers of `template`
///
/// Returns `None` when the template has no (complete) pair of markers.
pub fn embed_documentation(template: &str, documentation: &str) -> Option<String> {
    let start = template.find(START_MARKER)?;
    let end = start + template[start..].find(END_MARKER)? + END_MARKER.len();
    let block = [START_MARKER, documentation, END_MARKER].join("\n\n");
    Some(format!("{}{}{}", &template[..start], block, &template[end..]))
}

/// Remove `%B %e, %Y at %H:%M` timestamps so generated texts compare equal
pub fn ignore_timestamp(text: &str) -> String {
    TIMESTAMP_RE.replace_all(text, "").into_owned()
}

/// Regenerate the documentation embedded in the Markdown file at `path`
///
/// Scripts are searched in the directory containing the file. The file is
/// only written when something besides the timestamp changed; the return
/// value tells whether it was.
pub fn update_markdown(path: &Path, start_level: usize, date: &str) -> anyhow::Result<bool> {
    log::debug!("Reading template: {}", path.display());
    let template = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    if !template.contains(START_MARKER) {
        log::warn!("{} doesn't contain start marker: {}", path.display(), START_MARKER);
        return Ok(false);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let scripts = extract_scripts(dir)?;
    let documentation = generate_documentation(&scripts, start_level, date);

    let Some(updated) = embed_documentation(&template, &documentation) else {
        log::warn!("{} doesn't contain end marker: {}", path.display(), END_MARKER);
        return Ok(false);
    };
    if ignore_timestamp(&updated) == ignore_timestamp(&template) {
        log::info!("{} is up to date", path.display());
        return Ok(false);
    }

    log::debug!("Writing template: {}", path.display());
    fs::write(path, updated).with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(true)
}
