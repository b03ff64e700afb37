//! Help tag generation for headings

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::AnchorConfig;
use crate::error::ParseError;
use crate::node::Heading;

static CALL_ARGUMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(.*?\)").expect("valid regex"));
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));
static APOSTROPHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w)'(\w)").expect("valid regex"));
static COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s+").expect("valid regex"));
static INVALID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_().:]+").expect("valid regex"));
static VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid regex"));

const FILLER_WORDS: [&str; 4] = ["a", "the", "and", "some"];
const FALLBACK: &str = "section";

/// Tag prefix for a help file name: `foo-1.2.txt` becomes `foo`
pub fn prefix_for(filename: &str) -> String {
    let base = filename.strip_suffix(".txt").unwrap_or(filename);
    match base.split_once('-') {
        Some((name, version)) if VERSION.is_match(version) => name.to_string(),
        _ => base.to_string(),
    }
}

/// Tag for a heading that documents a code entity, e.g. `foo#bar(x, y)`
pub fn tag_from_code(code: &str, prefix: &str) -> String {
    let mut anchor = code.to_string();
    for (op, word) in [("+", "add"), ("-", "sub"), ("*", "mul"), ("/", "div")] {
        anchor = anchor.replace(op, &format!(" {word} "));
    }
    let anchor = CALL_ARGUMENTS.replace_all(&anchor, "()");
    finish(&anchor, prefix)
}

/// Tag for a heading in plain English
pub fn tag_from_text(text: &str, prefix: &str) -> String {
    let anchor = text.to_lowercase();
    let anchor = PARENTHESIZED.replace_all(&anchor, "");
    let anchor = APOSTROPHE.replace_all(&anchor, "$1$2");
    let anchor = COLON.replace_all(&anchor, " ");
    let anchor = anchor
        .split_whitespace()
        .filter(|token| !FILLER_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ");
    finish(&anchor, prefix)
}

fn sanitize(text: &str) -> String {
    INVALID.replace_all(text, "-").trim_matches('-').to_string()
}

fn finish(anchor: &str, prefix: &str) -> String {
    let mut anchor = sanitize(anchor);
    if anchor.is_empty() {
        anchor = FALLBACK.to_string();
    }
    if !prefix.is_empty() && !anchor.to_lowercase().starts_with(&prefix.to_lowercase()) {
        anchor = format!("{prefix}-{anchor}");
    }
    sanitize(&anchor)
}

/// Tracks the tags handed out within one document
#[derive(Debug)]
pub struct AnchorRegistry {
    prefix: String,
    separator: String,
    max_suffix: usize,
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new(prefix: impl Into<String>, config: &AnchorConfig) -> Self {
        Self {
            prefix: prefix.into(),
            separator: config.suffix_separator.clone(),
            max_suffix: config.max_suffix,
            used: HashSet::new(),
        }
    }

    /// Pick a unique tag for `heading`
    ///
    /// Code spans in the heading are preferred, then the heading text. When
    /// every candidate is taken the text tag gets a numeric suffix.
    pub fn assign(&mut self, heading: &Heading) -> Result<String, ParseError> {
        let text_tag = tag_from_text(&heading.text, &self.prefix);
        let candidates = heading
            .code
            .iter()
            .map(|code| tag_from_code(code, &self.prefix))
            .chain(std::iter::once(text_tag.clone()));

        for candidate in candidates {
            if self.used.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }

        for n in 2..2 + self.max_suffix {
            let candidate = format!("{text_tag}{}{n}", self.separator);
            if self.used.insert(candidate.clone()) {
                log::debug!("Tag {text_tag} taken, using {candidate}");
                return Ok(candidate);
            }
        }

        Err(ParseError::AnchorCollision {
            anchor: text_tag,
            attempts: self.max_suffix,
        })
    }

    /// Claim a tag that is not derived from a heading
    pub fn reserve(&mut self, tag: impl Into<String>) {
        self.used.insert(tag.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(prefix: &str) -> AnchorRegistry {
        AnchorRegistry::new(prefix, &AnchorConfig::default())
    }

    #[test]
    fn test_prefix_for() {
        assert_eq!(prefix_for("easytags.txt"), "easytags");
        assert_eq!(prefix_for("misc-1.8.txt"), "misc");
        assert_eq!(prefix_for("vim-shell.txt"), "vim-shell");
        assert_eq!(prefix_for(""), "");
    }

    #[test]
    fn test_tag_from_text() {
        assert_eq!(tag_from_text("Installation", ""), "installation");
        assert_eq!(tag_from_text("The plug-in's options", "foo"), "foo-plug-ins-options");
        assert_eq!(tag_from_text("Usage (optional)", "foo"), "foo-usage");
        assert_eq!(tag_from_text("Note: a thing", ""), "note-thing");
    }

    #[test]
    fn test_tag_from_text_skips_redundant_prefix() {
        assert_eq!(tag_from_text("Easytags options", "easytags"), "easytags-options");
    }

    #[test]
    fn test_tag_from_text_never_empty() {
        assert_eq!(tag_from_text("???", ""), "section");
        assert_eq!(tag_from_text("???", "foo"), "foo-section");
    }

    #[test]
    fn test_tag_from_code() {
        assert_eq!(tag_from_code("xolox#misc#open#url(url)", "misc"), "misc-xolox-misc-open-url()");
        assert_eq!(tag_from_code("g:easytags_file", "easytags"), "easytags-g:easytags_file");
        assert_eq!(tag_from_code(":UpdateTags", ""), ":UpdateTags");
    }

    #[test]
    fn test_registry_prefers_code_spans() {
        let mut tags = registry("");
        let heading = Heading::new(2, "The :UpdateTags command").with_code(vec![":UpdateTags".into()]);
        assert_eq!(tags.assign(&heading).unwrap(), ":UpdateTags");
        // Second heading with the same code falls back to its text
        let again = Heading::new(2, "More on :UpdateTags").with_code(vec![":UpdateTags".into()]);
        assert_eq!(tags.assign(&again).unwrap(), "more-on-:updatetags");
    }

    #[test]
    fn test_registry_suffixes_collisions() {
        let mut tags = registry("doc");
        let heading = Heading::new(2, "Options");
        assert_eq!(tags.assign(&heading).unwrap(), "doc-options");
        assert_eq!(tags.assign(&heading).unwrap(), "doc-options-2");
        assert_eq!(tags.assign(&heading).unwrap(), "doc-options-3");
    }

    #[test]
    fn test_registry_custom_separator() {
        let config = AnchorConfig {
            suffix_separator: "_".into(),
            max_suffix: 5,
        };
        let mut tags = AnchorRegistry::new("", &config);
        let heading = Heading::new(1, "Usage");
        tags.assign(&heading).unwrap();
        assert_eq!(tags.assign(&heading).unwrap(), "usage_2");
    }

    #[test]
    fn test_registry_exhausts_suffixes() {
        let config = AnchorConfig {
            suffix_separator: "-".into(),
            max_suffix: 1,
        };
        let mut tags = AnchorRegistry::new("", &config);
        let heading = Heading::new(1, "Usage");
        tags.assign(&heading).unwrap();
        tags.assign(&heading).unwrap();
        let err = tags.assign(&heading).unwrap_err();
        assert_eq!(
            err,
            ParseError::AnchorCollision {
                anchor: "usage".into(),
                attempts: 1
            }
        );
    }

    #[test]
    fn test_reserved_tags_are_skipped() {
        let mut tags = registry("");
        tags.reserve("contents");
        let heading = Heading::new(1, "Contents");
        assert_eq!(tags.assign(&heading).unwrap(), "contents-2");
    }
}
