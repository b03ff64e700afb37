//! Hyperlinks turned into numbered references and help tag links

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::wrap::compact;

const VIM_HOMEPAGES: [&str; 4] = [
    "http://www.vim.org/",
    "https://www.vim.org/",
    "http://www.vim.org",
    "https://www.vim.org",
];
const VIM_HELP_SITES: [&str; 4] = [
    "http://vimdoc.sourceforge.net/htmldoc/",
    "https://vimdoc.sourceforge.net/htmldoc/",
    "http://vimhelp.org/",
    "https://vimhelp.org/",
];

/// What a link points at, from the help file's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// A tag in Vim's own documentation
    VimHelp(String),
    /// The Vim homepage, not worth a reference
    VimHome,
    /// Anything reachable over the network
    External(String),
    /// Relative URLs, in-page anchors, mail addresses
    Local,
}

impl LinkTarget {
    pub fn classify(target: &str) -> Self {
        let target = percent_decode_str(target.trim()).decode_utf8_lossy();
        if VIM_HOMEPAGES.contains(&target.as_ref()) {
            return LinkTarget::VimHome;
        }
        if VIM_HELP_SITES.iter().any(|site| target.starts_with(site)) {
            if let Some((_, tag)) = target.split_once('#') {
                if !tag.is_empty() {
                    return LinkTarget::VimHelp(tag.to_string());
                }
            }
        }
        if target.contains("://") {
            LinkTarget::External(target.into_owned())
        } else {
            LinkTarget::Local
        }
    }

    /// Whether rendering this link adds an entry to the reference list
    pub fn needs_reference(&self, text: &str) -> bool {
        match self {
            LinkTarget::External(url) => {
                let text = compact(text);
                !text.is_empty() && text != *url
            }
            _ => false,
        }
    }
}

/// Numbered list of external link targets in order of first appearance
#[derive(Debug, Default)]
pub struct References {
    numbers: HashMap<String, usize>,
    targets: Vec<String>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `target`, assigning the next one on first sight
    pub fn number(&mut self, target: &str) -> usize {
        if let Some(&number) = self.numbers.get(target) {
            return number;
        }
        self.targets.push(target.to_string());
        let number = self.targets.len();
        self.numbers.insert(target.to_string(), number);
        log::debug!("Reference [{number}] -> {target}");
        number
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn render(&self) -> Vec<String> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, target)| format!("[{}] {}", i + 1, target))
            .collect()
    }

    /// Inline rendering of a hyperlink
    pub fn link(&mut self, text: &str, target: &str) -> String {
        let text = compact(text);
        let target = LinkTarget::classify(target);
        if target.needs_reference(&text) {
            if let LinkTarget::External(url) = &target {
                return format!("{text} [{}]", self.number(url));
            }
        }
        match target {
            LinkTarget::VimHome | LinkTarget::Local => text,
            LinkTarget::VimHelp(tag) => {
                if text.contains(&tag) {
                    text.replacen(&tag, &format!("|{tag}|"), 1)
                } else if text.is_empty() {
                    format!("|{tag}|")
                } else {
                    format!("{text} (see |{tag}|)")
                }
            }
            // Bare URLs and empty labels are shown as is
            LinkTarget::External(url) if text.is_empty() => url,
            LinkTarget::External(_) => text,
        }
    }

    /// Inline rendering of an image
    pub fn image(&mut self, alt: &str, src: &str) -> String {
        let alt = compact(alt);
        match LinkTarget::classify(src) {
            LinkTarget::External(url) => {
                let label = if alt.is_empty() { "(unlabeled image)" } else { alt.as_str() };
                format!("Image: {label} (see reference [{}])", self.number(&url))
            }
            _ if alt.is_empty() => "Image: (unlabeled image)".to_string(),
            _ => format!("Image: {alt}"),
        }
    }
}
