//! Front matter detection helpers.

use std::fmt;

/// Types of front matter markers that vimdoc recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterKind {
    Yaml,
    Toml,
}

impl FrontMatterKind {
    fn as_str(&self) -> &'static str {
        match self {
            FrontMatterKind::Yaml => "yaml",
            FrontMatterKind::Toml => "toml",
        }
    }
}

impl fmt::Display for FrontMatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A front matter block found at the top of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub kind: FrontMatterKind,
    pub end_line: usize,
    /// Text between the markers
    pub raw: String,
}

impl FrontMatter {
    /// The `title` key, if the block parses and defines one
    pub fn title(&self) -> Option<String> {
        let title = match self.kind {
            FrontMatterKind::Yaml => serde_yaml::from_str::<serde_yaml::Value>(&self.raw)
                .ok()?
                .get("title")?
                .as_str()?
                .to_string(),
            FrontMatterKind::Toml => toml::from_str::<toml::Table>(&self.raw)
                .ok()?
                .get("title")?
                .as_str()?
                .to_string(),
        };
        Some(title)
    }
}

struct FrontMatterMarker {
    kind: FrontMatterKind,
    start: &'static str,
    end: &'static str,
}

const FRONT_MATTER_MARKERS: [FrontMatterMarker; 2] = [
    FrontMatterMarker {
        kind: FrontMatterKind::Yaml,
        start: "---",
        end: "---",
    },
    FrontMatterMarker {
        kind: FrontMatterKind::Toml,
        start: "+++",
        end: "+++",
    },
];

/// Splits a leading front matter block off `text`, returning it and the rest.
pub fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first_line) = lines.next() else {
        return (None, text);
    };

    let Some(marker) = FRONT_MATTER_MARKERS
        .iter()
        .find(|marker| normalize_line(first_line) == marker.start)
    else {
        return (None, text);
    };

    let mut offset = first_line.len();
    let mut raw = String::new();
    for (idx, line) in lines.enumerate() {
        offset += line.len();
        if normalize_line(line) == marker.end {
            let front_matter = FrontMatter {
                kind: marker.kind,
                end_line: idx + 1,
                raw,
            };
            return (Some(front_matter), &text[offset..]);
        }
        raw.push_str(line);
    }

    (None, text)
}

fn normalize_line(line: &str) -> &str {
    line.trim().trim_start_matches('\u{feff}')
}
