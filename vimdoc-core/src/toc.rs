//! Table of contents built from the headings of a document

use unicode_width::UnicodeWidthStr;

use crate::wrap::compact;

/// A line in the table of contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub anchor: String,
    pub text: String,
    pub level: u8,
    /// Position among the siblings under the same parent heading
    pub number: usize,
}

/// Ordered TOC entries plus the running heading stack used to number them
#[derive(Debug, Default)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
    counters: Vec<usize>,
}

impl TableOfContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heading; `level` starts at 1
    pub fn push(&mut self, level: u8, text: &str, anchor: &str) -> &TocEntry {
        let depth = usize::from(level.max(1));

        // Forget counters of deeper sections, open missing levels at 1
        self.counters.truncate(depth);
        while self.counters.len() < depth {
            self.counters.push(1);
        }
        let number = self.counters[depth - 1];
        self.counters[depth - 1] += 1;

        self.entries.push(TocEntry {
            anchor: anchor.to_string(),
            text: compact(text),
            level,
            number,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render one line per entry with the `|anchor|` reference right aligned
    pub fn render(&self, width: usize) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                let text = format!(
                    "{}{}. {}",
                    " ".repeat(usize::from(entry.level)),
                    entry.number,
                    entry.text
                );
                let reference = format!("|{}|", entry.anchor);
                let padding = width
                    .saturating_sub(text.width() + reference.width())
                    .max(1);
                format!("{text}{}{reference}", " ".repeat(padding))
            })
            .collect()
    }
}
