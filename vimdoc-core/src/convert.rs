//! Conversion of a document tree into Vim help file text
//!
//! The tree is rendered in a single pre-order traversal. Everything the
//! traversal needs to remember (handed out tags, the table of contents,
//! numbered references) lives in a [`Context`] that is threaded through the
//! recursive render calls and dropped when the conversion finishes.

use unicode_width::UnicodeWidthStr;

use crate::anchor::{self, AnchorRegistry};
use crate::config::{AnchorConfig, Config, ConvertConfig};
use crate::error::ParseError;
use crate::node::{DocumentNode, Heading, List};
use crate::refs::References;
use crate::table;
use crate::toc::TableOfContents;
use crate::wrap::{compact, right_align, wrap};

const CONTENTS: &str = "Contents";
const REFERENCES: &str = "References";

/// Converts document trees into help files
#[derive(Debug, Clone, Default)]
pub struct DocConverter {
    config: ConvertConfig,
    anchors: AnchorConfig,
    filename: Option<String>,
    title: Option<String>,
}

impl DocConverter {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.convert.clone(),
            anchors: config.anchors.clone(),
            filename: None,
            title: None,
        }
    }

    /// Name of the generated help file, defines the first tag and the tag prefix
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into()).filter(|f: &String| !f.is_empty());
        self
    }

    /// Title shown on the first line, defaults to the first heading
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(compact(&title.into())).filter(|t| !t.is_empty());
        self
    }

    /// Override the compaction threshold for lists
    pub fn with_compact_threshold(mut self, threshold: usize) -> Self {
        self.config.compact_threshold = threshold;
        self
    }

    /// Render `document` as a help file
    pub fn convert(&self, document: &DocumentNode) -> Result<String, ParseError> {
        let children = match document {
            DocumentNode::Document(children) => children.as_slice(),
            node => std::slice::from_ref(node),
        };

        let headings = document.headings();
        let min_level = headings.iter().map(|h| h.level).min().unwrap_or(1);
        if let Some(bad) = headings.iter().find(|h| !(1..=6).contains(&h.level)) {
            return Err(ParseError::malformed(format!(
                "heading `{}` has level {}, expected 1 to 6",
                bad.text, bad.level
            )));
        }

        let prefix = self
            .filename
            .as_deref()
            .map(anchor::prefix_for)
            .unwrap_or_default();
        let mut anchors = AnchorRegistry::new(prefix, &self.anchors);
        if let Some(filename) = &self.filename {
            anchors.reserve(filename.as_str());
        }
        let mut ctx = Context {
            config: &self.config,
            anchors,
            toc: TableOfContents::new(),
            refs: References::new(),
            level_shift: min_level.saturating_sub(1),
        };
        log::debug!(
            "Converting {} headings, shifting levels by {}",
            headings.len(),
            ctx.level_shift
        );

        let body = ctx.render_blocks(children, 0)?;
        let references = if ctx.refs.is_empty() {
            None
        } else {
            let heading = Heading::new(1 + ctx.level_shift, REFERENCES);
            Some(format!(
                "{}\n\n{}",
                ctx.render_heading(&heading, 0)?,
                ctx.refs.render().join("\n")
            ))
        };

        let mut output = Vec::new();
        if let Some(first_line) = self.first_line(&headings) {
            output.push(first_line);
        }
        if self.config.toc && !ctx.toc.is_empty() {
            output.push(format!(
                "{}\n{CONTENTS} ~\n\n{}",
                "=".repeat(self.config.text_width),
                ctx.toc.render(self.config.text_width).join("\n")
            ));
        }
        output.extend(body.into_iter().map(|block| block.text));
        output.extend(references);
        if !self.config.modeline.trim().is_empty() {
            output.push(self.config.modeline.clone());
        }

        let mut text = output.join("\n\n");
        text.push('\n');
        Ok(text)
    }

    fn first_line(&self, headings: &[&Heading]) -> Option<String> {
        match (&self.filename, &self.title) {
            (Some(filename), title) => {
                let title = title
                    .clone()
                    .or_else(|| headings.first().map(|h| compact(&h.text)));
                Some(match title {
                    Some(title) => format!("*{filename}*  {title}"),
                    None => format!("*{filename}*"),
                })
            }
            (None, title) => title.clone(),
        }
    }
}

/// A rendered block and whether it came from a list
struct Block {
    text: String,
    list: bool,
}

impl Block {
    fn text(text: String) -> Self {
        Self { text, list: false }
    }
}

/// Traversal state of a single conversion
struct Context<'a> {
    config: &'a ConvertConfig,
    anchors: AnchorRegistry,
    toc: TableOfContents,
    refs: References,
    level_shift: u8,
}

impl Context<'_> {
    fn render_blocks(&mut self, nodes: &[DocumentNode], indent: usize) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();
        let mut inline_run: Vec<&DocumentNode> = Vec::new();

        for node in nodes {
            if !node.is_inline() && !inline_run.is_empty() {
                blocks.extend(self.render_paragraph(&inline_run, indent)?);
                inline_run.clear();
            }

            let block = match node {
                DocumentNode::Text(_)
                | DocumentNode::Code(_)
                | DocumentNode::Link { .. }
                | DocumentNode::Image { .. } => {
                    inline_run.push(node);
                    continue;
                }
                DocumentNode::Document(_) => {
                    return Err(ParseError::malformed("document nested inside another node"))
                }
                DocumentNode::Heading(heading) => Some(Block::text(self.render_heading(heading, indent)?)),
                DocumentNode::Paragraph(spans) => {
                    let spans: Vec<&DocumentNode> = spans.iter().collect();
                    self.render_paragraph(&spans, indent)?
                }
                DocumentNode::List(list) => Some(Block {
                    text: self.render_list(list, indent)?,
                    list: true,
                }),
                DocumentNode::CodeBlock(code) => Some(Block::text(self.render_code(code, indent))),
                DocumentNode::BlockQuote(children) => {
                    let inner = self.render_blocks(children, indent + self.config.shift_width)?;
                    Some(Block::text(join_blocks(inner)))
                }
                DocumentNode::Table(rows) => {
                    let lines = table::render(rows, self.config.text_width, indent);
                    Some(Block::text(lines.join("\n")))
                }
                DocumentNode::Unsupported(kind) => return Err(ParseError::unsupported(kind.as_str())),
            };
            blocks.extend(block.filter(|b| !b.text.trim().is_empty()));
        }

        if !inline_run.is_empty() {
            blocks.extend(self.render_paragraph(&inline_run, indent)?);
        }
        Ok(blocks)
    }

    fn render_heading(&mut self, heading: &Heading, indent: usize) -> Result<String, ParseError> {
        let text = compact(&heading.text);
        if text.is_empty() {
            return Err(ParseError::malformed("heading without text"));
        }
        let level = heading.level - self.level_shift;
        let tag = self.anchors.assign(heading)?;
        self.toc.push(level, &text, &tag);

        let width = self.config.text_width;
        let marker = if level == 1 { "=" } else { "-" };
        let prefix = " ".repeat(indent);
        let rule = format!("{prefix}{}", marker.repeat(width.saturating_sub(indent)));
        let mut lines = vec![rule, right_align(&format!("*{tag}*"), width)];

        let wrapped = wrap(&text, width.saturating_sub(2), &prefix, &prefix);
        lines.extend(wrapped.into_iter().map(|line| format!("{line} ~")));
        Ok(lines.join("\n"))
    }

    fn render_paragraph(&mut self, spans: &[&DocumentNode], indent: usize) -> Result<Option<Block>, ParseError> {
        let text = self.render_inline(spans)?;
        let prefix = " ".repeat(indent);
        let lines = wrap(&text, self.config.text_width, &prefix, &prefix);
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(Block::text(lines.join("\n"))))
    }

    fn render_inline(&mut self, spans: &[&DocumentNode]) -> Result<String, ParseError> {
        let mut text = String::new();
        for span in spans {
            match span {
                DocumentNode::Text(t) => text.push_str(t),
                DocumentNode::Code(code) => {
                    if code.contains(|c: char| c == '`' || c.is_whitespace()) {
                        text.push_str(code);
                    } else {
                        text.push('`');
                        text.push_str(code);
                        text.push('`');
                    }
                }
                DocumentNode::Link { text: label, target } => text.push_str(&self.refs.link(label, target)),
                DocumentNode::Image { alt, src } => text.push_str(&self.refs.image(alt, src)),
                DocumentNode::Unsupported(kind) => return Err(ParseError::unsupported(kind.as_str())),
                other => {
                    return Err(ParseError::malformed(format!(
                        "{} inside a paragraph",
                        other.kind()
                    )))
                }
            }
        }
        Ok(compact(&text))
    }

    fn render_code(&self, code: &str, indent: usize) -> String {
        let prefix = " ".repeat(indent + self.config.code_indent);
        let mut lines = vec![">".to_string()];
        lines.extend(code.trim_end_matches('\n').lines().map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{}", line.trim_end())
            }
        }));
        lines.push("<".to_string());
        lines.join("\n")
    }

    fn render_list(&mut self, list: &List, indent: usize) -> Result<String, ParseError> {
        let mut items = Vec::with_capacity(list.items.len());
        for (i, item) in list.items.iter().enumerate() {
            let bullet = if list.ordered {
                format!("{}. ", list.start.saturating_add(i as u64))
            } else {
                "- ".to_string()
            };
            items.push(self.render_item(item, indent, &bullet)?);
        }
        if items.is_empty() {
            return Ok(String::new());
        }

        // Decide once for the whole list
        let line_counts: Vec<usize> = items.iter().map(|item| item.lines().count()).collect();
        let longest = line_counts.iter().copied().max().unwrap_or(0);
        let average = line_counts.iter().sum::<usize>() as f64 / line_counts.len() as f64;
        let compacted = longest <= self.config.compact_threshold;
        log::debug!(
            "List of {} items averages {average:.1} lines (longest {longest}), {}",
            items.len(),
            if compacted { "compacting" } else { "expanding" }
        );

        Ok(items.join(if compacted { "\n" } else { "\n\n" }))
    }

    fn render_item(&mut self, item: &[DocumentNode], indent: usize, bullet: &str) -> Result<String, ParseError> {
        let child_indent = indent + bullet.width();
        let blocks = self.render_blocks(item, child_indent)?;

        let mut text = String::new();
        let mut previous: Option<&Block> = None;
        for block in &blocks {
            if let Some(prev) = previous {
                // A nested list hugs the line that introduces it
                text.push_str(if block.list && !prev.list { "\n" } else { "\n\n" });
            }
            text.push_str(&block.text);
            previous = Some(block);
        }

        let marker = format!("{}{bullet}", " ".repeat(indent));
        Ok(format!("{}{}", marker, text.trim_start()).trim_end().to_string())
    }
}

fn join_blocks(blocks: Vec<Block>) -> String {
    blocks
        .into_iter()
        .map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
