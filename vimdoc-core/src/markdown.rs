//! Markdown reader built on pulldown-cmark

use std::mem;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::front_matter::split_front_matter;
use crate::node::{DocumentNode, Heading, List};
use crate::source::SourceDocument;

/// Parse Markdown text into a document tree
///
/// Front matter is removed; its `title` key becomes the document title.
pub fn parse(text: &str) -> SourceDocument {
    let text = text.replace("\r\n", "\n");
    let (front_matter, body) = split_front_matter(&text);
    if let Some(fm) = &front_matter {
        log::debug!("Skipping {} front matter ({} lines)", fm.kind, fm.end_line + 1);
    }

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(body, options) {
        builder.event(event);
    }

    SourceDocument {
        root: builder.finish(),
        title: front_matter.and_then(|fm| fm.title()),
    }
}

/// Open element while walking the event stream
enum Frame {
    Root(Vec<DocumentNode>),
    BlockQuote(Vec<DocumentNode>),
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<DocumentNode>>,
    },
    /// Tight list items carry their text without a paragraph
    Item {
        blocks: Vec<DocumentNode>,
        spans: Vec<DocumentNode>,
    },
    Paragraph(Vec<DocumentNode>),
    Heading {
        level: u8,
        text: String,
        code: Vec<String>,
    },
    Link {
        target: String,
        text: String,
    },
    Image {
        src: String,
        alt: String,
    },
    CodeBlock(String),
    HtmlBlock(String),
    Table {
        rows: Vec<Vec<String>>,
        row: Vec<String>,
        cell: String,
    },
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Root(Vec::new())],
        }
    }

    fn finish(mut self) -> DocumentNode {
        while self.stack.len() > 1 {
            log::warn!("Unclosed element at end of Markdown input");
            self.stack.pop();
        }
        match self.stack.pop() {
            Some(Frame::Root(children)) => DocumentNode::Document(children),
            _ => DocumentNode::Document(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::CodeBlock(code)) => code.push_str(&text),
                Some(Frame::HtmlBlock(html)) => html.push_str(&text),
                _ => self.push_span(DocumentNode::Text(text.into_string())),
            },
            Event::Code(code) => self.push_span(DocumentNode::Code(code.into_string())),
            Event::SoftBreak | Event::HardBreak => self.push_span(DocumentNode::Text(" ".into())),
            Event::Html(html) => {
                if let Some(Frame::HtmlBlock(block)) = self.stack.last_mut() {
                    block.push_str(&html);
                }
            }
            // Inline tags have no help file equivalent, their text is kept
            Event::InlineHtml(_) => {}
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(DocumentNode::Text(marker.into()));
            }
            Event::FootnoteReference(label) => self.push_span(DocumentNode::Text(format!("[{label}]"))),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                level: level as u8,
                text: String::new(),
                code: Vec::new(),
            },
            Tag::BlockQuote { .. } => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(_) => Frame::CodeBlock(String::new()),
            Tag::HtmlBlock => Frame::HtmlBlock(String::new()),
            Tag::List(start) => Frame::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                blocks: Vec::new(),
                spans: Vec::new(),
            },
            Tag::Table(_) => Frame::Table {
                rows: Vec::new(),
                row: Vec::new(),
                cell: String::new(),
            },
            Tag::Link { dest_url, .. } => Frame::Link {
                target: dest_url.into_string(),
                text: String::new(),
            },
            Tag::Image { dest_url, .. } => Frame::Image {
                src: dest_url.into_string(),
                alt: String::new(),
            },
            // Table rows and cells reuse the table frame, emphasis is dropped
            _ => return,
        };
        self.stack.push(frame);
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::TableCell => {
                if let Some(Frame::Table { row, cell, .. }) = self.stack.last_mut() {
                    row.push(mem::take(cell));
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(Frame::Table { rows, row, .. }) = self.stack.last_mut() {
                    rows.push(mem::take(row));
                }
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote { .. }
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Table
            | TagEnd::Link
            | TagEnd::Image => {
                if let Some(frame) = self.stack.pop() {
                    self.close(frame);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, frame: Frame) {
        match frame {
            Frame::Paragraph(spans) => {
                if !spans.is_empty() {
                    self.push_block(DocumentNode::Paragraph(spans));
                }
            }
            Frame::Heading { level, text, code } => {
                self.push_block(DocumentNode::Heading(Heading { level, text, code }));
            }
            Frame::BlockQuote(children) => self.push_block(DocumentNode::BlockQuote(children)),
            Frame::CodeBlock(code) => self.push_block(DocumentNode::CodeBlock(code)),
            Frame::HtmlBlock(html) => {
                if !strip_html(&html).trim().is_empty() {
                    self.push_block(DocumentNode::Unsupported("raw HTML block".into()));
                }
            }
            Frame::List { ordered, start, items } => {
                let list = if ordered {
                    List::ordered(start, items)
                } else {
                    List::unordered(items)
                };
                self.push_block(DocumentNode::List(list));
            }
            Frame::Item { mut blocks, spans } => {
                if !spans.is_empty() {
                    blocks.push(DocumentNode::Paragraph(spans));
                }
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(blocks);
                }
            }
            Frame::Table { rows, .. } => self.push_block(DocumentNode::Table(rows)),
            Frame::Link { target, text } => self.push_span(DocumentNode::Link { text, target }),
            Frame::Image { src, alt } => self.push_span(DocumentNode::Image { alt, src }),
            Frame::Root(children) => self.stack.push(Frame::Root(children)),
        }
    }

    /// Add a block level node to the innermost container
    fn push_block(&mut self, node: DocumentNode) {
        match self.stack.last_mut() {
            Some(Frame::Root(children)) | Some(Frame::BlockQuote(children)) => children.push(node),
            Some(Frame::Item { blocks, spans }) => {
                if !spans.is_empty() {
                    blocks.push(DocumentNode::Paragraph(mem::take(spans)));
                }
                blocks.push(node);
            }
            _ => log::warn!("Dropping {} outside of a block container", node.kind()),
        }
    }

    /// Add an inline node to the innermost element collecting text
    fn push_span(&mut self, node: DocumentNode) {
        match self.stack.last_mut() {
            Some(Frame::Paragraph(spans)) | Some(Frame::Item { spans, .. }) => spans.push(node),
            Some(Frame::Root(children)) | Some(Frame::BlockQuote(children)) => children.push(node),
            Some(Frame::Heading { text, code, .. }) => {
                if let DocumentNode::Code(c) = &node {
                    code.push(c.clone());
                }
                text.push_str(span_text(&node));
            }
            Some(Frame::Link { text, .. }) => text.push_str(span_text(&node)),
            Some(Frame::Image { alt, .. }) => alt.push_str(span_text(&node)),
            Some(Frame::Table { cell, .. }) => cell.push_str(span_text(&node)),
            Some(Frame::CodeBlock(code)) => code.push_str(span_text(&node)),
            Some(Frame::HtmlBlock(_)) | Some(Frame::List { .. }) | None => {}
        }
    }
}

fn span_text(node: &DocumentNode) -> &str {
    match node {
        DocumentNode::Text(text) | DocumentNode::Code(text) => text,
        DocumentNode::Link { text, .. } => text,
        DocumentNode::Image { alt, .. } => alt,
        _ => "",
    }
}

/// Text of an HTML fragment with comments and tags removed
fn strip_html(html: &str) -> String {
    let mut text = String::new();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let close = if rest[start..].starts_with("<!--") { "-->" } else { ">" };
        match rest[start..].find(close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    text.push_str(rest);
    text
}
