//! Lenient HTML reader built on quick-xml
//!
//! Real world HTML is not XML: void elements, unclosed paragraphs and stray
//! end tags are all accepted. The input is first read into a small element
//! tree which is then mapped onto [`DocumentNode`]s.

use std::borrow::Cow;
use std::mem;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::config::HtmlConfig;
use crate::error::ParseError;
use crate::node::{DocumentNode, Heading, List};
use crate::source::SourceDocument;
use crate::wrap::{compact, dedent};

const VOID_ELEMENTS: [&str; 9] = ["area", "br", "col", "hr", "img", "input", "link", "meta", "wbr"];
const SKIPPED_ELEMENTS: [&str; 6] = ["head", "noscript", "script", "style", "template", "title"];
const CONTAINER_ELEMENTS: [&str; 11] = [
    "#root", "article", "body", "center", "div", "footer", "header", "html", "main", "nav", "section",
];
/// Largest ordered list start, as in CommonMark
const MAX_LIST_START: u64 = 999_999_999;

static SELECTOR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z][A-Za-z0-9-]*|\*)?((?:[#.][A-Za-z0-9_-]+|\[[A-Za-z0-9_-]+(?:=[^\]]*)?\])*)$"#)
        .expect("valid selector regex")
});
static SELECTOR_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([#.])([A-Za-z0-9_-]+)|\[([A-Za-z0-9_-]+)(?:=["']?([^\]"']*)["']?)?\]"#)
        .expect("valid selector regex")
});

const INLINE_ELEMENTS: [&str; 21] = [
    "a", "abbr", "b", "br", "cite", "code", "del", "em", "i", "img", "ins", "kbd", "mark", "q", "s",
    "small", "span", "strong", "sub", "sup", "tt",
];

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Markup>,
}

#[derive(Debug)]
enum Markup {
    Element(Element),
    Text(String),
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        for child in &self.children {
            match child {
                Markup::Text(t) => text.push_str(t),
                Markup::Element(e) if e.name == "br" => text.push('\n'),
                Markup::Element(e) => e.collect_text(text),
            }
        }
    }

    /// First element in pre-order matching `predicate`, including `self`
    fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Markup::Element(e) => e.find(predicate),
            Markup::Text(_) => None,
        })
    }

    /// Copy of the element without its children
    fn head(&self) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Markup::Element(e) => Some(e),
            Markup::Text(_) => None,
        })
    }
}

/// One step of a selector: `name`, `#id`, `.class` and `[attr=value]` combined
#[derive(Debug, Default)]
struct Compound {
    name: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn parse(token: &str) -> Option<Self> {
        let caps = SELECTOR_TOKEN.captures(token)?;
        let mut compound = Compound {
            name: caps
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .filter(|name| name != "*"),
            ..Default::default()
        };
        let parts = caps.get(2).map_or("", |m| m.as_str());
        for part in SELECTOR_PART.captures_iter(parts) {
            match (part.get(1).map(|m| m.as_str()), part.get(2), part.get(3)) {
                (Some("#"), Some(id), _) => compound.id = Some(id.as_str().to_string()),
                (Some(_), Some(class), _) => compound.classes.push(class.as_str().to_string()),
                (_, _, Some(key)) => compound.attributes.push((
                    key.as_str().to_ascii_lowercase(),
                    part.get(4).map(|m| m.as_str().to_string()),
                )),
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, element: &Element) -> bool {
        self.name.as_ref().is_none_or(|name| *name == element.name)
            && self
                .id
                .as_deref()
                .is_none_or(|id| element.attribute("id") == Some(id))
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attributes.iter().all(|(key, value)| match value {
                Some(value) => element.attribute(key) == Some(value.as_str()),
                None => element.attribute(key).is_some(),
            })
    }
}

/// CSS style selector of elements to drop, steps separated by descendant combinators
#[derive(Debug)]
struct Selector(Vec<Compound>);

impl Selector {
    fn parse(selector: &str) -> Option<Self> {
        let steps = selector
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        (!steps.is_empty()).then_some(Selector(steps))
    }

    fn matches(&self, element: &Element, ancestors: &[Element]) -> bool {
        let Some((last, rest)) = self.0.split_last() else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }
        let mut remaining = rest.iter().rev().peekable();
        for ancestor in ancestors.iter().rev() {
            match remaining.peek() {
                Some(step) if step.matches(ancestor) => {
                    remaining.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        remaining.peek().is_none()
    }
}

/// Drop every element matched by one of `selectors`, together with its content
fn remove_ignored(element: &mut Element, selectors: &[Selector], ancestors: &mut Vec<Element>) {
    ancestors.push(element.head());
    element.children.retain(|child| match child {
        Markup::Element(e) => !selectors.iter().any(|s| s.matches(e, ancestors)),
        Markup::Text(_) => true,
    });
    for child in &mut element.children {
        if let Markup::Element(e) = child {
            remove_ignored(e, selectors, ancestors);
        }
    }
    ancestors.pop();
}

/// Parse HTML text into a document tree
///
/// Only the element whose id is `content_id` is converted when present,
/// otherwise the `<body>`, otherwise everything. Elements matched by the
/// `ignore` selectors are dropped once the title is known.
pub fn parse(text: &str, config: &HtmlConfig) -> Result<SourceDocument, ParseError> {
    let mut root = read_tree(&escape_stray_brackets(text))?;

    let title = root
        .find(&|e: &Element| e.name == "title")
        .or_else(|| root.find(&|e: &Element| e.name == "h1"))
        .map(|e| compact(&e.text()))
        .filter(|title| !title.is_empty());

    let selectors: Vec<Selector> = config
        .ignore
        .iter()
        .filter_map(|selector| {
            let parsed = Selector::parse(selector);
            if parsed.is_none() {
                log::warn!("Ignoring unsupported selector `{selector}`");
            }
            parsed
        })
        .collect();
    if !selectors.is_empty() {
        remove_ignored(&mut root, &selectors, &mut Vec::new());
    }

    let content = match root.find(&|e: &Element| e.attribute("id") == Some(config.content_id.as_str())) {
        Some(content) => content,
        None => {
            log::debug!("No element with id `{}`, converting the whole body", config.content_id);
            root.find(&|e: &Element| e.name == "body").unwrap_or(&root)
        }
    };

    let mut blocks = Vec::new();
    read_blocks(content, &mut blocks);
    Ok(SourceDocument {
        root: DocumentNode::Document(blocks),
        title,
    })
}

/// Escape each `<` that cannot start markup so it is read as text
fn escape_stray_brackets(text: &str) -> Cow<'_, str> {
    let stray = |i: usize| {
        !text[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };
    if !text.match_indices('<').any(|(i, _)| stray(i)) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for (i, _) in text.match_indices('<') {
        if stray(i) {
            escaped.push_str(&text[last..i]);
            escaped.push_str("&lt;");
            last = i + 1;
        }
    }
    escaped.push_str(&text[last..]);
    Cow::Owned(escaped)
}

fn read_tree(text: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack = vec![Element::new("#root")];
    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::Html(format!("{e} at byte {}", reader.error_position()))
        })?;
        match event {
            Event::Start(e) => {
                let element = start_element(&e);
                close_implied(&mut stack, &element.name);
                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    append(&mut stack, Markup::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(e) => append(&mut stack, Markup::Element(start_element(&e))),
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                match stack.iter().rposition(|open| open.name == name) {
                    Some(depth) if depth > 0 => {
                        while stack.len() > depth {
                            pop(&mut stack);
                        }
                    }
                    _ => log::debug!("Ignoring stray end tag </{name}>"),
                }
            }
            Event::Text(e) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append(&mut stack, Markup::Text(html_escape::decode_html_entities(&raw).into_owned()));
            }
            Event::CData(e) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append(&mut stack, Markup::Text(raw));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        pop(&mut stack);
    }
    stack
        .pop()
        .ok_or_else(|| ParseError::Html("empty element stack".into()))
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attributes = e
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            (key, html_escape::decode_html_entities(&value).into_owned())
        })
        .collect();
    Element {
        name,
        attributes,
        children: Vec::new(),
    }
}

/// Paragraphs and list items end where the next one starts
fn close_implied(stack: &mut Vec<Element>, name: &str) {
    let implied = match name {
        "p" | "ul" | "ol" | "pre" | "table" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5"
        | "h6" => "p",
        "li" => "li",
        "tr" => "tr",
        "td" | "th" => "td",
        _ => return,
    };
    let closes = |open: &str| open == implied || (implied == "td" && open == "th");
    if stack.last().is_some_and(|open| closes(&open.name)) {
        pop(stack);
    }
}

fn append(stack: &mut [Element], markup: Markup) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(markup);
    }
}

fn pop(stack: &mut Vec<Element>) {
    if stack.len() > 1 {
        if let Some(element) = stack.pop() {
            append(stack, Markup::Element(element));
        }
    }
}

fn is_inline(markup: &Markup) -> bool {
    match markup {
        Markup::Text(_) => true,
        Markup::Element(e) => INLINE_ELEMENTS.contains(&e.name.as_str()),
    }
}

/// Map the children of a block container, grouping loose inline content into paragraphs
fn read_blocks(container: &Element, blocks: &mut Vec<DocumentNode>) {
    let mut spans = Vec::new();
    for child in &container.children {
        if is_inline(child) {
            read_inline(child, &mut spans);
            continue;
        }
        flush_paragraph(&mut spans, blocks);
        if let Markup::Element(element) = child {
            read_block(element, blocks);
        }
    }
    flush_paragraph(&mut spans, blocks);
}

fn flush_paragraph(spans: &mut Vec<DocumentNode>, blocks: &mut Vec<DocumentNode>) {
    let has_text = spans.iter().any(|span| match span {
        DocumentNode::Text(text) => !text.trim().is_empty(),
        _ => true,
    });
    if has_text {
        blocks.push(DocumentNode::Paragraph(mem::take(spans)));
    } else {
        spans.clear();
    }
}

fn read_block(element: &Element, blocks: &mut Vec<DocumentNode>) {
    let name = element.name.as_str();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            let mut code = Vec::new();
            collect_code(element, &mut code);
            blocks.push(DocumentNode::Heading(
                Heading::new(level, compact(&element.text())).with_code(code),
            ));
        }
        "p" | "dt" | "dd" | "figcaption" => {
            let mut spans = Vec::new();
            for child in &element.children {
                read_inline(child, &mut spans);
            }
            flush_paragraph(&mut spans, blocks);
        }
        "pre" => blocks.push(DocumentNode::CodeBlock(dedent(&element.text()))),
        "ul" | "ol" => blocks.push(DocumentNode::List(read_list(element))),
        "blockquote" => {
            let mut children = Vec::new();
            read_blocks(element, &mut children);
            blocks.push(DocumentNode::BlockQuote(children));
        }
        "table" => {
            let mut rows = Vec::new();
            collect_rows(element, &mut rows);
            if !rows.is_empty() {
                blocks.push(DocumentNode::Table(rows));
            }
        }
        "hr" => {}
        _ if SKIPPED_ELEMENTS.contains(&name) => {}
        _ if CONTAINER_ELEMENTS.contains(&name) || name == "dl" || name == "figure" => {
            read_blocks(element, blocks)
        }
        _ => {
            log::warn!("No help file equivalent for <{name}>");
            blocks.push(DocumentNode::Unsupported(format!("<{name}>")));
        }
    }
}

fn read_list(element: &Element) -> List {
    let items = element
        .elements()
        .filter(|e| e.name == "li")
        .map(|item| {
            let mut blocks = Vec::new();
            read_blocks(item, &mut blocks);
            blocks
        })
        .collect();
    if element.name == "ol" {
        let start = element
            .attribute("start")
            .and_then(|start| start.trim().parse::<u64>().ok())
            .map_or(1, |start| start.min(MAX_LIST_START));
        List::ordered(start, items)
    } else {
        List::unordered(items)
    }
}

fn collect_rows(element: &Element, rows: &mut Vec<Vec<String>>) {
    for child in element.elements() {
        match child.name.as_str() {
            "tr" => rows.push(
                child
                    .elements()
                    .filter(|cell| cell.name == "td" || cell.name == "th")
                    .map(|cell| compact(&cell.text()))
                    .collect(),
            ),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn collect_code(element: &Element, code: &mut Vec<String>) {
    for child in element.elements() {
        if child.name == "code" || child.name == "tt" {
            code.push(compact(&child.text()));
        } else {
            collect_code(child, code);
        }
    }
}

fn read_inline(markup: &Markup, spans: &mut Vec<DocumentNode>) {
    let element = match markup {
        Markup::Text(text) => {
            spans.push(DocumentNode::Text(text.clone()));
            return;
        }
        Markup::Element(element) => element,
    };
    match element.name.as_str() {
        "a" => match element.attribute("href") {
            Some(href) => spans.push(DocumentNode::link(element.text(), href)),
            None => element.children.iter().for_each(|c| read_inline(c, spans)),
        },
        "code" | "tt" | "kbd" => spans.push(DocumentNode::Code(compact(&element.text()))),
        "img" => spans.push(DocumentNode::Image {
            alt: element.attribute("alt").unwrap_or_default().to_string(),
            src: element.attribute("src").unwrap_or_default().to_string(),
        }),
        "br" => spans.push(DocumentNode::Text(" ".into())),
        name if SKIPPED_ELEMENTS.contains(&name) => {}
        name => {
            if !INLINE_ELEMENTS.contains(&name) && !CONTAINER_ELEMENTS.contains(&name) {
                log::debug!("Flattening <{name}> inside a paragraph");
            }
            element.children.iter().for_each(|c| read_inline(c, spans));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blocks(html: &str) -> Vec<DocumentNode> {
        match parse(html, &HtmlConfig::default()).expect("html should parse").root {
            DocumentNode::Document(children) => children,
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let nodes = blocks("<h1>Intro</h1><p>Hello <em>there</em></p>");
        assert_eq!(
            nodes,
            vec![
                DocumentNode::heading(1, "Intro"),
                DocumentNode::Paragraph(vec![
                    DocumentNode::Text("Hello ".into()),
                    DocumentNode::Text("there".into()),
                ]),
            ]
        );
    }

    #[test]
    fn test_content_element_is_selected() {
        let html = r#"<html><head><title>Plugin</title></head><body>
            <div id="nav"><p>navigation</p></div>
            <div id="content"><h2>Usage</h2></div>
        </body></html>"#;
        let doc = parse(html, &HtmlConfig::default()).expect("html should parse");
        assert_eq!(doc.title.as_deref(), Some("Plugin"));
        assert_eq!(doc.root, DocumentNode::Document(vec![DocumentNode::heading(2, "Usage")]));
    }

    #[test]
    fn test_lenient_markup() {
        let nodes = blocks("<p>one<br>two<p>three</span>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], DocumentNode::paragraph("three"));
    }

    #[test]
    fn test_entities_are_decoded() {
        let nodes = blocks("<p>a &amp; b&nbsp;c</p>");
        assert_eq!(nodes, vec![DocumentNode::paragraph("a & b\u{a0}c")]);
    }

    #[test]
    fn test_lists() {
        let nodes = blocks(r#"<ol start="3"><li>three<li>four</ol>"#);
        assert_eq!(
            nodes,
            vec![DocumentNode::List(List::ordered(
                3,
                vec![vec![DocumentNode::paragraph("three")], vec![DocumentNode::paragraph("four")]]
            ))]
        );
    }

    #[test]
    fn test_pre_is_dedented() {
        let nodes = blocks("<pre>\n    let x = 1\n      echo x\n</pre>");
        assert_eq!(nodes, vec![DocumentNode::CodeBlock("let x = 1\n  echo x".into())]);
    }

    #[test]
    fn test_links_code_and_images() {
        let nodes = blocks(r#"<p><a href="https://example.org">site</a> <code>:Cmd</code> <img src="a.png" alt="shot"/></p>"#);
        let DocumentNode::Paragraph(spans) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert!(spans.contains(&DocumentNode::link("site", "https://example.org")));
        assert!(spans.contains(&DocumentNode::Code(":Cmd".into())));
        assert!(spans.contains(&DocumentNode::Image {
            alt: "shot".into(),
            src: "a.png".into()
        }));
    }

    #[test]
    fn test_heading_code_spans() {
        let nodes = blocks("<h3>The <code>:UpdateTags</code> command</h3>");
        let DocumentNode::Heading(heading) = &nodes[0] else {
            panic!("expected heading");
        };
        assert_eq!(heading.code, vec![":UpdateTags".to_string()]);
    }

    #[test]
    fn test_tables() {
        let nodes = blocks("<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1<td>2</tr></tbody></table>");
        assert_eq!(
            nodes,
            vec![DocumentNode::Table(vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["1".to_string(), "2".to_string()],
            ])]
        );
    }

    #[test]
    fn test_unknown_elements_are_unsupported() {
        let nodes = blocks("<iframe src=x></iframe>");
        assert_eq!(nodes, vec![DocumentNode::Unsupported("<iframe>".into())]);
    }

    #[test]
    fn test_list_start_is_clamped() {
        let nodes = blocks(r#"<ol start="18446744073709551615"><li>a</ol>"#);
        let DocumentNode::List(list) = &nodes[0] else {
            panic!("expected list");
        };
        assert_eq!(list.start, MAX_LIST_START);
    }

    #[test]
    fn test_pre_with_non_breaking_space() {
        let nodes = blocks("<pre>&nbsp;x\n y</pre>");
        assert_eq!(nodes, vec![DocumentNode::CodeBlock("\u{a0}x\n y".into())]);
    }

    #[test]
    fn test_stray_less_than_is_text() {
        assert_eq!(blocks("<p>if a < b then</p>"), vec![DocumentNode::paragraph("if a < b then")]);
        assert_eq!(blocks("<p>a <= b</p><p>after</p>").len(), 2);
        assert_eq!(blocks("<p>x <</p>"), vec![DocumentNode::paragraph("x <")]);
    }

    #[test]
    fn test_ignored_selectors_are_removed() {
        let html = r##"<div id="nav"><p>navigation</p></div>
            <h3><a class="anchor" href="#usage">#</a>Usage</h3>
            <p class="chrome note">edit this page</p>
            <p>See <a class="anchor" href="https://example.org">site</a></p>"##;
        let config = HtmlConfig {
            ignore: vec![
                "#nav".into(),
                "p.chrome".into(),
                "h3 a[class=anchor]".into(),
                "bad>selector".into(),
            ],
            ..HtmlConfig::default()
        };
        let DocumentNode::Document(nodes) = parse(html, &config).expect("html should parse").root
        else {
            panic!("expected document");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], DocumentNode::heading(3, "Usage"));
        let DocumentNode::Paragraph(spans) = &nodes[1] else {
            panic!("expected paragraph");
        };
        assert!(spans.contains(&DocumentNode::link("site", "https://example.org")));
    }

    #[test]
    fn test_selector_matching() {
        let mut outer = Element::new("div");
        outer.attributes.push(("class".into(), "wrapper main".into()));
        let mut link = Element::new("a");
        link.attributes.push(("name".into(), "top".into()));
        let ancestors = [outer.head(), Element::new("p")];

        let matches = |selector: &str| {
            Selector::parse(selector)
                .expect("selector should parse")
                .matches(&link, &ancestors)
        };
        assert!(matches("a"));
        assert!(matches("*[name]"));
        assert!(matches("div.main a[name='top']"));
        assert!(matches(".wrapper p a"));
        assert!(!matches("p div a"));
        assert!(!matches("a[name=bottom]"));
        assert!(Selector::parse("a > b").is_none());
    }

    #[test]
    fn test_scripts_are_skipped() {
        let nodes = blocks("<script>var x;</script><p>text</p>");
        assert_eq!(nodes, vec![DocumentNode::paragraph("text")]);
    }
}
