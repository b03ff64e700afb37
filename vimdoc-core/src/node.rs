//! Document tree produced by the Markdown and HTML readers

/// A heading in the source document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Inline code spans found in the heading, in order of appearance
    pub code: Vec<String>,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            code: Vec::new(),
        }
    }

    /// Attach the inline code spans of the heading
    pub fn with_code(mut self, code: Vec<String>) -> Self {
        self.code = code;
        self
    }
}

/// An ordered or unordered list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list
    pub start: u64,
    pub items: Vec<Vec<DocumentNode>>,
}

impl List {
    pub fn unordered(items: Vec<Vec<DocumentNode>>) -> Self {
        Self {
            ordered: false,
            start: 1,
            items,
        }
    }

    pub fn ordered(start: u64, items: Vec<Vec<DocumentNode>>) -> Self {
        Self {
            ordered: true,
            start,
            items,
        }
    }
}

/// Node of the document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentNode {
    /// Root container
    Document(Vec<DocumentNode>),
    Heading(Heading),
    /// Paragraph of inline spans
    Paragraph(Vec<DocumentNode>),
    List(List),
    CodeBlock(String),
    BlockQuote(Vec<DocumentNode>),
    /// Rows of cell text, first row is the header
    Table(Vec<Vec<String>>),
    Text(String),
    Code(String),
    Link { text: String, target: String },
    Image { alt: String, src: String },
    /// Structure a reader could not map, named by its source kind
    Unsupported(String),
}

impl DocumentNode {
    /// Convenience constructor for a paragraph holding a single text span
    pub fn paragraph(text: impl Into<String>) -> Self {
        DocumentNode::Paragraph(vec![DocumentNode::Text(text.into())])
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        DocumentNode::Heading(Heading::new(level, text))
    }

    pub fn link(text: impl Into<String>, target: impl Into<String>) -> Self {
        DocumentNode::Link {
            text: text.into(),
            target: target.into(),
        }
    }

    /// Whether the node is an inline span
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            DocumentNode::Text(_)
                | DocumentNode::Code(_)
                | DocumentNode::Link { .. }
                | DocumentNode::Image { .. }
        )
    }

    /// Name of the node kind, used in diagnostics
    pub fn kind(&self) -> &str {
        match self {
            DocumentNode::Document(_) => "document",
            DocumentNode::Heading(_) => "heading",
            DocumentNode::Paragraph(_) => "paragraph",
            DocumentNode::List(_) => "list",
            DocumentNode::CodeBlock(_) => "code block",
            DocumentNode::BlockQuote(_) => "block quote",
            DocumentNode::Table(_) => "table",
            DocumentNode::Text(_) => "text",
            DocumentNode::Code(_) => "code",
            DocumentNode::Link { .. } => "link",
            DocumentNode::Image { .. } => "image",
            DocumentNode::Unsupported(kind) => kind,
        }
    }

    /// Child nodes in document order
    pub fn children(&self) -> Box<dyn Iterator<Item = &DocumentNode> + '_> {
        match self {
            DocumentNode::Document(children)
            | DocumentNode::Paragraph(children)
            | DocumentNode::BlockQuote(children) => Box::new(children.iter()),
            DocumentNode::List(list) => Box::new(list.items.iter().flatten()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Pre-order walk over this node and all of its descendants
    pub fn walk(&self) -> Vec<&DocumentNode> {
        let mut nodes = Vec::new();
        self.collect_pre_order(&mut nodes);
        nodes
    }

    fn collect_pre_order<'a>(&'a self, nodes: &mut Vec<&'a DocumentNode>) {
        nodes.push(self);
        for child in self.children() {
            child.collect_pre_order(nodes);
        }
    }

    /// Headings in pre-order
    pub fn headings(&self) -> Vec<&Heading> {
        self.walk()
            .into_iter()
            .filter_map(|node| match node {
                DocumentNode::Heading(heading) => Some(heading),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentNode {
        DocumentNode::Document(vec![
            DocumentNode::heading(1, "Intro"),
            DocumentNode::List(List::unordered(vec![
                vec![DocumentNode::paragraph("a")],
                vec![
                    DocumentNode::paragraph("b"),
                    DocumentNode::heading(3, "Nested"),
                ],
            ])),
            DocumentNode::heading(2, "Usage"),
        ])
    }

    #[test]
    fn test_headings_in_pre_order() {
        let doc = sample();
        let texts: Vec<&str> = doc.headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Nested", "Usage"]);
    }

    #[test]
    fn test_walk_includes_root() {
        let doc = sample();
        let nodes = doc.walk();
        assert_eq!(nodes[0].kind(), "document");
        assert_eq!(nodes.len(), 9);
    }

    #[test]
    fn test_inline_kinds() {
        assert!(DocumentNode::Text("x".into()).is_inline());
        assert!(DocumentNode::link("x", "y").is_inline());
        assert!(!DocumentNode::paragraph("x").is_inline());
        assert!(!DocumentNode::CodeBlock("x".into()).is_inline());
    }

    #[test]
    fn test_unsupported_kind_is_reported() {
        let node = DocumentNode::Unsupported("iframe".into());
        assert_eq!(node.kind(), "iframe");
    }
}
