//! Integration tests for vimdoc-core
//!
//! These tests exercise the full flow end-to-end: loading a document from
//! disk, converting it to a help file and regenerating embedded script
//! documentation.

use pretty_assertions::assert_eq;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io::Write as _;
use tempfile::NamedTempFile;
use vimdoc_core::{vimscript, Config, DocConverter, SourceDocument};

/// Helper to load a document with known content
/// Returns (SourceDocument, NamedTempFile) - keep the file alive for the duration of the test
fn create_test_doc(content: &str, suffix: &str) -> (SourceDocument, NamedTempFile) {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write test content");
    file.flush().expect("Failed to flush");

    let doc = SourceDocument::load(file.path(), &Config::default())
        .expect("Failed to load test document");
    (doc, file)
}

fn convert_markdown(content: &str) -> String {
    let (doc, _file) = create_test_doc(content, ".md");
    DocConverter::new(&Config::default())
        .convert(&doc.root)
        .expect("Conversion failed")
}

/// Tags defined in a help file, in order of appearance
fn defined_tags(help: &str) -> Vec<String> {
    let re = Regex::new(r"\*([^*\s]+)\*$").unwrap();
    help.lines()
        .filter_map(|line| re.captures(line).map(|c| c[1].to_string()))
        .collect()
}

/// Tags referenced from the table of contents, in order
fn toc_tags(help: &str) -> Vec<String> {
    let re = Regex::new(r"^ +\d+\. .*\|([^|]+)\|$").unwrap();
    help.lines()
        .filter_map(|line| re.captures(line).map(|c| c[1].to_string()))
        .collect()
}

#[test]
fn integration_minimal_document() {
    let help = convert_markdown("# Title\n\nSome text\n\n- a\n- b");

    assert_eq!(defined_tags(&help), vec!["title"]);
    assert_eq!(toc_tags(&help), vec!["title"]);
    assert!(help.contains("Title ~\n\nSome text\n\n- a\n- b\n\nvim: ft=help\n"), "{help}");
}

#[test]
fn integration_anchors_are_unique() {
    let content = "# Usage\n\n## Options\n\n### Options\n\n## Usage\n\n## Options\n";
    let help = convert_markdown(content);

    let tags = defined_tags(&help);
    assert_eq!(tags.len(), 5);
    let unique: HashSet<&String> = tags.iter().collect();
    assert_eq!(unique.len(), tags.len(), "duplicate tags in {tags:?}");
}

#[test]
fn integration_toc_follows_body_order() {
    let content = "# Intro\n\n## Install\n\n## Usage\n\n### Commands\n\n# Contact\n";
    let help = convert_markdown(content);

    assert_eq!(toc_tags(&help), defined_tags(&help));
    assert!(help.contains(" 1. Intro"));
    assert!(help.contains("  1. Install"));
    assert!(help.contains("  2. Usage"));
    assert!(help.contains("   1. Commands"));
    assert!(help.contains(" 2. Contact"));
}

#[test]
fn integration_nested_lists() {
    let content = "- parent\n  - child\n    - grandchild\n- sibling\n";
    let help = convert_markdown(content);

    assert!(
        help.contains("- parent\n  - child\n    - grandchild\n\n- sibling"),
        "{help}"
    );
}

#[test]
fn integration_long_items_expand_list() {
    let long = "word ".repeat(40);
    let content = format!("- short\n- {long}\n");
    let help = convert_markdown(&content);

    assert!(help.contains("- short\n\n- word"), "{help}");
}

#[test]
fn integration_conversion_is_idempotent() {
    let content = "# A\n\nText with [a link](https://example.org).\n\n## A\n\n1. one\n2. two\n";
    let (doc, _file) = create_test_doc(content, ".md");
    let converter = DocConverter::new(&Config::default()).with_filename("plugin.txt");

    let first = converter.convert(&doc.root).unwrap();
    let second = converter.convert(&doc.root).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("*plugin.txt*  A\n"));
    assert!(first.contains("[1] https://example.org"));
}

#[test]
fn integration_front_matter_title() {
    let content = "---\ntitle: Miscellaneous auto-load scripts\n---\n# Installation\n";
    let (doc, _file) = create_test_doc(content, ".md");
    let title = doc.title.clone().expect("front matter title");
    let help = DocConverter::new(&Config::default())
        .with_filename("misc.txt")
        .with_title(title)
        .convert(&doc.root)
        .unwrap();

    assert!(help.starts_with("*misc.txt*  Miscellaneous auto-load scripts\n"));
    assert!(help.contains("*misc-installation*"));
}

#[test]
fn integration_html_document() {
    let content = r#"<html><head><title>Plugin</title></head><body>
        <div id="content">
          <h1>Plugin</h1>
          <p>Install the <code>plugin</code> directory.</p>
          <ul><li>one</li><li>two</li></ul>
        </div>
    </body></html>"#;
    let (doc, _file) = create_test_doc(content, ".html");
    let help = DocConverter::new(&Config::default()).convert(&doc.root).unwrap();

    assert_eq!(defined_tags(&help), vec!["plugin"]);
    assert!(help.contains("Install the `plugin` directory."));
    assert!(help.contains("- one\n- two"));
}

#[test]
fn integration_unsupported_markup_fails() {
    let (doc, _file) = create_test_doc("# Title\n\n<div>\nraw\n</div>\n", ".md");
    let err = DocConverter::new(&Config::default())
        .convert(&doc.root)
        .unwrap_err();
    assert!(err.to_string().contains("raw HTML block"));
}

#[test]
fn integration_extract_documentation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("autoload/misc")).unwrap();
    fs::write(
        dir.path().join("autoload/misc/str.vim"),
        "\" String handling.\n\nfunction! misc#str#compact(s)\n  \" Compact whitespace in a string.\n  return a:s\nendfunction\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("autoload/misc/Buffer.vim"),
        "\" Buffer helpers.\n\nfunction! s:helper()\nendfunction\n",
    )
    .unwrap();

    let readme = dir.path().join("README.md");
    fs::write(
        &readme,
        format!(
            "# misc\n\n{}\n{}\n",
            vimscript::START_MARKER,
            vimscript::END_MARKER
        ),
    )
    .unwrap();

    let updated = vimscript::update_markdown(&readme, 2, "April 2, 2015 at 10:00").unwrap();
    assert!(updated);
    let text = fs::read_to_string(&readme).unwrap();
    assert!(text.contains("extracted from 1 Vim scripts on"));
    assert!(text.contains("April 2, 2015 at 10:00."));
    assert!(text.contains("## String handling\n\n### The `misc#str#compact()` function\n\nCompact whitespace in a string."));
    assert!(!text.contains("Buffer helpers"));

    // Only the timestamp differs, the file stays untouched
    let updated = vimscript::update_markdown(&readme, 2, "May 3, 2016 at 11:11").unwrap();
    assert!(!updated);
    assert_eq!(fs::read_to_string(&readme).unwrap(), text);
}

#[test]
fn integration_extract_without_markers() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let readme = dir.path().join("README.md");
    fs::write(&readme, "# No markers here\n").unwrap();

    assert!(!vimscript::update_markdown(&readme, 1, "April 2, 2015 at 10:00").unwrap());
    assert_eq!(fs::read_to_string(&readme).unwrap(), "# No markers here\n");
}
