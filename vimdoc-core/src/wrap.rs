//! Whitespace compaction and hard wrapping of help file text

use unicode_width::UnicodeWidthStr;

/// Collapse runs of whitespace into single spaces, trimming both ends
pub fn compact(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Display width as seen in the help buffer; `|` markers are concealed by Vim
pub fn display_width(text: &str) -> usize {
    text.width() - text.matches('|').count()
}

/// Hard wrap `text` to `width` columns
///
/// The first line starts with `initial`, continuation lines with `subsequent`.
/// Words wider than the available space get a line of their own.
pub fn wrap(text: &str, width: usize, initial: &str, subsequent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::from(initial);
    let mut line_width = display_width(initial);
    let mut empty = true;

    for word in text.split_whitespace() {
        let word_width = display_width(word);
        if !empty && line_width + 1 + word_width > width {
            lines.push(line);
            line = String::from(subsequent);
            line_width = display_width(subsequent);
            empty = true;
        }
        if !empty {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(word);
        line_width += word_width;
        empty = false;
    }

    if !empty {
        lines.push(line);
    }
    lines
}

/// Pad `text` on the left so that it ends at column `width`
pub fn right_align(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{}{}", " ".repeat(padding), text)
}

/// Strip common leading indentation and surrounding blank lines
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => return String::new(),
    };
    let lines = &lines[start..=end];

    // Only spaces and tabs count as indentation, other whitespace is content
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start_matches([' ', '\t']).len()])
        .reduce(common_prefix)
        .unwrap_or("");

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.strip_prefix(margin).unwrap_or(l).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        assert_eq!(compact("  a \n\t b  c "), "a b c");
        assert_eq!(compact("   "), "");
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("one two three four five", 9, "", "");
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_with_prefixes() {
        let lines = wrap("alpha beta gamma", 12, "- ", "  ");
        assert_eq!(lines, vec!["- alpha beta", "  gamma"]);
    }

    #[test]
    fn test_wrap_long_word_gets_own_line() {
        let lines = wrap("a supercalifragilistic b", 10, "", "");
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("  ", 10, "- ", "  ").is_empty());
    }

    #[test]
    fn test_display_width_ignores_bars() {
        assert_eq!(display_width("|tag|"), 3);
    }

    #[test]
    fn test_right_align() {
        assert_eq!(right_align("*x*", 6), "   *x*");
        assert_eq!(right_align("*toolong*", 4), "*toolong*");
    }

    #[test]
    fn test_dedent() {
        let text = "\n\n    fn main() {\n        run();\n    }\n\n";
        assert_eq!(dedent(text), "fn main() {\n    run();\n}");
    }

    #[test]
    fn test_dedent_keeps_inner_blank_lines() {
        assert_eq!(dedent("  a\n\n  b"), "a\n\nb");
    }

    #[test]
    fn test_dedent_only_strips_spaces_and_tabs() {
        assert_eq!(dedent("\u{a0}x\n y"), "\u{a0}x\n y");
        assert_eq!(dedent("  \u{a0}x\n   y"), "\u{a0}x\n y");
        assert_eq!(dedent("\tx\n\t\ty"), "x\n\ty");
    }
}
