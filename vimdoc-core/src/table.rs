//! Plain text tables with word-wrapped columns

use unicode_width::UnicodeWidthStr;

use crate::wrap::{compact, wrap};

const PADDING: &str = "  ";

/// Lay out `rows` within `width` columns; the header line is marked with ` ~`
pub fn render(rows: &[Vec<String>], width: usize, indent: usize) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| row.get(i).map(|cell| compact(cell)).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths = column_widths(&cells, width.saturating_sub(indent), columns);
    let prefix = " ".repeat(indent) + PADDING;

    let mut lines = Vec::new();
    for row in &cells {
        let wrapped: Vec<Vec<String>> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| wrap(cell, w, "", ""))
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);

        for i in 0..height {
            let parts: Vec<String> = wrapped
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| {
                    let text = cell.get(i).map(String::as_str).unwrap_or("");
                    format!("{text}{}", " ".repeat(w.saturating_sub(text.width())))
                })
                .collect();
            lines.push(format!("{prefix}{}", parts.join(PADDING)).trim_end().to_string());
        }
    }

    if let Some(first) = lines.first_mut() {
        first.push_str(" ~");
    }
    lines
}

fn column_widths(cells: &[Vec<String>], width: usize, columns: usize) -> Vec<usize> {
    let mut widths = vec![0; columns];
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let padding = columns * PADDING.len();
    if widths.iter().sum::<usize>() + padding > width {
        let mut remaining_width = width.saturating_sub(padding);
        let mut remaining_columns = columns;
        for w in widths.iter_mut() {
            *w = (*w).min(remaining_width / remaining_columns).max(1);
            remaining_width = remaining_width.saturating_sub(*w);
            remaining_columns -= 1;
        }
    }
    widths
}
