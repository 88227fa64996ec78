//! Plain-text rendering of the document, for the `show` command

use std::fmt::Write;

use checklist_core::{Checklist, DEFAULT_CATEGORIES};

/// Render the default columns with `active/total` counts
pub fn render(checklist: &Checklist) -> String {
    let mut out = String::new();

    for category in DEFAULT_CATEGORIES {
        let (active, total) = checklist.counts(category.id);
        let _ = writeln!(out, "{} {}/{}", category.name, active, total);

        let items = checklist.items(category.id);
        if items.is_empty() {
            out.push_str("  No items yet\n");
        }
        for item in items {
            let mark = if item.completed { 'x' } else { ' ' };
            match &item.url {
                Some(url) if !url.is_empty() => {
                    let _ = writeln!(out, "  [{}] {} <{}>", mark, item.text, url);
                }
                _ => {
                    let _ = writeln!(out, "  [{}] {}", mark, item.text);
                }
            }
        }
        out.push('\n');
    }

    out
}
