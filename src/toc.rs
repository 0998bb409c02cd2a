use std::collections::HashSet;

use crate::block::{Element, TocEntry};
use crate::inline::plain_text;

/// Collect headings into a flat table of contents, in document order.
///
/// Headings without an anchor id have nothing to link to and are skipped.
pub fn extract_table_of_contents(elements: &[Element]) -> Vec<TocEntry> {
    elements
        .iter()
        .filter_map(|element| match element {
            Element::Heading {
                level,
                spans,
                anchor_id: Some(anchor_id),
                ..
            } => Some(TocEntry {
                text: plain_text(spans).trim().to_string(),
                level: *level,
                anchor_id: anchor_id.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Keep entries whose level lies in `min..=max`, preserving order.
pub fn filter_toc_by_level(entries: &[TocEntry], min: u8, max: u8) -> Vec<TocEntry> {
    entries
        .iter()
        .filter(|entry| (min..=max).contains(&entry.level))
        .cloned()
        .collect()
}

/// Lowercase, dash-separated identifier for a heading.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out unique anchor ids within one document.
#[derive(Debug, Default)]
pub(crate) struct AnchorRegistry {
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub(crate) fn anchor_for(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        let mut suffix = 0;
        while self.used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
