use serde::{Deserialize, Serialize};

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineSpan {
    Text { content: String },
    Bold { content: String },
    Italic { content: String },
    Strike { content: String },
    Code { content: String },
    Link { content: String, href: String },
    LineBreak,
}

impl InlineSpan {
    /// The text carried by this span. Line breaks carry none.
    pub fn content(&self) -> &str {
        match self {
            InlineSpan::Text { content }
            | InlineSpan::Bold { content }
            | InlineSpan::Italic { content }
            | InlineSpan::Strike { content }
            | InlineSpan::Code { content }
            | InlineSpan::Link { content, .. } => content,
            InlineSpan::LineBreak => "",
        }
    }
}

/// Block-level elements parsed from Markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Element {
    Heading {
        level: u8,
        content: String,
        spans: Vec<InlineSpan>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor_id: Option<String>,
    },
    Paragraph {
        content: String,
        spans: Vec<InlineSpan>,
    },
    List {
        ordered: bool,
        items: Vec<String>,
        /// Nesting depth per item, parallel to `items`
        indent_levels: Vec<usize>,
    },
    Checklist {
        items: Vec<String>,
        checked: Vec<bool>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String,
    },
    Blockquote {
        content: String,
        spans: Vec<InlineSpan>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Image {
        src: String,
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    HorizontalRule,
    PageBreak,
}

/// A single table-of-contents entry derived from a heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub text: String,
    pub level: u8,
    pub anchor_id: String,
}
