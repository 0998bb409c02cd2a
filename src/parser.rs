use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::Element;
use crate::config::ParserConfig;
use crate::diagnostic::Diagnostic;
use crate::html;
use crate::image::{FsImageResolver, ImageResolver};
use crate::inline::{format_inline, plain_text};
use crate::toc::AnchorRegistry;

static IMAGE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\(\s*([^\s)]+)(?:\s+"([^"]*)")?\s*\)$"#)
        .expect("Invalid image regex")
});

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("Invalid heading regex"));

static CLOSING_HASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#+$").expect("Invalid closing hashes regex"));

static CHECKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*+]\s+\[([ xX])\](?:\s+(.*))?$").expect("Invalid checklist regex")
});

static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("Invalid unordered list regex"));

static YAML_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+\s*:(?:\s|$)").expect("Invalid frontmatter key regex"));

static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)\d+\.\s+(.*)$").expect("Invalid ordered list regex"));

/// Elements plus the diagnostics collected while producing them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub elements: Vec<Element>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Which construct a line opens. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockStart {
    PageBreak,
    Rule,
    Image,
    Heading,
    Table,
    CodeFence,
    Quote,
    Checklist,
    UnorderedList,
    OrderedList,
}

/// Markdown to element parser.
pub struct Parser {
    config: ParserConfig,
    resolver: Box<dyn ImageResolver>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        let resolver = FsImageResolver {
            embed: config.embed_images,
        };
        Self {
            config,
            resolver: Box::new(resolver),
        }
    }

    /// Replace the filesystem image resolver.
    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Parse `document` into block elements.
    ///
    /// Relative image paths are resolved against `base_dir`. Never fails:
    /// anything unrecognized becomes a paragraph.
    pub fn parse(&self, document: &str, base_dir: Option<&Path>) -> ParseOutput {
        let mut diagnostics = Vec::new();

        let mut text = document.replace("\r\n", "\n").replace('\r', "\n");
        if self.config.strip_frontmatter {
            text = strip_frontmatter(&text).to_string();
        }
        if self.config.normalize_html && html::looks_like_html(&text) {
            diagnostics.push(Diagnostic::info("converted HTML markup to markdown"));
            text = html::normalize(&text);
        }

        let scanner = BlockScanner {
            parser: self,
            lines: text.lines().collect(),
            base_dir,
            elements: Vec::new(),
            diagnostics,
            anchors: AnchorRegistry::default(),
        };
        scanner.run()
    }
}

/// Strip YAML frontmatter from the beginning of markdown content.
///
/// The block between the delimiters must read as YAML, otherwise a leading
/// `---` is a horizontal rule and the document is returned unchanged.
fn strip_frontmatter(markdown: &str) -> &str {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return markdown;
    };
    // Find the closing ---
    let close = rest
        .find("\n---\n")
        .or_else(|| rest.ends_with("\n---").then(|| rest.len() - 4));
    match close {
        Some(pos) if is_yaml_block(&rest[..pos]) => rest[pos + 4..].trim_start_matches('\n'),
        _ => markdown,
    }
}

/// At least one `key:` line; everything else blank, a comment, or a
/// continuation of a previous key.
fn is_yaml_block(block: &str) -> bool {
    let mut seen_key = false;
    for line in block.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if YAML_KEY_RE.is_match(line) {
            seen_key = true;
        } else if !(seen_key && (line.starts_with([' ', '\t']) || line.starts_with("- "))) {
            return false;
        }
    }
    seen_key
}

/// Line-by-line state machine. Each handler consumes the lines of one
/// construct and returns the index of the first line after it.
struct BlockScanner<'p, 'a> {
    parser: &'p Parser,
    lines: Vec<&'a str>,
    base_dir: Option<&'a Path>,
    elements: Vec<Element>,
    diagnostics: Vec<Diagnostic>,
    anchors: AnchorRegistry,
}

impl BlockScanner<'_, '_> {
    fn run(mut self) -> ParseOutput {
        let mut cursor = 0;
        while cursor < self.lines.len() {
            let line = self.lines[cursor];
            if line.trim().is_empty() {
                cursor += 1;
                continue;
            }
            cursor = match self.block_start(line) {
                Some(BlockStart::PageBreak) => {
                    self.elements.push(Element::PageBreak);
                    cursor + 1
                }
                Some(BlockStart::Rule) => {
                    self.elements.push(Element::HorizontalRule);
                    cursor + 1
                }
                Some(BlockStart::Image) => self.image(cursor),
                Some(BlockStart::Heading) => self.heading(cursor),
                Some(BlockStart::Table) => self.table(cursor),
                Some(BlockStart::CodeFence) => self.code_fence(cursor),
                Some(BlockStart::Quote) => self.blockquote(cursor),
                Some(BlockStart::Checklist) => self.checklist(cursor),
                Some(BlockStart::UnorderedList) => self.list(cursor, false),
                Some(BlockStart::OrderedList) => self.list(cursor, true),
                None => self.paragraph(cursor),
            };
        }

        ParseOutput {
            elements: self.elements,
            diagnostics: self.diagnostics,
        }
    }

    fn block_start(&self, line: &str) -> Option<BlockStart> {
        let trimmed = line.trim();
        if trimmed == self.parser.config.page_break_marker {
            Some(BlockStart::PageBreak)
        } else if is_rule(trimmed) {
            Some(BlockStart::Rule)
        } else if IMAGE_LINE_RE.is_match(trimmed) {
            Some(BlockStart::Image)
        } else if HEADING_RE.is_match(trimmed) {
            Some(BlockStart::Heading)
        } else if trimmed.starts_with('|') {
            Some(BlockStart::Table)
        } else if trimmed.starts_with("```") {
            Some(BlockStart::CodeFence)
        } else if trimmed.starts_with('>') {
            Some(BlockStart::Quote)
        } else if is_checklist_item(line) {
            Some(BlockStart::Checklist)
        } else if UNORDERED_RE.is_match(line.trim_end()) {
            Some(BlockStart::UnorderedList)
        } else if ORDERED_RE.is_match(line.trim_end()) {
            Some(BlockStart::OrderedList)
        } else {
            None
        }
    }

    fn image(&mut self, start: usize) -> usize {
        let trimmed = self.lines[start].trim();
        let Some(caps) = IMAGE_LINE_RE.captures(trimmed) else {
            return self.paragraph(start);
        };
        let alt = caps[1].trim().to_string();
        let src = &caps[2];
        let title = caps.get(3).map(|m| m.as_str().to_string());

        if src.starts_with("data:") {
            self.diagnostics.push(Diagnostic::warning(
                start + 1,
                "embedded base64 image was not saved as a file; replaced with a placeholder",
            ));
            let label = if alt.is_empty() { "embedded image" } else { alt.as_str() };
            let content = format!("[Image not saved: {}]", label);
            self.elements.push(Element::Paragraph {
                spans: format_inline(&content),
                content,
            });
            return start + 1;
        }

        let resolved = self.parser.resolver.resolve(src, self.base_dir);
        if let Some(warning) = resolved.warning {
            self.diagnostics.push(Diagnostic::warning(start + 1, warning));
        }
        self.elements.push(Element::Image {
            src: resolved.src,
            alt,
            title,
        });
        start + 1
    }

    fn heading(&mut self, start: usize) -> usize {
        let trimmed = self.lines[start].trim();
        let Some(caps) = HEADING_RE.captures(trimmed) else {
            return self.paragraph(start);
        };
        let level = caps[1].len() as u8;
        let content = CLOSING_HASHES_RE.replace(caps[2].trim(), "").into_owned();
        let spans = format_inline(&content);
        let anchor_id = self
            .parser
            .config
            .heading_anchors
            .then(|| self.anchors.anchor_for(&plain_text(&spans)));

        self.elements.push(Element::Heading {
            level,
            content,
            spans,
            anchor_id,
        });
        start + 1
    }

    fn table(&mut self, start: usize) -> usize {
        let end = self.lines[start..]
            .iter()
            .position(|line| !line.trim().starts_with('|'))
            .map_or(self.lines.len(), |offset| start + offset);

        let mut rows = self.lines[start..end]
            .iter()
            .enumerate()
            .map(|(offset, line)| (start + offset, split_row(line.trim())));

        let headers = rows.next().map(|(_, cells)| cells).unwrap_or_default();
        // Row 1 is the `| --- |` separator
        rows.next();

        let mut data = Vec::new();
        for (index, cells) in rows {
            if cells.len() == headers.len() {
                data.push(cells);
            } else {
                self.diagnostics.push(Diagnostic::warning(
                    index + 1,
                    format!(
                        "table row has {} cells but the header has {}; row dropped",
                        cells.len(),
                        headers.len()
                    ),
                ));
            }
        }

        self.elements.push(Element::Table {
            headers,
            rows: data,
        });
        end
    }

    fn code_fence(&mut self, start: usize) -> usize {
        let info = self.lines[start].trim().trim_start_matches('`').trim();
        let language = (!info.is_empty()).then(|| info.to_string());

        let body_start = start + 1;
        let close = self.lines[body_start.min(self.lines.len())..]
            .iter()
            .position(|line| line.trim_start().starts_with("```"))
            .map(|offset| body_start + offset);
        let body_end = close.unwrap_or(self.lines.len());

        let content = self.lines[body_start.min(body_end)..body_end].join("\n");
        self.elements.push(Element::CodeBlock { language, content });

        match close {
            Some(index) => index + 1,
            None => self.lines.len(),
        }
    }

    fn blockquote(&mut self, start: usize) -> usize {
        let mut pieces = Vec::new();
        let mut i = start;
        while i < self.lines.len() {
            let Some(rest) = self.lines[i].trim().strip_prefix('>') else {
                break;
            };
            let piece = rest.trim();
            if !piece.is_empty() {
                pieces.push(piece);
            }
            i += 1;
        }

        let content = pieces.join(" ");
        self.elements.push(Element::Blockquote {
            spans: format_inline(&content),
            content,
        });
        i
    }

    fn checklist(&mut self, start: usize) -> usize {
        let mut items = Vec::new();
        let mut checked = Vec::new();
        let mut i = start;
        while i < self.lines.len() {
            let line = self.lines[i].trim_end();
            if line.trim().is_empty() {
                i += 1;
                continue;
            }
            let Some(caps) = CHECKLIST_RE.captures(line) else {
                break;
            };
            checked.push(caps[1].eq_ignore_ascii_case("x"));
            items.push(caps.get(2).map_or("", |m| m.as_str()).trim().to_string());
            i += 1;
        }

        self.elements.push(Element::Checklist { items, checked });
        i
    }

    fn list(&mut self, start: usize, ordered: bool) -> usize {
        let pattern: &Regex = if ordered { &ORDERED_RE } else { &UNORDERED_RE };
        let mut items = Vec::new();
        let mut indent_levels = Vec::new();
        let mut i = start;
        while i < self.lines.len() {
            let line = self.lines[i].trim_end();
            if line.trim().is_empty() {
                i += 1;
                continue;
            }
            // A checkbox line starts a checklist, even mid-run
            if is_checklist_item(line) {
                break;
            }
            let Some(caps) = pattern.captures(line) else {
                break;
            };
            indent_levels.push(indent_width(&caps[1]) / 2);
            items.push(caps[2].trim().to_string());
            i += 1;
        }

        self.elements.push(Element::List {
            ordered,
            items,
            indent_levels,
        });
        i
    }

    fn paragraph(&mut self, start: usize) -> usize {
        let mut content = String::new();
        let mut i = start;
        while i < self.lines.len() {
            let line = self.lines[i];
            if line.trim().is_empty() || (i > start && self.block_start(line).is_some()) {
                break;
            }
            let text = line.trim();
            if !content.is_empty() && !content.ends_with('\n') {
                content.push(' ');
            }
            content.push_str(text);
            if text.ends_with('\\') {
                content.push('\n');
            } else if line.ends_with("  ") {
                content.push_str("  \n");
            }
            i += 1;
        }

        // A break marker on the last line has nothing to break before
        if let Some(stripped) = content.strip_suffix("\\\n") {
            content.truncate(stripped.len());
        } else if let Some(stripped) = content.strip_suffix("  \n") {
            content.truncate(stripped.len());
        }

        self.elements.push(Element::Paragraph {
            spans: format_inline(&content),
            content,
        });
        i
    }
}

/// Three or more of the same `-`, `*` or `_`, optionally space-separated.
fn is_rule(trimmed: &str) -> bool {
    let mut marks = trimmed.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    matches!(first, '-' | '*' | '_') && count >= 3
}

fn is_checklist_item(line: &str) -> bool {
    CHECKLIST_RE.is_match(line.trim_end())
}

/// Leading whitespace width, counting a tab as one nesting step.
fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 2 } else { 1 }).sum()
}

/// Split a `| a | b |` row into trimmed cells.
fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.split('|').skip(1).collect();
    if cells.last().is_some_and(|cell| cell.trim().is_empty()) {
        cells.pop();
    }
    cells.iter().map(|cell| cell.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::InlineSpan;
    use crate::diagnostic::Severity;
    use crate::image::ResolvedImage;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(markdown: &str) -> Vec<Element> {
        Parser::default().parse(markdown, None).elements
    }

    fn text(s: &str) -> InlineSpan {
        InlineSpan::Text {
            content: s.to_string(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_and_blank_documents() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n   \n").is_empty());
    }

    #[test]
    fn heading_levels_and_anchors() {
        let elements = parse("# Title\n###### Deep ##\n####### too deep");
        assert_eq!(
            elements,
            vec![
                Element::Heading {
                    level: 1,
                    content: "Title".to_string(),
                    spans: vec![text("Title")],
                    anchor_id: Some("title".to_string()),
                },
                Element::Heading {
                    level: 6,
                    content: "Deep".to_string(),
                    spans: vec![text("Deep")],
                    anchor_id: Some("deep".to_string()),
                },
                Element::Paragraph {
                    content: "####### too deep".to_string(),
                    spans: vec![text("####### too deep")],
                },
            ]
        );
    }

    #[test]
    fn heading_anchor_uses_plain_text_and_dedups() {
        let elements = parse("## **Install** guide\n\n## Install guide");
        let anchors: Vec<_> = elements
            .iter()
            .filter_map(|e| match e {
                Element::Heading { anchor_id, .. } => anchor_id.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(anchors, strings(&["install-guide", "install-guide-1"]));
    }

    #[test]
    fn anchors_can_be_disabled() {
        let config = ParserConfig {
            heading_anchors: false,
            ..ParserConfig::default()
        };
        let elements = Parser::new(config).parse("# Title", None).elements;
        assert!(matches!(
            &elements[0],
            Element::Heading { anchor_id: None, .. }
        ));
    }

    #[test]
    fn hashtag_without_space_is_paragraph() {
        assert!(matches!(&parse("#rust")[0], Element::Paragraph { .. }));
    }

    #[rstest]
    #[case("---")]
    #[case("***")]
    #[case("_____")]
    #[case("- - -")]
    fn horizontal_rules(#[case] line: &str) {
        assert_eq!(parse(line), vec![Element::HorizontalRule]);
    }

    #[test]
    fn mixed_rule_characters_are_not_a_rule() {
        assert!(matches!(&parse("-*-")[0], Element::Paragraph { .. }));
    }

    #[test]
    fn page_break_sentinel() {
        assert_eq!(
            parse("Before\n\n---PAGE_BREAK---\n\nAfter"),
            vec![
                Element::Paragraph {
                    content: "Before".to_string(),
                    spans: vec![text("Before")],
                },
                Element::PageBreak,
                Element::Paragraph {
                    content: "After".to_string(),
                    spans: vec![text("After")],
                },
            ]
        );
    }

    #[test]
    fn custom_page_break_marker() {
        let config = ParserConfig {
            page_break_marker: "\\newpage".to_string(),
            ..ParserConfig::default()
        };
        let elements = Parser::new(config).parse("\\newpage", None).elements;
        assert_eq!(elements, vec![Element::PageBreak]);
    }

    #[test]
    fn fenced_code_is_verbatim() {
        let md = "```rust\nfn main() {\n    println!(\"**hi**\");\n}\n```\nafter";
        let elements = parse(md);
        assert_eq!(
            elements[0],
            Element::CodeBlock {
                language: Some("rust".to_string()),
                content: "fn main() {\n    println!(\"**hi**\");\n}".to_string(),
            }
        );
        assert!(matches!(&elements[1], Element::Paragraph { content, .. } if content == "after"));
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        assert_eq!(
            parse("```\n# not a heading\n\n- nor a list"),
            vec![Element::CodeBlock {
                language: None,
                content: "# not a heading\n\n- nor a list".to_string(),
            }]
        );
    }

    #[test]
    fn empty_fence() {
        assert_eq!(
            parse("```\n```"),
            vec![Element::CodeBlock {
                language: None,
                content: String::new(),
            }]
        );
    }

    #[test]
    fn blockquote_lines_join_with_spaces() {
        assert_eq!(
            parse("> first line\n>   second *line*\n>\n> third\n\nafter"),
            vec![
                Element::Blockquote {
                    content: "first line second *line* third".to_string(),
                    spans: vec![
                        text("first line second "),
                        InlineSpan::Italic {
                            content: "line".to_string()
                        },
                        text(" third"),
                    ],
                },
                Element::Paragraph {
                    content: "after".to_string(),
                    spans: vec![text("after")],
                },
            ]
        );
    }

    #[test]
    fn checklist_is_not_a_list() {
        assert_eq!(
            parse("- [ ] a\n- [x] b\n\n* [X] c\n+ [ ]\nnext"),
            vec![
                Element::Checklist {
                    items: strings(&["a", "b", "c", ""]),
                    checked: vec![false, true, true, false],
                },
                Element::Paragraph {
                    content: "next".to_string(),
                    spans: vec![text("next")],
                },
            ]
        );
    }

    #[test]
    fn unordered_list_indent_levels() {
        assert_eq!(
            parse("- a\n  - b\n    - c\n   - d\n\n* e"),
            vec![Element::List {
                ordered: false,
                items: strings(&["a", "b", "c", "d", "e"]),
                indent_levels: vec![0, 1, 2, 1, 0],
            }]
        );
    }

    #[test]
    fn ordered_list_discards_numbers() {
        assert_eq!(
            parse("3. three\n7. seven\n\t1. nested"),
            vec![Element::List {
                ordered: true,
                items: strings(&["three", "seven", "nested"]),
                indent_levels: vec![0, 0, 1],
            }]
        );
    }

    #[test]
    fn list_kinds_end_each_other() {
        let elements = parse("- a\n1. one\n- [ ] task\n- b");
        assert_eq!(
            elements,
            vec![
                Element::List {
                    ordered: false,
                    items: strings(&["a"]),
                    indent_levels: vec![0],
                },
                Element::List {
                    ordered: true,
                    items: strings(&["one"]),
                    indent_levels: vec![0],
                },
                Element::Checklist {
                    items: strings(&["task"]),
                    checked: vec![false],
                },
                Element::List {
                    ordered: false,
                    items: strings(&["b"]),
                    indent_levels: vec![0],
                },
            ]
        );
    }

    #[test]
    fn bold_line_is_not_a_list() {
        assert!(matches!(&parse("**Note** read this")[0], Element::Paragraph { .. }));
    }

    #[test]
    fn table_headers_and_rows() {
        let md = "| Name | Age |\n|------|-----|\n| Ann | 31 |\n| Bo | 7 |";
        assert_eq!(
            parse(md),
            vec![Element::Table {
                headers: strings(&["Name", "Age"]),
                rows: vec![strings(&["Ann", "31"]), strings(&["Bo", "7"])],
            }]
        );
    }

    #[test]
    fn table_row_without_trailing_pipe_keeps_last_cell() {
        let elements = parse("| a | b\n| - | -\n| 1 | 2");
        assert_eq!(
            elements,
            vec![Element::Table {
                headers: strings(&["a", "b"]),
                rows: vec![strings(&["1", "2"])],
            }]
        );
    }

    #[test]
    fn short_table_rows_are_dropped_with_warning() {
        let output = Parser::default().parse("| a | b |\n|---|---|\n| 1 |\n| 2 | 3 |", None);
        assert_eq!(
            output.elements,
            vec![Element::Table {
                headers: strings(&["a", "b"]),
                rows: vec![strings(&["2", "3"])],
            }]
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].line, Some(3));
        assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn paragraph_lines_join_with_spaces() {
        assert_eq!(
            parse("one\n  two\nthree\n\nfour"),
            vec![
                Element::Paragraph {
                    content: "one two three".to_string(),
                    spans: vec![text("one two three")],
                },
                Element::Paragraph {
                    content: "four".to_string(),
                    spans: vec![text("four")],
                },
            ]
        );
    }

    #[test]
    fn paragraph_hard_breaks() {
        assert_eq!(
            parse("Roses\\\n   violets  \nsugar\\"),
            vec![Element::Paragraph {
                content: "Roses\\\nviolets  \nsugar".to_string(),
                spans: vec![
                    text("Roses"),
                    InlineSpan::LineBreak,
                    text("violets"),
                    InlineSpan::LineBreak,
                    text("sugar"),
                ],
            }]
        );
    }

    #[test]
    fn paragraph_stops_at_block_start() {
        let elements = parse("intro text\n# Heading\nmore\n- item");
        assert_eq!(elements.len(), 4);
        assert!(matches!(&elements[0], Element::Paragraph { content, .. } if content == "intro text"));
        assert!(matches!(&elements[1], Element::Heading { level: 1, .. }));
        assert!(matches!(&elements[2], Element::Paragraph { content, .. } if content == "more"));
        assert!(matches!(&elements[3], Element::List { .. }));
    }

    #[test]
    fn image_line_goes_through_resolver() {
        let parser = Parser::default().with_resolver(|src: &str, base: Option<&Path>| {
            ResolvedImage::unchanged(&format!("{}/{}", base.map_or(".", |b| b.to_str().unwrap()), src))
        });
        let output = parser.parse("![A cat](cat.png \"Cute\")", Some(Path::new("/docs")));
        assert_eq!(
            output.elements,
            vec![Element::Image {
                src: "/docs/cat.png".to_string(),
                alt: "A cat".to_string(),
                title: Some("Cute".to_string()),
            }]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn inline_image_in_text_is_not_an_image_block() {
        assert!(matches!(
            &parse("see ![x](x.png) here")[0],
            Element::Paragraph { .. }
        ));
    }

    #[test]
    fn missing_image_keeps_path_and_warns() {
        let output = Parser::default().parse("![gone](does/not/exist.png)", None);
        assert_eq!(
            output.elements,
            vec![Element::Image {
                src: "does/not/exist.png".to_string(),
                alt: "gone".to_string(),
                title: None,
            }]
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].line, Some(1));
    }

    #[test]
    fn base64_image_becomes_placeholder() {
        let output = Parser::default().parse("![chart](data:image/png;base64,iVBORw0KGgo=)", None);
        assert_eq!(
            output.elements,
            vec![Element::Paragraph {
                content: "[Image not saved: chart]".to_string(),
                spans: vec![text("[Image not saved: chart]")],
            }]
        );
        assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn frontmatter_is_stripped() {
        let elements = parse("---\ntitle: Doc\n---\n# Body");
        assert_eq!(elements.len(), 1);
        assert!(matches!(&elements[0], Element::Heading { content, .. } if content == "Body"));
    }

    #[test]
    fn frontmatter_with_lists_and_comments_is_stripped() {
        let elements = parse("---\n# draft\ntags:\n  - a\n- b\nauthor: Me\n\n---\n\nBody");
        assert_eq!(
            elements,
            vec![Element::Paragraph {
                content: "Body".to_string(),
                spans: vec![text("Body")],
            }]
        );
    }

    #[rstest]
    #[case("---\nIntro paragraph\n---\nMore text", "Intro paragraph")]
    #[case("---\nplain words\ntitle: x\n---\nMore text", "plain words title: x")]
    #[case("---\n---\nMore text", "")]
    fn rule_delimited_text_is_not_frontmatter(#[case] markdown: &str, #[case] middle: &str) {
        let paragraph = |s: &str| Element::Paragraph {
            content: s.to_string(),
            spans: vec![text(s)],
        };
        let mut expected = vec![Element::HorizontalRule];
        if !middle.is_empty() {
            expected.push(paragraph(middle));
        }
        expected.push(Element::HorizontalRule);
        expected.push(paragraph("More text"));

        assert_eq!(parse(markdown), expected);
    }

    #[test]
    fn leading_rule_without_closing_is_kept() {
        assert_eq!(
            parse("---\ntext"),
            vec![
                Element::HorizontalRule,
                Element::Paragraph {
                    content: "text".to_string(),
                    spans: vec![text("text")],
                },
            ]
        );
    }

    #[test]
    fn crlf_input() {
        assert_eq!(
            parse("# Title\r\n\r\nline one\r\nline two"),
            parse("# Title\n\nline one\nline two")
        );
    }

    #[test]
    fn html_input_is_normalized_first() {
        let output = Parser::default().parse("<h2>Hi</h2><p>there <b>you</b></p>", None);
        assert_eq!(
            output.elements,
            vec![
                Element::Heading {
                    level: 2,
                    content: "Hi".to_string(),
                    spans: vec![text("Hi")],
                    anchor_id: Some("hi".to_string()),
                },
                Element::Paragraph {
                    content: "there **you**".to_string(),
                    spans: vec![
                        text("there "),
                        InlineSpan::Bold {
                            content: "you".to_string()
                        }
                    ],
                },
            ]
        );
        assert_eq!(output.diagnostics[0].severity, Severity::Info);
    }

    #[test]
    fn html_normalization_can_be_disabled() {
        let config = ParserConfig {
            normalize_html: false,
            ..ParserConfig::default()
        };
        let elements = Parser::new(config).parse("<p>raw</p>", None).elements;
        assert!(matches!(&elements[0], Element::Paragraph { content, .. } if content == "<p>raw</p>"));
    }
}
