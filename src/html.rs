//! HTML to markdown normalization.
//!
//! Editors often hand us markdown with HTML mixed in, or plain HTML pasted
//! from elsewhere. This pass rewrites the common tags into the markdown the
//! block parser understands. Rewrites run once each, in a fixed order, and
//! never recurse: nested lists or quotes flatten instead of nesting.
//!
//! Code is never touched. Fenced blocks and inline code spans are swapped
//! for placeholders before any rewriting and restored verbatim at the end.

use std::sync::LazyLock;

use regex::{Captures, Regex};

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new($pattern).expect(concat!(stringify!($name), ": hardcoded regex is valid"))
        });
    };
}

// Fences open and close at the start of a line; an unclosed one runs to the end
regex!(FENCE_RE, r"(?ms)^[ \t]*```.*?(?:^[ \t]*```[^\n]*|\z)");
regex!(INLINE_CODE_SPAN_RE, r"`[^`\n]+`");
regex!(PLACEHOLDER_RE, r"\x{E001}(\d+)\x{E001}");

regex!(TAG_DETECT_RE, r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^>]*)?/?>");
regex!(TAG_RE, r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^>]*)?/?>|<![^>]*>");
regex!(ATTR_RE, r#"([a-zA-Z][\w:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#);

regex!(SCRIPT_RE, r"(?is)<script\b[^>]*>.*?</script\s*>");
regex!(STYLE_RE, r"(?is)<style\b[^>]*>.*?</style\s*>");
regex!(COMMENT_RE, r"(?s)<!--.*?-->");
regex!(HEADING_RE, r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>");
regex!(PRE_RE, r"(?is)<pre\b[^>]*>(.*?)</pre\s*>");
regex!(CODE_LANG_RE, r#"(?i)<code\b[^>]*\bclass\s*=\s*["'][^"']*?\blang(?:uage)?-([\w+#.-]+)"#);
regex!(CODE_RE, r"(?is)<code\b[^>]*>(.*?)</code\s*>");
regex!(BLOCKQUOTE_RE, r"(?is)<blockquote\b[^>]*>(.*?)</blockquote\s*>");
regex!(QUOTE_BREAK_RE, r"(?i)</?p\b[^>]*>|<br\b[^>]*>");
regex!(STRONG_RE, r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>");
regex!(EM_RE, r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)\s*>");
regex!(DEL_RE, r"(?is)<(?:del|s|strike)\b[^>]*>(.*?)</(?:del|s|strike)\s*>");
regex!(IMG_RE, r"(?is)<img\b([^>]*)>");
regex!(LINK_RE, r"(?is)<a\b([^>]*)>(.*?)</a\s*>");
regex!(UL_RE, r"(?is)<ul\b[^>]*>(.*?)</ul\s*>");
regex!(OL_RE, r"(?is)<ol\b[^>]*>(.*?)</ol\s*>");
regex!(LI_RE, r"(?is)<li\b[^>]*>(.*?)</li\s*>");
regex!(DL_RE, r"(?is)<dl\b[^>]*>(.*?)</dl\s*>");
regex!(DT_DD_RE, r"(?is)<(dt|dd)\b[^>]*>(.*?)</(?:dt|dd)\s*>");
regex!(TABLE_RE, r"(?is)<table\b[^>]*>(.*?)</table\s*>");
regex!(THEAD_RE, r"(?is)<thead\b[^>]*>(.*?)</thead\s*>");
regex!(TBODY_RE, r"(?is)<tbody\b[^>]*>(.*?)</tbody\s*>");
regex!(TR_RE, r"(?is)<tr\b[^>]*>(.*?)</tr\s*>");
regex!(CELL_RE, r"(?is)<(th|td)\b[^>]*>(.*?)</(?:th|td)\s*>");
regex!(DIV_RE, r"(?i)</?div\b[^>]*>");
regex!(SPAN_RE, r"(?i)</?span\b[^>]*>");
regex!(P_RE, r"(?i)</?p\b[^>]*>");
regex!(BR_RE, r"(?i)<br\b[^>]*>");
regex!(HR_RE, r"(?i)<hr\b[^>]*>");

regex!(HSPACE_RE, r"[ \t\x{A0}]+");
regex!(LINE_EDGE_SPACE_RE, r" ?\n ?");
regex!(BLANK_RUN_RE, r"\n{3,}");

/// Holds code that must come out of normalization byte-for-byte.
#[derive(Default)]
struct CodeStash {
    blocks: Vec<String>,
}

impl CodeStash {
    fn stash(&mut self, code: String) -> String {
        self.blocks.push(code);
        format!("\u{E001}{}\u{E001}", self.blocks.len() - 1)
    }

    fn protect(&mut self, text: &str, pattern: &Regex) -> String {
        pattern
            .replace_all(text, |caps: &Captures| self.stash(caps[0].to_string()))
            .into_owned()
    }

    fn restore(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.blocks.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Whether the document needs the HTML pass. Tags that only appear
/// inside code do not count.
pub fn looks_like_html(document: &str) -> bool {
    let without_fences = FENCE_RE.replace_all(document, "");
    let without_code = INLINE_CODE_SPAN_RE.replace_all(&without_fences, "");
    without_code.trim_start().starts_with('<') || TAG_DETECT_RE.is_match(&without_code)
}

/// Rewrite HTML in `document` into equivalent markdown.
pub fn normalize(document: &str) -> String {
    let mut stash = CodeStash::default();
    let text = stash.protect(document, &FENCE_RE);
    let text = stash.protect(&text, &INLINE_CODE_SPAN_RE);

    let text = SCRIPT_RE.replace_all(&text, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");

    let text = HEADING_RE.replace_all(&text, |caps: &Captures| {
        let level = caps[1].parse::<usize>().unwrap_or(1);
        format!("\n\n{} {}\n\n", "#".repeat(level), collapse_whitespace(&caps[2]))
    });

    let text = PRE_RE.replace_all(&text, |caps: &Captures| {
        let inner = &caps[1];
        let language = CODE_LANG_RE
            .captures(inner)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let body = html_escape::decode_html_entities(&strip_tags(inner)).into_owned();
        // Backtick spans inside the block were stashed on their own
        let body = stash.restore(&body);
        let fenced = format!("```{}\n{}\n```", language, body.trim_matches('\n'));
        format!("\n\n{}\n\n", stash.stash(fenced))
    });
    let text = CODE_RE.replace_all(&text, "`$1`");

    let text = BLOCKQUOTE_RE.replace_all(&text, |caps: &Captures| {
        let inner = QUOTE_BREAK_RE.replace_all(&caps[1], "\n");
        let lines: Vec<String> = inner
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("> {}", line))
            .collect();
        format!("\n\n{}\n\n", lines.join("\n"))
    });

    let text = STRONG_RE.replace_all(&text, "**$1**");
    let text = EM_RE.replace_all(&text, "*$1*");
    let text = DEL_RE.replace_all(&text, "~~$1~~");

    let text = IMG_RE.replace_all(&text, |caps: &Captures| {
        let attrs = &caps[1];
        let src = attribute(attrs, "src").unwrap_or_default();
        let alt = attribute(attrs, "alt").unwrap_or_default();
        match attribute(attrs, "title") {
            Some(title) => format!("![{}]({} \"{}\")", alt, src, title),
            None => format!("![{}]({})", alt, src),
        }
    });
    let text = LINK_RE.replace_all(&text, |caps: &Captures| {
        let label = collapse_whitespace(&caps[2]);
        match attribute(&caps[1], "href") {
            Some(href) if label.is_empty() => format!("[{}]({})", href, href),
            Some(href) => format!("[{}]({})", label, href),
            None => label,
        }
    });

    let text = UL_RE.replace_all(&text, |caps: &Captures| {
        let items: Vec<String> = list_items(&caps[1])
            .map(|item| format!("- {}", item))
            .collect();
        format!("\n\n{}\n\n", items.join("\n"))
    });
    let text = OL_RE.replace_all(&text, |caps: &Captures| {
        let items: Vec<String> = list_items(&caps[1])
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item))
            .collect();
        format!("\n\n{}\n\n", items.join("\n"))
    });
    let text = DL_RE.replace_all(&text, |caps: &Captures| {
        let pairs: Vec<String> = DT_DD_RE
            .captures_iter(&caps[1])
            .map(|c| {
                let body = collapse_whitespace(&c[2]);
                if c[1].eq_ignore_ascii_case("dt") {
                    format!("**{}**", body)
                } else {
                    format!(": {}", body)
                }
            })
            .collect();
        format!("\n\n{}\n\n", pairs.join("\n"))
    });

    let text = TABLE_RE.replace_all(&text, |caps: &Captures| table_to_markdown(&caps[1]));

    let text = DIV_RE.replace_all(&text, "\n");
    let text = SPAN_RE.replace_all(&text, "");
    let text = P_RE.replace_all(&text, "\n\n");
    let text = BR_RE.replace_all(&text, "\n");
    let text = HR_RE.replace_all(&text, "\n\n---\n\n");

    let text = strip_tags(&text);
    let text = html_escape::decode_html_entities(&text);

    let text = HSPACE_RE.replace_all(&text, " ");
    let text = LINE_EDGE_SPACE_RE.replace_all(&text, "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");

    stash.restore(text.trim())
}

fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

fn collapse_whitespace(html: &str) -> String {
    html.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .and_then(|c| c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)))
        .map(|m| m.as_str().to_string())
}

fn list_items(html: &str) -> impl Iterator<Item = String> + '_ {
    LI_RE
        .captures_iter(html)
        .map(|c| collapse_whitespace(&strip_tags(&c[1])))
}

fn row_cells(row: &str) -> Vec<String> {
    CELL_RE
        .captures_iter(row)
        .map(|c| collapse_whitespace(&strip_tags(&c[2])))
        .collect()
}

fn table_to_markdown(inner: &str) -> String {
    let mut headers: Vec<String> = THEAD_RE
        .captures(inner)
        .and_then(|c| TR_RE.captures(&c[1]).map(|tr| row_cells(&tr[1])))
        .unwrap_or_default();

    let body = THEAD_RE.replace_all(inner, "");
    let body = TBODY_RE
        .captures(&body)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| body.to_string());

    let mut rows = Vec::new();
    for tr in TR_RE.captures_iter(&body) {
        let row = &tr[1];
        let is_header_row = CELL_RE
            .captures_iter(row)
            .all(|c| c[1].eq_ignore_ascii_case("th"));
        let cells = row_cells(row);
        if cells.is_empty() {
            continue;
        }
        if is_header_row && headers.is_empty() && rows.is_empty() {
            headers = cells;
        } else {
            rows.push(cells);
        }
    }

    if headers.is_empty() {
        if rows.is_empty() {
            return String::new();
        }
        headers = rows.remove(0);
    }

    let mut out = String::from("\n\n");
    out.push_str(&pipe_row(&headers));
    out.push_str(&pipe_row(&vec!["---".to_string(); headers.len()]));
    for row in &rows {
        out.push_str(&pipe_row(row));
    }
    out.push('\n');
    out
}

fn pipe_row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}
