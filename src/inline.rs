use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::block::InlineSpan;

/// Stand-in for a hard line break while span patterns run.
/// Private use codepoint, so it never collides with document text.
const BREAK: char = '\u{E000}';

static HARD_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\\| {2,})\n").expect("Invalid hard break regex"));

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n\x{E000}]+)\]\(([^)\n\x{E000}]+)\)").expect("Invalid link regex")
});

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n\x{E000}]+)`").expect("Invalid code regex"));

static STRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^\n\x{E000}]+?)~~").expect("Invalid strike regex"));

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^\n\x{E000}]+?)\*\*|__([^\n\x{E000}]+?)__").expect("Invalid bold regex")
});

static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^*\n\x{E000}]+)\*|_([^_\n\x{E000}]+)_").expect("Invalid italic regex")
});

/// Span families in priority order. The index doubles as the tie-break
/// rank when two candidates share both start and length.
#[derive(Clone, Copy)]
enum Family {
    Link,
    Code,
    Strike,
    Bold,
    Italic,
}

impl Family {
    const ALL: [Family; 5] = [
        Family::Link,
        Family::Code,
        Family::Strike,
        Family::Bold,
        Family::Italic,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            Family::Link => &LINK_RE,
            Family::Code => &CODE_RE,
            Family::Strike => &STRIKE_RE,
            Family::Bold => &BOLD_RE,
            Family::Italic => &ITALIC_RE,
        }
    }

    fn to_span(self, caps: &Captures) -> InlineSpan {
        // Bold and italic have two alternatives, only one group participates
        let inner = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str())
            .to_string();
        match self {
            Family::Link => InlineSpan::Link {
                content: inner,
                href: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            },
            Family::Code => InlineSpan::Code { content: inner },
            Family::Strike => InlineSpan::Strike { content: inner },
            Family::Bold => InlineSpan::Bold { content: inner },
            Family::Italic => InlineSpan::Italic { content: inner },
        }
    }
}

struct Candidate {
    start: usize,
    end: usize,
    rank: usize,
    span: InlineSpan,
}

/// Split `text` into formatted inline spans.
///
/// Every family is matched over the whole string first. Candidates are then
/// ordered by start offset (longer span first on ties) and kept greedily
/// when they don't intersect anything already kept. The uncovered gaps
/// become text, with hard-break markers turned into `LineBreak` spans.
pub fn format_inline(text: &str) -> Vec<InlineSpan> {
    let protected = HARD_BREAK_RE.replace_all(text, BREAK.to_string().as_str());

    let mut candidates = collect_candidates(&protected);
    candidates.sort_by_key(|c| (c.start, Reverse(c.end - c.start), c.rank));

    let mut spans = Vec::new();
    let mut cursor = 0;
    for candidate in candidates {
        if candidate.start < cursor {
            continue;
        }
        push_text(&protected[cursor..candidate.start], &mut spans);
        spans.push(candidate.span);
        cursor = candidate.end;
    }
    push_text(&protected[cursor..], &mut spans);

    spans
}

/// Collect every match of every family, including matches that start inside
/// another match of the same family (`*a* b *c*` must yield `*c*` even
/// though a non-overlapping scan would consume `* b *`).
fn collect_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (rank, family) in Family::ALL.into_iter().enumerate() {
        let regex = family.regex();
        let mut from = 0;
        while let Some(caps) = regex.captures_at(text, from) {
            let Some(whole) = caps.get(0) else { break };
            from = whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8);

            if whole.as_str().starts_with('_') && is_intraword(text, whole.start(), whole.end()) {
                continue;
            }
            candidates.push(Candidate {
                start: whole.start(),
                end: whole.end(),
                rank,
                span: family.to_span(&caps),
            });
        }
    }
    candidates
}

/// Underscore emphasis inside a word (`snake_case_name`) is literal text.
fn is_intraword(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
}

fn push_text(segment: &str, spans: &mut Vec<InlineSpan>) {
    for (i, piece) in segment.split(BREAK).enumerate() {
        if i > 0 {
            spans.push(InlineSpan::LineBreak);
        }
        if !piece.is_empty() {
            spans.push(InlineSpan::Text {
                content: piece.to_string(),
            });
        }
    }
}

/// Concatenate span contents, rendering line breaks as spaces.
pub fn plain_text(spans: &[InlineSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            InlineSpan::LineBreak => out.push(' '),
            other => out.push_str(other.content()),
        }
    }
    out
}
