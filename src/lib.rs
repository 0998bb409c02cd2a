mod block;
mod config;
mod diagnostic;
mod html;
mod image;
mod inline;
mod parser;
mod toc;

pub use block::{Element, InlineSpan, TocEntry};
pub use config::{Config, ConfigError, ParserConfig, TocConfig};
pub use diagnostic::{Diagnostic, Severity};
pub use html::{looks_like_html, normalize as normalize_html};
pub use image::{FsImageResolver, ImageResolver, ResolvedImage, mime_type};
pub use inline::{format_inline, plain_text};
pub use parser::{ParseOutput, Parser};
pub use toc::{extract_table_of_contents, filter_toc_by_level, slugify};

use std::path::Path;

/// Parse markdown text into a vector of elements using the default config.
///
/// Local images are resolved against `base_dir`. Diagnostics are forwarded
/// to the `log` facade; use [`Parser`] to collect them instead.
pub fn parse(markdown: &str, base_dir: Option<&Path>) -> Vec<Element> {
    parse_with_config(markdown, base_dir, &Config::compiled_default().parser)
}

/// Parse markdown text into a vector of elements with custom config.
pub fn parse_with_config(
    markdown: &str,
    base_dir: Option<&Path>,
    config: &ParserConfig,
) -> Vec<Element> {
    let output = Parser::new(config.clone()).parse(markdown, base_dir);
    for diagnostic in &output.diagnostics {
        diagnostic.log();
    }
    output.elements
}

/// Parse markdown and return its table of contents.
pub fn markdown_to_toc(markdown: &str, config: &Config) -> Vec<TocEntry> {
    let elements = parse_with_config(markdown, None, &config.parser);
    let entries = extract_table_of_contents(&elements);
    filter_toc_by_level(&entries, config.toc.min_level, config.toc.max_level)
}
