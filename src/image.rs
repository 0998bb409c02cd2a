use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Outcome of resolving an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub src: String,
    /// Set when the source could not be resolved and was kept as written.
    pub warning: Option<String>,
}

impl ResolvedImage {
    pub fn unchanged(src: &str) -> Self {
        Self {
            src: src.to_string(),
            warning: None,
        }
    }
}

/// Turns an image `src` as written in the document into something a
/// renderer can use without knowing where the document lives.
pub trait ImageResolver: Send + Sync {
    fn resolve(&self, src: &str, base_dir: Option<&Path>) -> ResolvedImage;
}

impl<F> ImageResolver for F
where
    F: Fn(&str, Option<&Path>) -> ResolvedImage + Send + Sync,
{
    fn resolve(&self, src: &str, base_dir: Option<&Path>) -> ResolvedImage {
        self(src, base_dir)
    }
}

/// Resolves local images from disk.
///
/// Remote and data URIs pass through. Local files are embedded as base64
/// data URIs when `embed` is set, otherwise replaced by their absolute path.
#[derive(Debug, Clone, Copy)]
pub struct FsImageResolver {
    pub embed: bool,
}

impl Default for FsImageResolver {
    fn default() -> Self {
        Self { embed: true }
    }
}

impl ImageResolver for FsImageResolver {
    fn resolve(&self, src: &str, base_dir: Option<&Path>) -> ResolvedImage {
        if is_remote(src) || src.starts_with("data:") {
            return ResolvedImage::unchanged(src);
        }

        let path = local_path(src, base_dir);
        if !path.is_file() {
            return ResolvedImage {
                src: src.to_string(),
                warning: Some(format!("image not found: {}", path.display())),
            };
        }

        if !self.embed {
            let absolute = fs::canonicalize(&path).unwrap_or(path);
            return ResolvedImage {
                src: absolute.display().to_string(),
                warning: None,
            };
        }

        match fs::read(&path) {
            Ok(bytes) => ResolvedImage {
                src: format!("data:{};base64,{}", mime_type(&path), STANDARD.encode(bytes)),
                warning: None,
            },
            Err(e) => ResolvedImage {
                src: src.to_string(),
                warning: Some(format!("failed to read image {}: {}", path.display(), e)),
            },
        }
    }
}

fn is_remote(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn local_path(src: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// MIME type by file extension, defaulting to PNG.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}
