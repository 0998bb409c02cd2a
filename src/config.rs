use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub toc: TocConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Rewrite HTML tags into markdown before block parsing.
    pub normalize_html: bool,
    /// Attach a unique slug anchor to every heading.
    pub heading_anchors: bool,
    /// Embed local images as data URIs rather than absolute paths.
    pub embed_images: bool,
    /// Drop a leading `---` delimited YAML block.
    pub strip_frontmatter: bool,
    pub page_break_marker: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            normalize_html: true,
            heading_anchors: true,
            embed_images: true,
            strip_frontmatter: true,
            page_break_marker: "---PAGE_BREAK---".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    pub min_level: u8,
    pub max_level: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 6,
        }
    }
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        // Shape is checked by build.rs.
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::compiled_default(),
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::compiled_default()
            }
        }
    }

    /// Load config from a TOML file, reporting why it could not be used.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
