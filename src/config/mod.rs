//! Configuration management.
//!
//! Configuration is read from `~/.config/mylist-exporter/config.toml` at
//! startup. If the file doesn't exist, a default configuration with comments
//! is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Where the collection lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site origin; relative cover paths and the endpoint resolve against it.
    pub origin: String,
    /// GraphQL endpoint path (or absolute URL).
    pub endpoint: String,
    /// Short tag used in artifact filenames.
    pub tag: String,
    pub user_agent: String,
    /// Raw `Cookie` header value for an authenticated session.
    pub session_cookie: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            origin: "https://bato.to".to_string(),
            endpoint: "/ap2/".to_string(),
            tag: "bato".to_string(),
            user_agent: concat!("mylist-exporter/", env!("CARGO_PKG_VERSION")).to_string(),
            session_cookie: None,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Paging parameters for the list and history queries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: u32,
    pub sort: String,
    /// Maximum comics requested per list.
    pub comic_limit: u32,
    /// History items requested per page.
    pub history_limit: u32,
    /// Upper bound on history pages; deeper history is not fetched.
    pub max_history_pages: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            sort: "update".to_string(),
            comic_limit: 5000,
            history_limit: 300,
            max_history_pages: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Open the first written artifact with the system viewer.
    pub open_after_export: bool,
    /// TrueType font embedded in PDFs for text Helvetica cannot show.
    pub pdf_font: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            open_after_export: false,
            pdf_font: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/mylist-exporter/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("mylist-exporter").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# mylist-exporter configuration

[source]
# Site origin. The API endpoint and relative cover paths resolve against it.
origin = "https://bato.to"
endpoint = "/ap2/"

# Prefix for exported filenames: <tag>_export_<user>_<date>.<ext>
tag = "bato"

# Request timeout in seconds
timeout_secs = 30

# Cookie header copied from a logged-in browser session. Needed for the
# reading history, which is private to the account.
# session_cookie = "..."

[fetch]
# Lists per page and sort order for the list query
page_size = 20
sort = "update"

# Maximum comics requested per list
comic_limit = 5000

# History items per page, and how many pages to walk at most.
# Very active accounts may have history older than this bound.
history_limit = 300
max_history_pages = 20

[output]
# Directory the export files are written to
dir = "."

# Open the first exported file when done
open_after_export = false

# TrueType font (.ttf) embedded in the PDF for text the built-in Helvetica
# cannot show, such as Korean, Japanese or Chinese titles. Without it those
# characters print as '?' in the PDF only.
# pdf_font = "/usr/share/fonts/truetype/noto/NotoSansKR-Regular.ttf"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.source.tag, "bato");
        assert_eq!(config.fetch, FetchConfig::default());
        assert!(config.source.session_cookie.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[fetch]
max_history_pages = 50
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.fetch.max_history_pages, 50);
        assert_eq!(config.fetch.page_size, 20);
        assert_eq!(config.source.endpoint, "/ap2/");
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.source.origin, "https://bato.to");
        assert_eq!(config.source.timeout(), Duration::from_secs(30));
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert!(config.output.pdf_font.is_none());
    }

    #[test]
    fn test_pdf_font_path() {
        let config: Config = toml::from_str("[output]\npdf_font = \"/fonts/Nanum.ttf\"").unwrap();
        assert_eq!(config.output.pdf_font, Some(PathBuf::from("/fonts/Nanum.ttf")));
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch\npage_size = 1").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
