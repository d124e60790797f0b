//! Configuration file handling.
//!
//! Settings are read from a TOML file, then `SCAN_DIR` and `IMAGE_REPO`
//! from the environment override the file. Command-line flags override
//! both. Everything is resolved once at startup.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/relscan/config.toml`
//! - macOS: `~/Library/Application Support/relscan/config.toml`
//! - Windows: `%APPDATA%\relscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [report]
//! bucket_url = "https://storage.googleapis.com/solo-gloo-security-scans"
//!
//! [scan]
//! scan_dir = "/tmp/scans"
//! image_repo = "quay.io/solo-io"
//! scanner = "trivy"
//! severities = ["HIGH", "CRITICAL"]
//!
//! [upload]
//! enabled = true
//! codeql = "/usr/local/bin/codeql/codeql"
//! repository = "solo-io/gloo"
//! use_sudo = true
//! ```

use crate::error::{Error, Result};
use crate::fetcher::DEFAULT_BUCKET_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const SCAN_DIR_ENV: &str = "SCAN_DIR";
pub const IMAGE_REPO_ENV: &str = "IMAGE_REPO";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
    pub scan: ScanConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Base URL of the bucket holding published reports.
    pub bucket_url: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bucket_url: DEFAULT_BUCKET_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory scan results are staged under.
    pub scan_dir: Option<PathBuf>,

    /// Registry prefix images are pulled from, e.g. `quay.io/solo-io`.
    pub image_repo: Option<String>,

    /// Vulnerability scanner executable.
    pub scanner: String,

    /// Severities the scanner reports on.
    pub severities: Vec<String>,

    pub markdown_template: String,
    pub sarif_template: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_dir: None,
            image_repo: None,
            scanner: "trivy".to_string(),
            severities: vec!["HIGH".to_string(), "CRITICAL".to_string()],
            markdown_template: "@hack/utils/security_scan_report/markdown.tpl".to_string(),
            sarif_template: "@hack/utils/security_scan_report/sarif.tpl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Whether scan results are pushed to code scanning after each scan.
    pub enabled: bool,

    /// Path to the CodeQL CLI used for the upload.
    pub codeql: String,

    /// Repository results are uploaded to, as `owner/name`.
    pub repository: String,

    /// Run the upload through `sudo`.
    pub use_sudo: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            codeql: "/usr/local/bin/codeql/codeql".to_string(),
            repository: "solo-io/gloo".to_string(),
            use_sudo: true,
        }
    }
}

impl Config {
    /// Loads the config file (or defaults if there is none) and applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::io("failed to read config file", &path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Overrides file settings with non-empty environment values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = non_empty(SCAN_DIR_ENV) {
            self.scan.scan_dir = Some(PathBuf::from(dir));
        }
        if let Some(repo) = non_empty(IMAGE_REPO_ENV) {
            self.scan.image_repo = Some(repo);
        }
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relscan")
            .join("config.toml")
    }

    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
