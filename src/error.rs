//! Error types shared by the report builder and the scan orchestrator.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid release tag {tag:?}: {source}")]
    InvalidTag {
        tag: String,
        #[source]
        source: semver::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} fetching {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("{context}: {}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error running scan on image {image}, version {version}, logs:\n{logs}")]
    ScanFailed {
        image: String,
        version: String,
        logs: String,
    },

    #[error("error uploading {}, logs: {logs}", .file.display())]
    UploadFailed { file: PathBuf, logs: String },

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Errors that must stop a scan run outright rather than be reported
    /// back to the caller as an ordinary failure.
    pub fn is_fatal_scan(&self) -> bool {
        matches!(self, Error::ScanFailed { .. } | Error::UploadFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
