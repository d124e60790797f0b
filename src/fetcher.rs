//! Retrieval of previously published CVE reports.
//!
//! Reports live in a static bucket keyed by edition, version and image:
//! `<bucket>/<edition dir>/<version>/<image>_cve_report.docgen`.
//! Older releases may have no report, so a 404 is answered with the
//! [`NO_SCAN_FOUND`] placeholder instead of an error.

use crate::error::{Error, Result};
use crate::model::{Edition, ReleaseTag};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Placeholder emitted for images that have no published report.
pub const NO_SCAN_FOUND: &str = "No scan found\n";

/// Default location of the published scan reports.
pub const DEFAULT_BUCKET_URL: &str = "https://storage.googleapis.com/solo-gloo-security-scans";

/// A source of published CVE report documents.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Retrieves the report at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report could not be retrieved. A missing
    /// report is not an error.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpReportFetcher {
    client: reqwest::Client,
}

impl HttpReportFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpReportFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSource for HttpReportFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "Fetched scan report");

        match status {
            StatusCode::OK => Ok(response.text().await?),
            StatusCode::NOT_FOUND => Ok(NO_SCAN_FOUND.to_string()),
            other => Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status: other.as_u16(),
            }),
        }
    }
}

/// Builds the bucket URL of the report for `image` at `tag`.
pub fn report_url(base: &str, edition: Edition, tag: &ReleaseTag, image: &str) -> String {
    format!(
        "{}/{}/{}/{}_cve_report.docgen",
        base.trim_end_matches('/'),
        edition.bucket_dir(),
        tag.unprefixed(),
        image
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response and returns the URL to hit.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/gloo/1.8.2/gateway_cve_report.docgen", addr)
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let url = serve_once("200 OK", "| CVE-2021-3711 | openssl |\n").await;
        let report = HttpReportFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(report, "| CVE-2021-3711 | openssl |\n");
    }

    #[tokio::test]
    async fn test_fetch_not_found_returns_placeholder() {
        let url = serve_once("404 Not Found", "").await;
        let report = HttpReportFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(report, NO_SCAN_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let url = serve_once("503 Service Unavailable", "").await;
        let err = HttpReportFetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/report", addr);
        let err = HttpReportFetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_report_url() {
        let tag = ReleaseTag::parse("v1.8.2").unwrap();
        assert_eq!(
            report_url(DEFAULT_BUCKET_URL, Edition::OpenSource, &tag, "gateway"),
            "https://storage.googleapis.com/solo-gloo-security-scans/gloo/1.8.2/gateway_cve_report.docgen"
        );

        let tag = ReleaseTag::parse("1.7.0").unwrap();
        assert_eq!(
            report_url("http://bucket/", Edition::Enterprise, &tag, "gloo-fed"),
            "http://bucket/glooe/1.7.0/gloo-fed_cve_report.docgen"
        );
    }
}
