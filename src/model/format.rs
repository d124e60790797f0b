use serde::{Deserialize, Serialize};

/// Output formats the scanner is run in for every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown fragment published alongside the release docs
    Markdown,
    /// SARIF document for code-scanning upload
    Sarif,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 2] = [ReportFormat::Markdown, ReportFormat::Sarif];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "markdown",
            ReportFormat::Sarif => "sarif",
        }
    }

    /// Name of the directory that collects results of this format.
    pub fn results_dir(&self) -> String {
        format!("{}_results", self.as_str())
    }

    /// File name of the scan output for one image at one release.
    pub fn file_name(&self, tag: &str, image: &str) -> String {
        match self {
            ReportFormat::Markdown => format!("{}_cve_report.docgen", image),
            ReportFormat::Sarif => format!("{}_{}_cve_report.sarif", tag, image),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(
            ReportFormat::Markdown.file_name("1.8.2", "gateway"),
            "gateway_cve_report.docgen"
        );
        assert_eq!(
            ReportFormat::Sarif.file_name("1.8.2", "gateway"),
            "1.8.2_gateway_cve_report.sarif"
        );
    }

    #[test]
    fn test_results_dir() {
        assert_eq!(ReportFormat::Markdown.results_dir(), "markdown_results");
        assert_eq!(ReportFormat::Sarif.results_dir(), "sarif_results");
    }
}
