//! Release image scanning.
//!
//! [`ScanOrchestrator`] runs the vulnerability scanner against every image
//! of every release in both [`ReportFormat`]s and uploads each result to
//! code scanning. Work is strictly sequential: per tag, per format, per
//! image, in input order.
//!
//! Results are laid out as
//! `<scan dir>/<suffix>/<format>_results/<tag>/<file>`.
//!
//! An image that was never published is skipped. Any other scanner or
//! upload failure ends the run.

mod process;
mod trivy;
mod upload;

pub use process::{CommandOutput, CommandRunner, SystemRunner};
pub use trivy::{is_image_not_found, ScanOutcome, TrivyScan};
pub use upload::{tag_ref, CodeScanningUpload};

use crate::config::{Config, IMAGE_REPO_ENV, SCAN_DIR_ENV};
use crate::error::{Error, Result};
use crate::model::ReportFormat;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Scan configuration, validated once before any work starts.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub scan_dir: PathBuf,
    pub image_repo: String,
    pub scanner: String,
    pub severities: Vec<String>,
    pub markdown_template: String,
    pub sarif_template: String,
    pub upload: Option<UploadSettings>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub codeql: String,
    pub repository: String,
    pub use_sudo: bool,
}

impl ScanSettings {
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if the scan directory or the image
    /// repository is not set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let scan_dir = config
            .scan
            .scan_dir
            .clone()
            .ok_or(Error::MissingConfig(SCAN_DIR_ENV))?;
        let image_repo = config
            .scan
            .image_repo
            .clone()
            .filter(|repo| !repo.is_empty())
            .ok_or(Error::MissingConfig(IMAGE_REPO_ENV))?;

        let upload = config.upload.enabled.then(|| UploadSettings {
            codeql: config.upload.codeql.clone(),
            repository: config.upload.repository.clone(),
            use_sudo: config.upload.use_sudo,
        });

        Ok(Self {
            scan_dir,
            image_repo: image_repo.trim_end_matches('/').to_string(),
            scanner: config.scan.scanner.clone(),
            severities: config.scan.severities.clone(),
            markdown_template: config.scan.markdown_template.clone(),
            sarif_template: config.scan.sarif_template.clone(),
            upload,
        })
    }

    fn template(&self, format: ReportFormat) -> &str {
        match format {
            ReportFormat::Markdown => &self.markdown_template,
            ReportFormat::Sarif => &self.sarif_template,
        }
    }
}

/// Counts of what a scan run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub skipped: usize,
    pub uploaded: usize,
}

pub struct ScanOrchestrator<R> {
    settings: ScanSettings,
    runner: R,
}

impl<R: CommandRunner> ScanOrchestrator<R> {
    pub fn new(settings: ScanSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    /// Full reference of `image` at `tag` in the configured registry.
    pub fn image_ref(&self, image: &str, tag: &str) -> String {
        format!("{}/{}:{}", self.settings.image_repo, image, tag)
    }

    /// Scans every image of every tag and uploads the results.
    ///
    /// # Errors
    ///
    /// Returns an error if a results directory cannot be created, or on
    /// the first scan or upload failure other than a missing image.
    pub fn run(&self, tags: &[String], images: &[String], suffix: &str) -> Result<ScanSummary> {
        let root = self.settings.scan_dir.join(suffix);
        for format in ReportFormat::ALL {
            let dir = root.join(format.results_dir());
            fs::create_dir_all(&dir).map_err(|e| Error::io("error creating dir", &dir, e))?;
        }

        let mut summary = ScanSummary::default();
        for tag in tags {
            info!(version = %tag, "Scanning version");
            for format in ReportFormat::ALL {
                let dir = root.join(format.results_dir()).join(tag);
                fs::create_dir_all(&dir).map_err(|e| Error::io("error creating dir", &dir, e))?;

                for image in images {
                    self.scan_image(&dir, format, image, tag, &mut summary)?;
                }
            }
        }

        info!(
            scanned = summary.scanned,
            skipped = summary.skipped,
            uploaded = summary.uploaded,
            "Scan run complete"
        );
        Ok(summary)
    }

    fn scan_image(
        &self,
        dir: &Path,
        format: ReportFormat,
        image: &str,
        tag: &str,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        let output = dir.join(format.file_name(tag, image));
        fs::File::create(&output)
            .map_err(|e| Error::io("unable to create scan output file", &output, e))?;

        let image_ref = self.image_ref(image, tag);
        let scan = TrivyScan {
            program: &self.settings.scanner,
            severities: &self.settings.severities,
            template: self.settings.template(format),
            output: &output,
            image: &image_ref,
            version: tag,
        };

        match scan.run(&self.runner)? {
            ScanOutcome::ImageMissing => {
                summary.skipped += 1;
                return Ok(());
            }
            ScanOutcome::Scanned => summary.scanned += 1,
        }

        if let Some(upload) = &self.settings.upload {
            CodeScanningUpload {
                codeql: &upload.codeql,
                repository: &upload.repository,
                use_sudo: upload.use_sudo,
            }
            .upload(&self.runner, &output, tag)?;
            summary.uploaded += 1;
        }
        Ok(())
    }
}
