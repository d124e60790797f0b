use super::process::CommandRunner;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Substring the scanner prints when the target image was never published.
const IMAGE_NOT_FOUND_MARKER: &str = "No such image: ";

/// Returns true if scanner logs show the image does not exist.
pub fn is_image_not_found(logs: &str) -> bool {
    logs.contains(IMAGE_NOT_FOUND_MARKER)
}

/// Outcome of a single scanner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The report was written to the output file.
    Scanned,
    /// The image does not exist; the output file was removed.
    ImageMissing,
}

/// Invocation parameters for the vulnerability scanner.
pub struct TrivyScan<'a> {
    pub program: &'a str,
    pub severities: &'a [String],
    pub template: &'a str,
    pub output: &'a Path,
    pub image: &'a str,
    pub version: &'a str,
}

impl TrivyScan<'_> {
    pub fn args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "--severity".to_string(),
            self.severities.join(","),
            "--format".to_string(),
            "template".to_string(),
            "--template".to_string(),
            self.template.to_string(),
            "--output".to_string(),
            self.output.display().to_string(),
            self.image.to_string(),
        ]
    }

    /// Runs the scan, treating a missing image as a skip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanFailed`] for any other scanner failure.
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<ScanOutcome> {
        debug!(image = self.image, output = %self.output.display(), "Running scanner");

        let output = match runner.run(self.program, &self.args()) {
            Ok(output) => output,
            Err(e) => {
                let _ = fs::remove_file(self.output);
                return Err(self.failed(format!("failed to launch {}: {}", self.program, e)));
            }
        };

        if output.success {
            return Ok(ScanOutcome::Scanned);
        }

        // the scanner may leave an empty output file behind
        let _ = fs::remove_file(self.output);

        let logs = output.combined();
        if is_image_not_found(&logs) {
            warn!(image = self.image, "Image not found, skipping");
            return Ok(ScanOutcome::ImageMissing);
        }

        Err(self.failed(logs))
    }

    fn failed(&self, logs: String) -> Error {
        Error::ScanFailed {
            image: self.image.to_string(),
            version: self.version.to_string(),
            logs,
        }
    }
}
