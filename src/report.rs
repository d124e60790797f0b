//! Composite CVE report for a list of releases.
//!
//! Tags are expected newest first. The first tag of every minor-version
//! group gets a "latest" heading; the remaining tags of that group are
//! folded into `<details>` blocks beneath it. The builder never re-sorts,
//! so output order always matches input order.

use crate::error::{Error, Result};
use crate::fetcher::{report_url, ReportSource};
use crate::model::{Edition, ReleaseTag};
use std::io::Write;
use tracing::debug;

pub struct ReportBuilder<S> {
    source: S,
    edition: Edition,
    bucket_url: String,
}

impl<S: ReportSource> ReportBuilder<S> {
    pub fn new(source: S, edition: Edition, bucket_url: impl Into<String>) -> Self {
        Self {
            source,
            edition,
            bucket_url: bucket_url.into(),
        }
    }

    /// Writes the report for `tags` to `out` as it goes.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed tag, failed fetch or failed write.
    /// Whatever was written before the failure stays written.
    pub async fn write_report<W: Write>(&self, tags: &[String], out: &mut W) -> Result<()> {
        let mut current_line: Option<(u64, u64)> = None;

        for raw in tags {
            let tag = ReleaseTag::parse(raw)?;
            let line = tag.minor_line();

            if current_line != Some(line) {
                debug!(tag = %tag, "Starting minor-version group");
                write!(
                    out,
                    "\n***Latest {}.{}.x {} Release: {}***\n\n",
                    line.0,
                    line.1,
                    self.edition.display_name(),
                    tag
                )
                .map_err(write_error)?;
                self.write_images(&tag, out).await?;
                current_line = Some(line);
            } else {
                write!(out, "<details><summary>{}</summary>\n\n", self.summary(&tag)).map_err(write_error)?;
                self.write_images(&tag, out).await?;
                writeln!(out, "</details>").map_err(write_error)?;
            }
        }

        Ok(())
    }

    /// Renders the whole report into a string.
    pub async fn build(&self, tags: &[String]) -> Result<String> {
        let mut buf = Vec::new();
        self.write_report(tags, &mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn summary(&self, tag: &ReleaseTag) -> String {
        match self.edition {
            Edition::OpenSource => format!(" Release {} ", tag),
            Edition::Enterprise => format!("Release {} ", tag),
        }
    }

    async fn write_images<W: Write>(&self, tag: &ReleaseTag, out: &mut W) -> Result<()> {
        for image in self.edition.images_for(tag.version()) {
            write!(out, "**{} {} image**\n\n", self.edition.image_label(), image).map_err(write_error)?;
            let url = report_url(&self.bucket_url, self.edition, tag, image);
            let report = self.source.fetch(&url).await?;
            write!(out, "{}\n\n", report).map_err(write_error)?;
        }
        Ok(())
    }
}

fn write_error(source: std::io::Error) -> Error {
    Error::io("failed to write report", "<output>", source)
}
