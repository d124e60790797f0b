use super::process::CommandRunner;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Git ref of a release tag; release tags in git always carry a `v`.
pub fn tag_ref(version: &str) -> String {
    format!("refs/tags/v{}", version.trim_start_matches(['v', 'V']))
}

/// Uploads scan results to code scanning through the CodeQL CLI.
pub struct CodeScanningUpload<'a> {
    pub codeql: &'a str,
    pub repository: &'a str,
    pub use_sudo: bool,
}

impl CodeScanningUpload<'_> {
    /// Resolves the release commit and uploads `file` against it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadFailed`] if the tag cannot be resolved or the
    /// upload exits non-zero.
    pub fn upload(&self, runner: &dyn CommandRunner, file: &Path, version: &str) -> Result<()> {
        let git_ref = tag_ref(version);
        let commit = self.resolve_commit(runner, file, &git_ref)?;

        let (program, args) = self.command(file, &git_ref, &commit);
        debug!(file = %file.display(), git_ref = %git_ref, commit = %commit, "Uploading scan results");

        let output = runner
            .run(&program, &args)
            .map_err(|e| launch_failed(file, &program, e))?;

        if !output.success {
            return Err(Error::UploadFailed {
                file: file.to_path_buf(),
                logs: output.combined(),
            });
        }
        Ok(())
    }

    fn resolve_commit(&self, runner: &dyn CommandRunner, file: &Path, git_ref: &str) -> Result<String> {
        let output = runner
            .run("git", &["rev-parse".to_string(), git_ref.to_string()])
            .map_err(|e| launch_failed(file, "git", e))?;

        let commit = output.stdout.trim();
        if !output.success || commit.is_empty() {
            return Err(Error::UploadFailed {
                file: file.to_path_buf(),
                logs: format!("could not resolve {}: {}", git_ref, output.combined().trim()),
            });
        }
        Ok(commit.to_string())
    }

    /// Builds the upload invocation as `(program, args)`.
    pub fn command(&self, file: &Path, git_ref: &str, commit: &str) -> (String, Vec<String>) {
        let mut args = vec![
            "github".to_string(),
            "upload-results".to_string(),
            format!("--sarif={}", file.display()),
            format!("--repository={}", self.repository),
            format!("--ref={}", git_ref),
            format!("--commit={}", commit),
        ];

        if self.use_sudo {
            args.insert(0, self.codeql.to_string());
            ("sudo".to_string(), args)
        } else {
            (self.codeql.to_string(), args)
        }
    }
}

fn launch_failed(file: &Path, program: &str, source: std::io::Error) -> Error {
    Error::UploadFailed {
        file: file.to_path_buf(),
        logs: format!("failed to launch {}: {}", program, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ref() {
        assert_eq!(tag_ref("1.8.2"), "refs/tags/v1.8.2");
        assert_eq!(tag_ref("v1.8.2"), "refs/tags/v1.8.2");
    }

    #[test]
    fn test_command_with_sudo() {
        let upload = CodeScanningUpload {
            codeql: "/usr/local/bin/codeql/codeql",
            repository: "solo-io/gloo",
            use_sudo: true,
        };
        let (program, args) = upload.command(Path::new("/s/a.sarif"), "refs/tags/v1.8.2", "abc123");

        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec![
                "/usr/local/bin/codeql/codeql",
                "github",
                "upload-results",
                "--sarif=/s/a.sarif",
                "--repository=solo-io/gloo",
                "--ref=refs/tags/v1.8.2",
                "--commit=abc123",
            ]
        );
    }

    #[test]
    fn test_command_without_sudo() {
        let upload = CodeScanningUpload {
            codeql: "codeql",
            repository: "org/repo",
            use_sudo: false,
        };
        let (program, args) = upload.command(Path::new("r.sarif"), "refs/tags/v2.0.0", "f00");
        assert_eq!(program, "codeql");
        assert_eq!(args[0], "github");
    }
}
