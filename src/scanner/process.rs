use std::io;
use std::process::Command;

/// Captured result of an external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr, as used for error diagnosis.
    pub fn combined(&self) -> String {
        let mut logs = self.stdout.clone();
        logs.push_str(&self.stderr);
        logs
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Runs `program` with `args` and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started. A
    /// non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs programs on the host with [`std::process::Command`].
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            success: false,
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_exit_status() {
        let ok = SystemRunner
            .run("sh", &["-c".to_string(), "echo hello".to_string()])
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.stdout, "hello\n");

        let failed = SystemRunner
            .run("sh", &["-c".to_string(), "echo oops >&2; exit 3".to_string()])
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.stderr, "oops\n");
    }

    #[test]
    fn test_system_runner_missing_program() {
        assert!(SystemRunner
            .run("relscan-no-such-program", &[])
            .is_err());
    }
}
