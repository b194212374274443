//! Running the `skopeo` binary and capturing its output.

use std::path::Path;
use std::process::Stdio;

use imgsync_common::error::{ImgsyncError, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Output from one `skopeo` invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code returned by the command, `-1` if killed by a signal.
    pub exit_code: i32,
}

impl ExecOutput {
    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stderr, falling back to stdout when stderr is empty.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs `program` with `args`, optionally feeding `stdin`.
///
/// A non-zero exit is not an error here; callers inspect
/// [`ExecOutput::exit_code`].
///
/// # Errors
///
/// Returns [`ImgsyncError::Io`] if the program cannot be spawned or its
/// stdin cannot be written.
pub async fn run(program: &Path, args: &[String], stdin: Option<&str>) -> Result<ExecOutput> {
    let io_error = |source: std::io::Error| ImgsyncError::Io {
        path: program.to_path_buf(),
        source,
    };

    tracing::debug!(program = %program.display(), ?args, "running");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(io_error)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes()).await.map_err(io_error)?;
        // closing stdin lets the child see EOF
        drop(pipe);
    }

    let output = child.wait_with_output().await.map_err(io_error)?;

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
