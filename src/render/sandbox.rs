//! Per-attempt isolated execution of generated code and markup.
//!
//! Every job gets a fresh temporary directory that is removed when the job
//! finishes, whether it succeeded, failed, timed out or was dropped.

use std::io;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Stderr kept in error messages, in characters from the end.
const STDERR_TAIL_CHARS: usize = 600;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("execution timed out after {0}ms")]
    Timeout(u64),

    #[error("process exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("no output file '{0}' was produced")]
    MissingOutput(String),

    #[error("output is not a usable image: {0}")]
    InvalidImage(String),
}

/// One program run against one generated source file.
///
/// `{input}` and `{output}` in `args` are replaced with `source_file` and
/// `output_file`; both are relative to the job directory, which is also the
/// working directory.
#[derive(Debug, Clone)]
pub struct SandboxJob<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub source_file: &'a str,
    pub source: &'a str,
    pub output_file: &'a str,
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    timeout: Duration,
}

impl Sandbox {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `job` and return the bytes of its output file.
    pub async fn run(&self, job: &SandboxJob<'_>) -> Result<Vec<u8>, SandboxError> {
        let dir = tempfile::Builder::new().prefix("plotwise-").tempdir()?;
        tokio::fs::write(dir.path().join(job.source_file), job.source).await?;

        let args: Vec<String> = job
            .args
            .iter()
            .map(|a| {
                a.replace("{input}", job.source_file)
                    .replace("{output}", job.output_file)
            })
            .collect();

        let mut command = Command::new(job.program);
        command
            .args(&args)
            .current_dir(dir.path())
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in ["PATH", "HOME"] {
            if let Ok(value) = std::env::var(key) {
                command.env(key, value);
            }
        }
        command
            .env("MPLBACKEND", "Agg")
            .env("MPLCONFIGDIR", dir.path());

        let child = command.spawn().map_err(|source| SandboxError::Spawn {
            program: job.program.to_string(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(SandboxError::Timeout(self.timeout.as_millis() as u64)),
        };

        if !output.status.success() {
            return Err(SandboxError::NonZeroExit {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let bytes = match tokio::fs::read(dir.path().join(job.output_file)).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Err(SandboxError::MissingOutput(job.output_file.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SandboxError::MissingOutput(job.output_file.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            program = job.program,
            output_bytes = bytes.len(),
            "Sandbox job finished"
        );
        Ok(bytes)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    let skip = count - STDERR_TAIL_CHARS;
    format!("...{}", text.chars().skip(skip).collect::<String>())
}
