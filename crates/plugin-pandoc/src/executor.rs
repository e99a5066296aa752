//! Child process execution for the converter.
//!
//! Every invocation is bounded by a deadline and a cancellation token. The
//! child is spawned with `kill_on_drop`, its pipes are owned by the
//! exchange future, and on timeout or cancellation the child is killed and
//! reaped before returning, so no process or pipe outlives the call.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PandocError;

/// Captured result of a finished converter process.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Everything the process wrote to stdout.
    pub stdout: Vec<u8>,
    /// Everything the process wrote to stderr.
    pub stderr: Vec<u8>,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Stderr decoded lossily, for diagnostics.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a non-zero exit into an error.
    pub fn check_status(&self) -> Result<(), PandocError> {
        if self.status.success() {
            return Ok(());
        }
        match self.status.code() {
            Some(code) => Err(PandocError::ConverterFailed {
                code,
                stderr: self.stderr_lossy().chars().take(2000).collect(),
            }),
            None => Err(PandocError::ConverterKilled),
        }
    }
}

enum Race {
    Finished(std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)>),
    TimedOut,
    Cancelled,
}

/// Runs the converter executable.
#[derive(Debug, Clone)]
pub struct ConverterExecutor {
    /// Executable name or path.
    executable: String,
}

impl ConverterExecutor {
    /// Create an executor for `executable`.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// The configured executable.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Run the converter with `args`, feeding `input` to its stdin.
    ///
    /// Stdin is written and closed while stdout and stderr are drained, so
    /// large documents cannot deadlock on a full pipe. The exit status is
    /// returned as-is; use [`ProcessOutput::check_status`] to reject
    /// failures.
    pub async fn run(
        &self,
        args: &[String],
        input: Option<&[u8]>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, PandocError> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        debug!(
            executable = %self.executable,
            args = ?args,
            timeout_ms = timeout.as_millis() as u64,
            "Spawning converter process"
        );

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PandocError::ConverterNotFound {
                    executable: self.executable.clone(),
                }
            } else {
                PandocError::Io(e)
            }
        })?;

        // Race: process exchange vs timeout vs cancellation
        let race = tokio::select! {
            result = exchange(&mut child, input) => Race::Finished(result),
            _ = tokio::time::sleep(timeout) => Race::TimedOut,
            _ = cancel.cancelled() => Race::Cancelled,
        };

        match race {
            Race::Finished(result) => {
                let (status, stdout, stderr) = result?;
                Ok(ProcessOutput {
                    status,
                    stdout,
                    stderr,
                    elapsed: start.elapsed(),
                })
            }
            Race::TimedOut => {
                warn!(
                    executable = %self.executable,
                    timeout_ms = timeout.as_millis() as u64,
                    "Converter process timed out, killing"
                );
                reap(&mut child).await;
                Err(PandocError::ConverterTimeout { timeout })
            }
            Race::Cancelled => {
                debug!(executable = %self.executable, "Conversion cancelled, killing converter");
                reap(&mut child).await;
                Err(PandocError::Cancelled)
            }
        }
    }
}

/// Feed stdin, drain stdout and stderr, then wait for exit.
async fn exchange(
    child: &mut Child,
    input: Option<&[u8]>,
) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let write = async move {
        if let (Some(mut pipe), Some(data)) = (stdin, input) {
            match pipe.write_all(data).await {
                Ok(()) => pipe.shutdown().await?,
                // The child stopped reading; its exit status tells the rest.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("Converter closed stdin before all input was written");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    };

    let (written, stdout, stderr) = tokio::join!(write, drain(stdout), drain(stderr));
    written?;
    let stdout = stdout?;
    let stderr = stderr?;

    let status = child.wait().await?;
    Ok((status, stdout, stderr))
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill converter process");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::fake_converter;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_pipes_input_through() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_converter(dir.path(), "tr a-z A-Z");
        let executor = ConverterExecutor::new(exe.to_string_lossy());

        let output = executor
            .run(
                &args(&["-tlatex"]),
                Some(b"hello world"),
                Duration::from_secs(5),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"HELLO WORLD");
        assert!(output.check_status().is_ok());
    }

    #[tokio::test]
    async fn test_large_input_does_not_deadlock() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_converter(dir.path(), "cat");
        let executor = ConverterExecutor::new(exe.to_string_lossy());
        let input = "<p>paragraph</p>\n".repeat(64 * 1024);

        let output = executor
            .run(
                &[],
                Some(input.as_bytes()),
                Duration::from_secs(10),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(output.stdout.len(), input.len());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_converter(dir.path(), "cat >/dev/null; echo 'unknown writer' >&2; exit 3");
        let executor = ConverterExecutor::new(exe.to_string_lossy());

        let output = executor
            .run(&[], Some(b"<p/>"), Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();

        match output.check_status() {
            Err(PandocError::ConverterFailed { code, stderr }) => {
                assert_eq!(code, 3);
                assert!(stderr.contains("unknown writer"));
            }
            other => panic!("expected ConverterFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_converter(dir.path(), "exec sleep 30");
        let executor = ConverterExecutor::new(exe.to_string_lossy());

        let start = Instant::now();
        let result = executor
            .run(&[], None, Duration::from_millis(200), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(PandocError::ConverterTimeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancellation_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_converter(dir.path(), "exec sleep 30");
        let executor = ConverterExecutor::new(exe.to_string_lossy());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = executor
            .run(&[], None, Duration::from_secs(30), &cancel)
            .await;

        assert!(matches!(result, Err(PandocError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let executor = ConverterExecutor::new("/nonexistent/bin/pandoc");
        let result = executor
            .run(&[], None, Duration::from_secs(1), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PandocError::ConverterNotFound { .. })));
    }
}
