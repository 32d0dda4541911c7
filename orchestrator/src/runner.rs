//! Process runner
//!
//! Spawns one external command, drains its stdout and stderr concurrently
//! on two tasks, and pushes every line into the relay as an INFO record.
//! The exit status is never reported before both streams have reached
//! end-of-input. Lines are sanitized to valid UTF-8: invalid byte sequences
//! become the replacement character, they are never dropped.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::OrchestratorError;
use crate::relay::LogSink;

/// One external command to run with captured output
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    deadline: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            deadline: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Human-readable command line, for log records
    pub fn describe(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

/// Outcome of a fully drained subprocess
#[derive(Debug)]
pub struct ExitCapture {
    /// Final exit status
    pub status: ExitStatus,

    /// Every stderr line, kept for failure diagnostics
    pub stderr_lines: Vec<String>,
}

impl ExitCapture {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Collected stderr joined for a one-line failure message
    pub fn stderr_summary(&self) -> String {
        self.stderr_lines.join("; ")
    }
}

/// Run a command to completion, streaming both output streams into `sink`.
///
/// Returns once the process has exited and both drain tasks have finished.
/// When a deadline is set and expires, the child is killed and
/// [`OrchestratorError::Deadline`] is returned after the drains settle.
pub async fn stream_command(
    spec: CommandSpec,
    sink: &LogSink,
) -> Result<ExitCapture, OrchestratorError> {
    debug!("spawning: {}", spec.describe());

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| OrchestratorError::Internal("child stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| OrchestratorError::Internal("child stderr not captured".to_string()))?;

    let collected = Arc::new(Mutex::new(Vec::new()));
    let stdout_task: JoinHandle<()> = tokio::spawn(drain_lines(stdout, sink.clone(), None));
    let stderr_task: JoinHandle<()> =
        tokio::spawn(drain_lines(stderr, sink.clone(), Some(collected.clone())));

    let status = if let Some(limit) = spec.deadline {
        match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                return Err(OrchestratorError::Deadline(limit));
            }
        }
    } else {
        child.wait().await?
    };

    // Completion must not be reported before both streams are fully drained.
    let _ = stdout_task.await;
    let _ = stderr_task.await;

    let stderr_lines = collected.lock().map(|g| g.clone()).unwrap_or_default();

    Ok(ExitCapture {
        status,
        stderr_lines,
    })
}

async fn drain_lines<R>(reader: R, sink: LogSink, collected: Option<Arc<Mutex<Vec<String>>>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = sanitize_line(&buf);
                if let Some(lines) = &collected {
                    if let Ok(mut guard) = lines.lock() {
                        guard.push(line.clone());
                    }
                }
                sink.info(line);
            }
            Err(_) => break,
        }
    }
}

/// Repair a raw output line into valid UTF-8 and strip the line ending
fn sanitize_line(raw: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(raw).into_owned();
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay;
    use botdock_wire::{LogResponse, LogStatus};

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("/bin/sh").arg("-c").arg(script)
    }

    async fn run_and_collect(
        spec: CommandSpec,
    ) -> (Result<ExitCapture, OrchestratorError>, Vec<LogResponse>) {
        let (sink, mut stream) = relay::channel();
        let result = stream_command(spec, &sink).await;
        drop(sink);

        let mut records = Vec::new();
        while let Some(record) = stream.recv().await {
            records.push(record);
        }
        (result, records)
    }

    #[test]
    fn test_sanitize_line() {
        assert_eq!(sanitize_line(b"plain\n"), "plain");
        assert_eq!(sanitize_line(b"crlf\r\n"), "crlf");
        assert_eq!(sanitize_line(b"no newline"), "no newline");
        assert_eq!(sanitize_line(&[0xff, b'x', b'\n']), "\u{FFFD}x");
    }

    #[test]
    fn test_describe() {
        let spec = CommandSpec::new("git").arg("clone").arg("-b").arg("v1");
        assert_eq!(spec.describe(), "git clone -b v1");
    }

    #[tokio::test]
    async fn test_both_streams_fully_captured() {
        let (result, records) =
            run_and_collect(sh("echo out1; echo err1 1>&2; echo out2")).await;

        let capture = result.unwrap();
        assert!(capture.success());
        assert_eq!(capture.stderr_lines, vec!["err1"]);

        let lines: Vec<&str> = records.iter().map(|r| r.line.as_str()).collect();
        assert!(lines.contains(&"out1"));
        assert!(lines.contains(&"out2"));
        assert!(lines.contains(&"err1"));
        assert!(records.iter().all(|r| r.status == LogStatus::Info));

        // stdout order is preserved relative to itself
        let out1 = lines.iter().position(|l| *l == "out1").unwrap();
        let out2 = lines.iter().position(|l| *l == "out2").unwrap();
        assert!(out1 < out2);
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported_after_drain() {
        let (result, records) = run_and_collect(sh("echo last words; exit 3")).await;

        let capture = result.unwrap();
        assert!(!capture.success());
        assert_eq!(capture.status.code(), Some(3));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, "last words");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_repaired_not_dropped() {
        let (result, records) = run_and_collect(sh(r"printf '\277bad\n'")).await;

        assert!(result.unwrap().success());
        assert_eq!(records.len(), 1);
        assert!(records[0].line.contains('\u{FFFD}'));
        assert!(records[0].line.contains("bad"));
    }

    #[tokio::test]
    async fn test_deadline_kills_hung_child() {
        let spec = sh("sleep 30").deadline(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let (result, _) = run_and_collect(spec).await;

        assert!(matches!(result, Err(OrchestratorError::Deadline(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
