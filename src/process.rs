//! Time-bounded subprocess execution for external tools and CLI providers.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished or killed subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    /// `None` when the process could not be reaped after a kill.
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("`{program}` is not installed or not on PATH")]
    NotFound { program: String },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `command`, feeding `stdin` if given, and kill it once `timeout` elapses.
///
/// Output is drained on background threads so a chatty child can never block
/// on a full pipe while we poll for exit.
pub fn run_with_timeout(
    command: &mut Command,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();

    let mut child = command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ProcessError::NotFound {
                    program: program.clone(),
                }
            } else {
                ProcessError::Spawn {
                    program: program.clone(),
                    source,
                }
            }
        })?;

    let stdin_handle = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_owned();
            Some(thread::spawn(move || {
                // The child may exit without reading everything
                let _ = pipe.write_all(input.as_bytes());
            }))
        }
        _ => None,
    };

    let stdout_handle = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_handle = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            buf
        })
    });

    let start = Instant::now();
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    debug!("`{}` exceeded {:?}, killing", program, timeout);
                    timed_out = true;
                    break kill_and_reap(&mut child);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                kill_and_reap(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
    };

    if let Some(handle) = stdin_handle {
        let _ = handle.join();
    }
    let stdout = stdout_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    Ok(CommandOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
    })
}

/// Kill `child` and wait for it so no process outlives the call.
fn kill_and_reap(child: &mut Child) -> Option<ExitStatus> {
    let _ = child.kill();
    child.wait().ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let output = run_with_timeout(
            Command::new("sh").args(["-c", "echo hello; echo oops >&2"]),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_feeds_stdin() {
        let output =
            run_with_timeout(&mut Command::new("cat"), Some("piped input"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(output.stdout, "piped input");
    }

    #[test]
    fn test_kills_on_timeout() {
        let output = run_with_timeout(
            Command::new("sleep").arg("5"),
            None,
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[test]
    fn test_kill_and_reap_leaves_no_running_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let started = Instant::now();
        let status = kill_and_reap(&mut child).unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_missing_program() {
        let err = run_with_timeout(
            &mut Command::new("definitely-not-a-real-binary-xyz"),
            None,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }
}
