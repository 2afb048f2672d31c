// src/process.rs

//! Bounded execution of external tools
//!
//! VCS backends and the toolchain installer both shell out. Every child runs
//! with stdin closed and a deadline; a child that outlives it is killed.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Failure of an external command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed with exit code {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("'{command}' timed out after {secs} seconds")]
    TimedOut { command: String, secs: u64 },

    #[error("I/O error waiting for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one program with a deadline
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    timeout: Duration,
    env: Vec<(String, String)>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            env: Vec::new(),
        }
    }

    /// Add an environment variable to every invocation
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Locate the program on PATH
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    /// Run with `args` inside `cwd`, returning trimmed stdout
    pub fn run<S: AsRef<OsStr>>(&self, cwd: Option<&Path>, args: &[S]) -> Result<String, CommandError> {
        let command_line = self.describe(args);
        debug!("Executing: {}", command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Drain both pipes while waiting; a child blocked on a full pipe
        // would otherwise sit until the deadline.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let waited = match child.wait_timeout(self.timeout) {
            Ok(waited) => waited,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Wait {
                    command: command_line,
                    source,
                });
            }
        };

        let Some(status) = waited else {
            warn!("'{}' exceeded {}s, killing", command_line, self.timeout.as_secs());
            let _ = child.kill();
            let _ = child.wait();
            // Readers are left detached: a grandchild may still hold the pipes.
            return Err(CommandError::TimedOut {
                command: command_line,
                secs: self.timeout.as_secs(),
            });
        };

        let stdout = collect(stdout, &command_line)?;
        let stderr = collect(stderr, &command_line)?;
        if status.success() {
            Ok(stdout.trim().to_string())
        } else {
            Err(CommandError::Failed {
                command: command_line,
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }

    fn describe<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.as_ref().to_string_lossy());
        }
        line
    }
}

type Drain = Option<JoinHandle<io::Result<Vec<u8>>>>;

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain, command: &str) -> Result<String, CommandError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| CommandError::Wait {
            command: command.to_string(),
            source: io::Error::other("output reader panicked"),
        })?
        .map_err(|source| CommandError::Wait {
            command: command.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let runner = CommandRunner::new("sh", Duration::from_secs(10));
        let out = runner.run(None, &["-c", "echo hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_failure_carries_exit_code_and_stderr() {
        let runner = CommandRunner::new("sh", Duration::from_secs(10));
        let err = runner.run(None, &["-c", "echo broken >&2; exit 3"]).unwrap_err();
        match err {
            CommandError::Failed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_large_stderr_is_reported_as_failure() {
        let runner = CommandRunner::new("sh", Duration::from_secs(20));
        let err = runner
            .run(None, &["-c", "head -c 200000 /dev/zero | tr '\\0' x >&2; exit 1"])
            .unwrap_err();
        match err {
            CommandError::Failed { code, stderr, .. } => {
                assert_eq!(code, 1);
                assert_eq!(stderr.len(), 200_000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_large_stdout_is_captured() {
        let runner = CommandRunner::new("sh", Duration::from_secs(20));
        let out = runner
            .run(None, &["-c", "head -c 150000 /dev/zero | tr '\\0' y"])
            .unwrap();
        assert_eq!(out.len(), 150_000);
    }

    #[test]
    fn test_timeout_kills_child() {
        let runner = CommandRunner::new("sh", Duration::from_millis(200));
        let err = runner.run(None, &["-c", "sleep 5"]).unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }

    #[test]
    fn test_missing_program() {
        let runner = CommandRunner::new("gopkg-definitely-not-a-program", Duration::from_secs(1));
        assert!(runner.locate().is_none());
        let err = runner.run::<&str>(None, &[]).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_env_is_passed() {
        let runner = CommandRunner::new("sh", Duration::from_secs(10)).with_env("GOPKG_PROBE", "42");
        let out = runner.run(None, &["-c", "echo $GOPKG_PROBE"]).unwrap();
        assert_eq!(out, "42");
    }
}
