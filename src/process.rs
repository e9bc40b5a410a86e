//! Blocking subprocess invocation for `git` and the test runner.
//!
//! [`CommandRunner`] is the seam between the metric adapters and the
//! operating system; tests substitute canned output for real processes.

use crate::errors::{Error, Result};
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully constructed external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs a command to completion and returns its stdout.
pub trait CommandRunner: Sync {
    fn run(&self, spec: &CommandSpec) -> Result<Vec<u8>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<Vec<u8>> {
        let command = spec.to_string();
        log::debug!("Running command: {} (in {})", command, spec.cwd.display());

        let program = which::which(&spec.program).map_err(|e| Error::Spawn {
            command: command.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, e.to_string()),
        })?;

        let mut child = Command::new(program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match spec.timeout {
            Some(timeout) => match wait_with_timeout(&mut child, timeout)? {
                Some(status) => status,
                None => return Err(Error::Timeout { command, timeout }),
            },
            None => child.wait()?,
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::CommandFailed {
                command,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buffer) {
                log::warn!("Failed to read child output: {}", e);
            }
        }
        buffer
    })
}

/// Poll until the child exits or `timeout` elapses; `None` means it was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            log::warn!("Process killed after {:?}", timeout);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("git", Path::new("."))
            .args(["log", "--numstat"])
            .arg("--since=2024-01-01");
        assert_eq!(spec.to_string(), "git log --numstat --since=2024-01-01");
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("riskmap-definitely-not-installed", Path::new("."));
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let spec = CommandSpec::new("sh", Path::new(".")).args(["-c", "printf hello"]);
        assert_eq!(SystemRunner.run(&spec).unwrap(), b"hello".to_vec());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_attaches_stderr() {
        let spec = CommandSpec::new("sh", Path::new(".")).args(["-c", "echo boom >&2; exit 3"]);
        match SystemRunner.run(&spec).unwrap_err() {
            Error::CommandFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_the_process() {
        let spec = CommandSpec::new("sleep", Path::new("."))
            .arg("5")
            .timeout(Some(Duration::from_millis(100)));
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
