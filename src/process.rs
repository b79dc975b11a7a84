//! Spawning the Bitwarden CLI.
//!
//! Each call to `bw` is described by an [`Invocation`] and executed by a
//! [`CommandRunner`]. Credentials travel through a per-invocation environment
//! overlay; credential variables an invocation does not set are stripped from
//! the inherited environment, so nothing leaks from one step into the next.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use zeroize::Zeroize;

/// API key client id read by `bw login --apikey`.
pub const CLIENT_ID_VAR: &str = "BW_CLIENTID";
/// API key client secret read by `bw login --apikey`.
pub const CLIENT_SECRET_VAR: &str = "BW_CLIENTSECRET";
/// Master password read by `bw unlock --passwordenv`.
pub const PASSWORD_VAR: &str = "BW_PASSWORD";
/// Session token read by every authenticated `bw` command.
pub const SESSION_VAR: &str = "BW_SESSION";

/// Variables that only reach a child when its invocation sets them.
pub const SCOPED_VARS: &[&str] = &[CLIENT_ID_VAR, CLIENT_SECRET_VAR, PASSWORD_VAR, SESSION_VAR];

/// Failure to run a process at all. A process that ran and exited non-zero
/// is not an error at this level; see [`CommandOutput::success`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// One external command: program, arguments and environment overlay.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
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

    /// Set a variable in this invocation's environment overlay.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    pub fn env_overlay(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Scoped credential variables this invocation leaves unset; these are
    /// removed from the inherited environment before spawning.
    pub fn removed_vars(&self) -> impl Iterator<Item = &'static str> + '_ {
        SCOPED_VARS
            .iter()
            .copied()
            .filter(|var| !self.env.contains_key(*var))
    }

    /// Program and arguments joined by spaces. Never includes env values.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for Invocation {
    fn drop(&mut self) {
        for value in self.env.values_mut() {
            value.zeroize();
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Whether stdout or stderr contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.stderr.contains(needle) || self.stdout.contains(needle)
    }

    /// A single line describing why the command failed.
    ///
    /// Only the first non-empty line is kept; `bw` prints stack traces and
    /// file paths further down.
    pub fn failure_message(&self) -> String {
        first_line(&self.stderr)
            .or_else(|| first_line(&self.stdout))
            .map(str::to_string)
            .unwrap_or_else(|| match self.exit_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            })
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes invocations. Implemented by [`ProcessRunner`] for real processes
/// and by scripted runners in tests.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<CommandOutput, ProcessError>> + Send;
}

/// Runs invocations as child processes via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for var in invocation.removed_vars() {
            cmd.env_remove(var);
        }
        cmd.envs(invocation.env_overlay());
        cmd
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        let command = invocation.display();
        debug!(command = %command, "spawning process");

        let child = Self::command(invocation)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command.clone(),
                source,
            })?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ProcessError::Timeout {
                    command: command.clone(),
                    timeout: limit,
                })?,
            None => wait.await,
        }
        .map_err(|source| ProcessError::Wait {
            command: command.clone(),
            source,
        })?;

        let output = CommandOutput::from(output);
        debug!(command = %command, exit_code = ?output.exit_code, "process finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_excludes_environment() {
        let inv = Invocation::new("bw")
            .args(["unlock", "--raw"])
            .env(PASSWORD_VAR, "hunter2");
        assert_eq!(inv.display(), "bw unlock --raw");
        assert!(!format!("{inv:?}").contains("hunter2"));
        assert_eq!(inv.env_value(PASSWORD_VAR), Some("hunter2"));
    }

    #[test]
    fn test_removed_vars_skips_explicit_overlay() {
        let inv = Invocation::new("bw").env(SESSION_VAR, "token");
        let removed: Vec<_> = inv.removed_vars().collect();
        assert_eq!(removed, vec![CLIENT_ID_VAR, CLIENT_SECRET_VAR, PASSWORD_VAR]);
    }

    #[test]
    fn test_failure_message_prefers_stderr() {
        let output = CommandOutput {
            exit_code: Some(1),
            stdout: "ignored\n".to_string(),
            stderr: "\n  Invalid master password.\n    at stack frame\n".to_string(),
        };
        assert_eq!(output.failure_message(), "Invalid master password.");
        assert!(!output.success());
    }

    #[test]
    fn test_failure_message_falls_back_to_status() {
        let output = CommandOutput {
            exit_code: Some(2),
            ..Default::default()
        };
        assert_eq!(output.failure_message(), "exited with status 2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_captures_output_and_exit_code() {
        let runner = ProcessRunner::new(Some(Duration::from_secs(10)));
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = runner.run(&inv).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_passes_overlay_environment() {
        let runner = ProcessRunner::default();
        let inv = Invocation::new("sh")
            .args(["-c", "printf '%s' \"$BW_SESSION\""])
            .env(SESSION_VAR, "abc123");

        let output = runner.run(&inv).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "abc123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_times_out() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let inv = Invocation::new("sh").args(["-c", "sleep 5"]);

        let err = runner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_runner_reports_missing_program() {
        let runner = ProcessRunner::default();
        let inv = Invocation::new("definitely-not-a-real-bw-binary").arg("--version");

        let err = runner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
