//! Synchronous wrapper around `git credential` subcommands.
//!
//! Each operation spawns one short-lived `git -C <repo> credential <verb>`
//! process, writes the serialized record to its stdin, and interprets the
//! buffered output. A drop guard kills the child on every exit path so no
//! orphan survives an early return.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Output, Stdio};

use crate::context::ExecutionContext;
use crate::description::CredentialDescription;
use crate::error::{Error, Result};

/// Exit code git uses for fatal errors, including a refused prompt.
const NOT_STORED_EXIT_CODE: i32 = 128;

/// Stderr marker distinguishing "no helper had an answer" from other
/// exit-128 causes. Fragile (locale- and helper-dependent) but the only
/// signal the protocol defines.
const PROMPTS_DISABLED_MARKER: &str = "terminal prompts disabled";

/// The three `git credential` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Fill,
    Approve,
    Reject,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Verb::Fill => "fill",
            Verb::Approve => "approve",
            Verb::Reject => "reject",
        }
    }
}

/// Typed interface to `git credential` for one repository.
///
/// Reusable across many operations; holds only immutable state, so a shared
/// channel may serve several threads concurrently (each call owns its own
/// child process and buffers). Calls block until the child exits — there is
/// no timeout, a hung helper blocks the caller.
///
/// # Example
///
/// ```rust,no_run
/// use cred_channel::{CredentialChannel, CredentialDescription};
///
/// let channel = CredentialChannel::new("/path/to/repo");
/// let request = CredentialDescription::new("https", "example.org");
/// let resolved = channel.retrieve(&request)?;
/// channel.approve(&resolved)?;
/// # Ok::<(), cred_channel::Error>(())
/// ```
#[derive(Debug)]
pub struct CredentialChannel {
    context: ExecutionContext,
}

impl CredentialChannel {
    /// Channel for `repository_path` with the default execution context
    /// (ambient environment, terminal prompting disabled).
    pub fn new(repository_path: impl Into<PathBuf>) -> Self {
        Self {
            context: ExecutionContext::new(repository_path),
        }
    }

    /// Channel with a caller-built context (custom environment mapping
    /// and/or askpass disabling).
    pub fn with_context(context: ExecutionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Ask git to resolve credentials for `description` via `credential fill`.
    ///
    /// Returns the parsed record from stdout, normally the original
    /// protocol/host/path plus the resolved username and password. Fails
    /// with [`Error::NotStored`] when no helper had an answer and prompting
    /// was refused; any other non-zero exit, missing executable, or I/O
    /// failure is reported through the remaining variants.
    pub fn retrieve(&self, description: &CredentialDescription) -> Result<CredentialDescription> {
        let output = self.run_credential(Verb::Fill, description)?;
        let stdout = decode_fill_output(&output, &description.host)?;
        CredentialDescription::parse_record(&stdout)
    }

    /// Tell git the credentials in `description` worked, so helpers store
    /// them (`credential approve`).
    pub fn approve(&self, description: &CredentialDescription) -> Result<()> {
        let output = self.run_credential(Verb::Approve, description)?;
        check_exit(&output)
    }

    /// Tell git the credentials in `description` were rejected, so helpers
    /// erase them (`credential reject`).
    pub fn reject(&self, description: &CredentialDescription) -> Result<()> {
        let output = self.run_credential(Verb::Reject, description)?;
        check_exit(&output)
    }

    /// Spawn one `git credential` child, feed it the record, and collect
    /// its buffered output. The guard kills the child if this returns early.
    fn run_credential(&self, verb: Verb, description: &CredentialDescription) -> Result<Output> {
        tracing::debug!(
            verb = verb.as_str(),
            repo = %self.context.repository_path().display(),
            "spawning git credential"
        );

        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(self.context.repository_path())
            .arg("credential")
            .arg(verb.as_str())
            .env_clear()
            .envs(self.context.env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::GitNotFound
            } else {
                Error::Io(e)
            }
        })?;
        let mut guard = ChildGuard::new(child);

        // A child that exits before reading (or closes its stdin early)
        // breaks the pipe; the exit status carries the real failure, so the
        // write is best-effort.
        if let Some(mut stdin) = guard.take_stdin() {
            if let Err(e) = stdin.write_all(description.to_record().as_bytes()) {
                tracing::debug!(error = %e, "child stopped reading before the record was written");
            }
            // Dropping stdin closes the pipe so git sees end of record.
        }

        Ok(guard.wait_with_output()?)
    }
}

/// Interpret a `fill` child's exit: 0 yields stdout, 128 plus the
/// prompts-disabled marker means not stored, anything else is a failure.
fn decode_fill_output(output: &Output, host: &str) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let code = output.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if code == NOT_STORED_EXIT_CODE && stderr.contains(PROMPTS_DISABLED_MARKER) {
        return Err(Error::NotStored {
            host: host.to_string(),
        });
    }
    Err(Error::CommandFailed { code, stderr })
}

/// Exit interpretation for approve/reject: only 0 is success.
fn check_exit(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(Error::CommandFailed {
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Owns the spawned child and kills it on drop.
///
/// The normal path consumes the guard through [`wait_with_output`], leaving
/// nothing for `Drop` to do. On early exit (write error turned fatal, panic
/// in the caller) the drop sends a best-effort kill and reaps the child;
/// kill failures are logged and swallowed so they never mask the primary
/// error.
///
/// [`wait_with_output`]: ChildGuard::wait_with_output
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.as_mut()?.stdin.take()
    }

    /// Wait for exit and collect the buffered streams, consuming the guard.
    fn wait_with_output(mut self) -> std::io::Result<Output> {
        match self.child.take() {
            Some(child) => child.wait_with_output(),
            None => Err(std::io::Error::other("child process already reaped")),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::warn!(error = %e, "failed to kill git credential child");
            }
            let _ = child.wait();
        }
    }
}
