//! Execution environment for spawned `git credential` commands.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable git honors to suppress terminal prompting.
pub const GIT_TERMINAL_PROMPT: &str = "GIT_TERMINAL_PROMPT";

/// Environment variable naming the askpass program git falls back to.
pub const GIT_ASKPASS: &str = "GIT_ASKPASS";

/// The repository path and environment a [`CredentialChannel`] runs git in.
///
/// The environment is a snapshot taken at construction (or the mapping the
/// caller supplies, which replaces the ambient environment entirely).
/// `GIT_TERMINAL_PROMPT=0` is always forced onto it so a misconfigured
/// helper chain fails instead of blocking on a prompt.
///
/// [`CredentialChannel`]: crate::CredentialChannel
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    repository_path: PathBuf,
    env: HashMap<String, String>,
}

impl ExecutionContext {
    /// Context with a snapshot of the current process environment.
    /// Non-Unicode variable names or values are converted lossily rather
    /// than rejected.
    pub fn new(repository_path: impl Into<PathBuf>) -> Self {
        Self::with_env(repository_path, lossy_env(std::env::vars_os()))
    }

    /// Context with a caller-supplied environment mapping. The mapping
    /// replaces the ambient environment; it is not merged into it.
    pub fn with_env(repository_path: impl Into<PathBuf>, mut env: HashMap<String, String>) -> Self {
        env.insert(GIT_TERMINAL_PROMPT.to_string(), "0".to_string());
        Self {
            repository_path: repository_path.into(),
            env,
        }
    }

    /// Additionally set `GIT_ASKPASS=0`, defeating askpass programs that
    /// would otherwise prompt outside the terminal.
    pub fn disable_askpass(mut self) -> Self {
        self.env.insert(GIT_ASKPASS.to_string(), "0".to_string());
        self
    }

    pub fn repository_path(&self) -> &Path {
        &self.repository_path
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }
}

/// Convert raw environment pairs to strings without panicking on
/// non-Unicode bytes.
fn lossy_env(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.into_iter()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect()
}
