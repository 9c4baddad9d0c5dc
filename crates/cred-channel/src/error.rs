//! Error types for cred-channel

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to `git credential`
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git executable not found in PATH. Install git or make it reachable from PATH.")]
    GitNotFound,

    /// Raised only by retrieve: git exited 128 with prompting disabled,
    /// meaning no helper had an answer for this host.
    #[error("No credential stored for host '{host}'")]
    NotStored { host: String },

    #[error("git credential exited with code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("Credential record is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
