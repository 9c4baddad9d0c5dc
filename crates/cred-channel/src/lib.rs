//! Typed interface to the `git credential` helper protocol.
//!
//! Wraps the three verbs of git's credential protocol — fill, approve,
//! reject — as synchronous typed calls. Each call spawns one `git -C <repo>
//! credential <verb>` process, exchanges wire-format records over its
//! standard streams, and maps the exit status into the crate's error
//! taxonomy. See [`CredentialChannel`] for the entry point.

pub mod channel;
pub mod context;
pub mod description;
pub mod error;

pub use channel::CredentialChannel;
pub use context::ExecutionContext;
pub use description::CredentialDescription;
pub use error::{Error, Result};
