//! Shared test fixtures for the cred-channel workspace.
//!
//! Provides a scratch git repository wired to a scripted credential helper
//! so tests can exercise the real `git credential` plumbing without
//! touching the user's credential configuration. Dev-dependency only —
//! never published.
//!
//! # Modules
//!
//! - [`helper`] — [`CredentialFixture`], the scripted-helper repository
//!
//! [`CredentialFixture`]: helper::CredentialFixture

pub mod helper;

pub use helper::CredentialFixture;
