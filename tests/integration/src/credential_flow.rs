//! End-to-end tests driving a real `git` binary against a scripted
//! credential helper.
//!
//! The helper is a POSIX sh script, so these tests are unix-only.

#![cfg(unix)]

use cred_channel::{CredentialChannel, CredentialDescription, Error, ExecutionContext};
use cred_test_utils::helper::{
    ERASE_MARKER, KNOWN_HOST, KNOWN_PASSWORD, KNOWN_USERNAME, MARKER_FILL_OK, MARKER_FILL_UNKNOWN,
};
use cred_test_utils::CredentialFixture;
use tempfile::TempDir;

/// The record as git re-serializes it towards helpers on store/erase:
/// one line per field, no trailing blank line.
const STORED_RECORD: &str =
    "protocol=https\nhost=example.org\npath=/test123\nusername=success\npassword=youwin\n";

fn channel_for(fixture: &CredentialFixture) -> CredentialChannel {
    CredentialChannel::with_context(ExecutionContext::with_env(
        fixture.repo_path(),
        fixture.isolated_env(),
    ))
}

fn full_description() -> CredentialDescription {
    CredentialDescription::new("https", KNOWN_HOST)
        .with_path("/test123")
        .with_username(KNOWN_USERNAME)
        .with_password(KNOWN_PASSWORD)
}

#[test]
fn retrieve_resolves_stored_credentials() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    let request = CredentialDescription::new("https", KNOWN_HOST).with_path("/test123");
    let resolved = channel.retrieve(&request).unwrap();

    assert_eq!(resolved.protocol, "https");
    assert_eq!(resolved.host, KNOWN_HOST);
    assert_eq!(resolved.path.as_deref(), Some("/test123"));
    assert_eq!(resolved.username.as_deref(), Some(KNOWN_USERNAME));
    assert_eq!(resolved.password.as_deref(), Some(KNOWN_PASSWORD));
    assert_eq!(fixture.helper_log(), MARKER_FILL_OK);
}

#[test]
fn retrieve_unknown_host_is_not_stored() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    let request = CredentialDescription::new("https", "invalid").with_path("/test123");
    match channel.retrieve(&request) {
        Err(Error::NotStored { host }) => assert_eq!(host, "invalid"),
        other => panic!("expected NotStored, got {other:?}"),
    }
    assert_eq!(fixture.helper_log(), MARKER_FILL_UNKNOWN);
}

#[test]
fn retrieve_with_corrupt_record_is_a_generic_error() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    // Newlines in the fields truncate the wire record; git rejects it
    // before any helper runs.
    let request = CredentialDescription::new("\n", "\n\n");
    match channel.retrieve(&request) {
        Err(Error::NotStored { .. }) => panic!("corrupt record must not map to NotStored"),
        Err(_) => {}
        Ok(resolved) => panic!("expected failure, got {resolved:?}"),
    }
    assert!(!fixture.helper_ran());
}

#[test]
fn retrieve_without_git_on_path_is_git_not_found() {
    let fixture = CredentialFixture::new();
    // PATH must name a real directory with no git in it: leaving PATH out
    // of the mapping entirely makes the spawn fall back to the parent's
    // PATH and find git anyway.
    let empty_bin = TempDir::new().unwrap();

    let mut env = fixture.isolated_env();
    env.insert("PATH".to_string(), empty_bin.path().display().to_string());
    let channel =
        CredentialChannel::with_context(ExecutionContext::with_env(fixture.repo_path(), env));

    match channel.retrieve(&CredentialDescription::new("https", KNOWN_HOST)) {
        Err(Error::GitNotFound) => {}
        other => panic!("expected GitNotFound, got {other:?}"),
    }
    assert!(!fixture.helper_ran());
}

#[test]
fn retrieve_against_missing_repository_fails() {
    let temp = TempDir::new().unwrap();
    let channel = CredentialChannel::new(temp.path().join("does-not-exist"));

    let request = CredentialDescription::new("https", KNOWN_HOST);
    match channel.retrieve(&request) {
        Err(Error::CommandFailed { code, .. }) => assert_ne!(code, 0),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn approve_forwards_the_record_to_the_helper() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    channel.approve(&full_description()).unwrap();
    assert_eq!(fixture.helper_log(), STORED_RECORD);
}

#[test]
fn reject_prepends_the_erase_marker() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    channel.reject(&full_description()).unwrap();
    assert_eq!(fixture.helper_log(), format!("{ERASE_MARKER}{STORED_RECORD}"));
}

#[test]
fn channel_is_reusable_across_operations() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);

    channel.approve(&full_description()).unwrap();
    let resolved = channel
        .retrieve(&CredentialDescription::new("https", KNOWN_HOST).with_path("/test123"))
        .unwrap();
    assert_eq!(resolved.password.as_deref(), Some(KNOWN_PASSWORD));

    channel.reject(&full_description()).unwrap();
    assert_eq!(fixture.helper_log(), format!("{ERASE_MARKER}{STORED_RECORD}"));
}

#[test]
fn shared_channel_serves_multiple_threads() {
    let fixture = CredentialFixture::new();
    let channel = channel_for(&fixture);
    let request = CredentialDescription::new("https", KNOWN_HOST).with_path("/test123");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| channel.retrieve(&request)))
            .collect();
        for handle in handles {
            let resolved = handle.join().unwrap().unwrap();
            assert_eq!(resolved.username.as_deref(), Some(KNOWN_USERNAME));
        }
    });
}
