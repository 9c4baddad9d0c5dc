//! [`CredentialFixture`] — a scratch repository wired to a scripted helper.
//!
//! The helper is a POSIX `sh` script registered as `credential.helper`, so
//! the fixture is unix-only. It mimics a real helper: answers the known
//! host on get, captures its stdin on store and erase, and records which
//! branch ran in an outfile the test can read back.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// The one host the scripted helper has credentials for.
pub const KNOWN_HOST: &str = "example.org";

/// Username the helper resolves for [`KNOWN_HOST`].
pub const KNOWN_USERNAME: &str = "success";

/// Password the helper resolves for [`KNOWN_HOST`].
pub const KNOWN_PASSWORD: &str = "youwin";

/// Outfile marker written when the get branch found the host.
pub const MARKER_FILL_OK: &str = "ok_fill";

/// Outfile marker written when the get branch had no answer.
pub const MARKER_FILL_UNKNOWN: &str = "fail_fill";

/// Line the erase branch writes ahead of the captured record.
pub const ERASE_MARKER: &str = "reject\n";

/// Sees only protocol/host/path on get; echoes resolved credentials for the
/// known host and stays silent otherwise, which sends git to its (disabled)
/// terminal prompt. Store and erase capture the full record.
const HELPER_SCRIPT: &str = r#"#!/bin/sh
out="$1"
action="$2"
record=$(cat)
host=$(printf '%s\n' "$record" | sed -n 's/^host=//p')
protocol=$(printf '%s\n' "$record" | sed -n 's/^protocol=//p')
path=$(printf '%s\n' "$record" | sed -n 's/^path=//p')

case "$action" in
get)
    if [ "$host" = "example.org" ]; then
        printf 'ok_fill' > "$out"
        printf 'protocol=%s\nhost=%s\npath=%s\nusername=success\npassword=youwin\n\n' \
            "$protocol" "$host" "$path"
    else
        printf 'fail_fill' > "$out"
    fi
    ;;
store)
    printf '%s\n' "$record" > "$out"
    ;;
erase)
    { printf 'reject\n'; printf '%s\n' "$record"; } > "$out"
    ;;
*)
    printf 'unknown op' > "$out"
    exit 1
    ;;
esac
"#;

/// A temporary git repository whose `credential.helper` is the scripted
/// helper above, with `credential.useHttpPath` on so paths round-trip.
///
/// # Example
///
/// ```rust,no_run
/// use cred_test_utils::CredentialFixture;
///
/// let fixture = CredentialFixture::new();
/// // run credential operations against fixture.repo_path() with
/// // fixture.isolated_env(), then inspect fixture.helper_log()
/// assert!(!fixture.helper_ran());
/// ```
pub struct CredentialFixture {
    temp_dir: TempDir,
}

impl Default for CredentialFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialFixture {
    /// Initialise the repository, write the helper script, and point the
    /// repo's credential configuration at it.
    ///
    /// # Panics
    /// Panics with a descriptive message if any setup step fails.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("CredentialFixture: failed to create temp dir");
        let repo = git2::Repository::init(temp_dir.path()).unwrap_or_else(|e| {
            panic!(
                "CredentialFixture: failed to init repository at {}: {e}",
                temp_dir.path().display()
            )
        });

        let script_path = temp_dir.path().join("credential-helper.sh");
        fs::write(&script_path, HELPER_SCRIPT)
            .expect("CredentialFixture: failed to write helper script");

        let helper_value = format!(
            "!sh '{}' '{}' $@",
            script_path.display(),
            temp_dir.path().join("helper-out.log").display()
        );
        let mut config = repo
            .config()
            .expect("CredentialFixture: failed to open repo config");
        config
            .set_str("credential.helper", &helper_value)
            .expect("CredentialFixture: failed to set credential.helper");
        config
            .set_bool("credential.useHttpPath", true)
            .expect("CredentialFixture: failed to set credential.useHttpPath");

        Self { temp_dir }
    }

    /// Root of the fixture repository.
    pub fn repo_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Whether any helper branch has run yet.
    pub fn helper_ran(&self) -> bool {
        self.outfile().exists()
    }

    /// What the helper recorded: a branch marker on get, the captured
    /// record on store, the erase marker plus the record on erase.
    ///
    /// # Panics
    /// Panics if the helper has not run (no outfile to read).
    pub fn helper_log(&self) -> String {
        fs::read_to_string(self.outfile()).unwrap_or_else(|_| {
            panic!(
                "CredentialFixture: helper outfile missing at {} (helper never ran?)",
                self.outfile().display()
            )
        })
    }

    /// Minimal environment for running git against this fixture without
    /// the user's credential configuration leaking in: ambient `PATH`,
    /// global config redirected to /dev/null, system config disabled, and
    /// `HOME` pointed into the fixture.
    pub fn isolated_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env.insert("PATH".to_string(), path);
        }
        env.insert(
            "HOME".to_string(),
            self.temp_dir.path().display().to_string(),
        );
        env.insert("GIT_CONFIG_GLOBAL".to_string(), "/dev/null".to_string());
        env.insert("GIT_CONFIG_NOSYSTEM".to_string(), "1".to_string());
        env
    }

    fn outfile(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("helper-out.log")
    }
}
