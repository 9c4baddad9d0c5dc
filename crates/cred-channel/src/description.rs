//! Credential records and their wire representation.
//!
//! `git credential` exchanges records as newline-delimited `key=value`
//! lines terminated by a blank line. Values may contain `=`, so parsing
//! splits each line on the first `=` only.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// A credential record as understood by `git credential`.
///
/// `protocol` and `host` are always present; `path`, `username` and
/// `password` are optional. Instances are immutable: retrieve returns a
/// fresh record rather than filling one in place.
///
/// # Example
///
/// ```rust
/// use cred_channel::CredentialDescription;
///
/// let desc = CredentialDescription::new("https", "example.org")
///     .with_path("/test123")
///     .with_username("alice");
/// assert_eq!(desc.host, "example.org");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialDescription {
    pub protocol: String,
    pub host: String,
    pub path: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialDescription {
    /// Create a record with the two required fields.
    pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            path: None,
            username: None,
            password: None,
        }
    }

    /// Set the request path (requires `credential.useHttpPath` on the git side
    /// to be forwarded to helpers).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Serialize into the wire format: one `key=value` line per present
    /// field in the fixed order protocol, host, path, username, password,
    /// terminated by a blank line. Optional fields are emitted only when
    /// non-empty.
    pub fn to_record(&self) -> String {
        let mut record = String::new();
        record.push_str(&format!("protocol={}\n", self.protocol));
        record.push_str(&format!("host={}\n", self.host));

        let optional = [
            ("path", &self.path),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                if !value.is_empty() {
                    record.push_str(&format!("{key}={value}\n"));
                }
            }
        }

        record.push('\n');
        record
    }

    /// Parse a wire-format record, stopping at the first blank line or end
    /// of input. Unrecognized keys are ignored; missing or empty optional
    /// keys become `None`; a missing required key is an error.
    pub fn parse_record(input: &str) -> Result<Self> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for line in input.lines() {
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once('=') {
                fields.insert(key, value);
            }
        }

        let required = |field: &'static str| -> Result<String> {
            match fields.get(field) {
                Some(value) if !value.is_empty() => Ok((*value).to_string()),
                _ => Err(Error::MissingField { field }),
            }
        };
        let optional = |field: &str| -> Option<String> {
            fields
                .get(field)
                .filter(|value| !value.is_empty())
                .map(|value| (*value).to_string())
        };

        Ok(Self {
            protocol: required("protocol")?,
            host: required("host")?,
            path: optional("path"),
            username: optional("username"),
            password: optional("password"),
        })
    }
}

/// Redacts the password so records can be logged without leaking secrets.
impl fmt::Debug for CredentialDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDescription")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
