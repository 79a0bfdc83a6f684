//! Stable retry identities for job invocations.
//!
//! A retry identity fingerprints a job's arguments so that every worker,
//! in any process, derives the same counter key for the same logical job.
//!
//! Each argument is rendered to text (strings verbatim, everything else as
//! compact JSON with object keys sorted), the parts are joined with `-`, and
//! the joined string is hashed with SHA-256. The identity is the lowercase
//! hex digest.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Separator placed between canonicalized arguments before hashing.
const ARG_SEPARATOR: &str = "-";

/// Default namespace for attempt counter keys.
pub const DEFAULT_KEY_PREFIX: &str = "resque:resque-retry";

/// Deterministic fingerprint of a job's argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetryIdentity(String);

impl RetryIdentity {
    /// Computes the identity for the given arguments.
    ///
    /// Argument order is significant: `[a, b]` and `[b, a]` produce different
    /// identities.
    pub fn from_args(args: &[Value]) -> Self {
        let joined = args
            .iter()
            .map(canonicalize)
            .collect::<Vec<_>>()
            .join(ARG_SEPARATOR);

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RetryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds the namespaced counter key `<prefix>:<job>:<identity>`.
pub fn retry_key(prefix: &str, job_name: &str, identity: &RetryIdentity) -> String {
    [prefix, job_name, identity.as_str()].join(":")
}

/// Renders one argument as the text that is fed to the hasher.
fn canonicalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_canonical_json(other, &mut out);
            out
        }
    }
}

/// Writes compact JSON with object keys in sorted order, independent of
/// how the map was built.
fn write_canonical_json(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical_json(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical_json(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
