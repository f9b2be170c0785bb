//! SHA-1 digest split used by the k-anonymity range lookup.

use sha1::{Digest, Sha1};

const PREFIX_LEN: usize = 5;

/// Uppercase hex SHA-1 of a password, split into the prefix sent to the
/// range service and the suffix matched locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PasswordHash {
    prefix: String,
    suffix: String,
}

impl PasswordHash {
    pub(crate) fn of(password: &str) -> Self {
        Self::from_digest(&hex::encode_upper(Sha1::digest(password.as_bytes())))
    }

    pub(crate) fn from_digest(digest: &str) -> Self {
        let (prefix, suffix) = digest.split_at(PREFIX_LEN.min(digest.len()));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn suffix(&self) -> &str {
        &self.suffix
    }
}
