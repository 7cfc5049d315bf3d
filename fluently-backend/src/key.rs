//! Storage key formats.
//!
//! Fingerprints can be long and contain header values such as tokens. A
//! [`KeyFormat`] decides how a fingerprint becomes the key a durable store sees.
//!
//! | Format | Length | Reversible | Use Case |
//! |--------|--------|------------|----------|
//! | [`Plain`](KeyFormat::Plain) | Unbounded | Yes | Debugging, inspectable stores |
//! | [`Sha256`](KeyFormat::Sha256) | 64 chars | No | Default for persistent stores |

use sha2::{Digest, Sha256};

/// Fingerprint to storage key conversion.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    /// The fingerprint itself.
    #[default]
    Plain,
    /// Lowercase hex SHA-256 of the fingerprint.
    Sha256,
}

impl KeyFormat {
    /// Storage key for `fingerprint`.
    pub fn format(&self, fingerprint: &str) -> String {
        match self {
            KeyFormat::Plain => fingerprint.to_owned(),
            KeyFormat::Sha256 => hex::encode(Sha256::digest(fingerprint.as_bytes())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_stable_hex() {
        let key = KeyFormat::Sha256.format("method=GET;url=/;headers=;content=");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, KeyFormat::Sha256.format("method=GET;url=/;headers=;content="));
    }

    #[test]
    fn plain_is_identity() {
        assert_eq!(KeyFormat::Plain.format("abc"), "abc");
    }
}
