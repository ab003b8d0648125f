//! Salted password digests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// A SHA-256 digest of `salt || password`.
///
/// `Display` renders `base64(salt)$base64(digest)`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl PasswordHash {
    /// Hashes `password` under a fresh salt.
    #[must_use]
    pub fn generate(password: &str) -> Self {
        Self::with_salt(*Uuid::now_v7().as_bytes(), password)
    }

    fn with_salt(salt: [u8; 16], password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        Self {
            salt,
            digest: hasher.finalize().into(),
        }
    }

    /// Returns `true` if `password` produces this digest.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::with_salt(self.salt, password);
        candidate
            .digest
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", STANDARD.encode(self.salt), STANDARD.encode(self.digest))
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
