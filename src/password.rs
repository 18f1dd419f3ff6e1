//! Password gating for protected archives.
//!
//! A protected archive stores the SHA-256 digest of its password and
//! extraction compares digests. Payload bytes are never encrypted; the gate
//! controls access through this library only.

use sha2::{Digest, Sha256};

/// SHA-256 digest of a password, rendered as lowercase hex.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Where extraction turns to when an archive wants a password. Front-ends
/// implement this with whatever dialog they have; returning an empty string
/// means no password was given.
pub trait PasswordPrompt {
    fn request_password(&self, prompt: &str) -> String;
}

/// Always answers with the same password.
pub struct StaticPassword(pub String);

impl StaticPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }
}

impl PasswordPrompt for StaticPassword {
    fn request_password(&self, _prompt: &str) -> String {
        self.0.clone()
    }
}

/// Never supplies a password.
pub struct NoPassword;

impl PasswordPrompt for NoPassword {
    fn request_password(&self, _prompt: &str) -> String {
        String::new()
    }
}
