//! Runtime configuration types shared between the server and clients.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hashed admin secret.
    pub secret_hash: String,
}

impl AdminConfig {
    /// Create a new AdminConfig with the given hashed secret.
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext secret against the stored hash.
    ///
    /// Returns `true` if the secret matches, `false` otherwise.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Service API configuration: the shared HMAC secret used to sign bodies
/// exchanged with the trusted application backend.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Human-readable name of the calling backend (for logs only).
    pub name: String,
    secret: Box<[u8]>,
}

impl ServiceConfig {
    pub fn new(name: String, secret: Box<[u8]>) -> Self {
        Self { name, secret }
    }

    /// The raw HMAC key bytes.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    #[test]
    fn test_verify_secret() {
        let password = "test-password";
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        let admin_config = AdminConfig::new(hash);

        assert!(admin_config.verify_secret("test-password"));
        assert!(!admin_config.verify_secret("wrong-password"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let admin_config = AdminConfig::new("not-an-argon2-hash".to_string());
        assert!(!admin_config.verify_secret("anything"));
    }
}
