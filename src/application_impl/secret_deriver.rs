use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derives the signing secret for password-reset tokens from the server-wide
/// secret and the subject's current password hash. Changing the hash changes
/// the derived secret, so every token signed under the old hash stops
/// verifying the moment the password changes. Stateless, no caching.
#[derive(Clone)]
pub struct ResetSecretDeriver {
    server_secret: Vec<u8>,
}

impl ResetSecretDeriver {
    pub fn new(server_secret: impl Into<Vec<u8>>) -> Self {
        ResetSecretDeriver {
            server_secret: server_secret.into(),
        }
    }

    pub fn server_secret_len(&self) -> usize {
        self.server_secret.len()
    }

    pub fn derive(&self, password_hash: &str) -> Vec<u8> {
        Self::derive_with(&self.server_secret, password_hash)
    }

    /// HMAC-SHA256 keyed by `secret` over the hash. The synthetic path of
    /// password-reset issuance calls this with a random stand-in secret so
    /// both paths run the identical computation.
    pub fn derive_with(secret: &[u8], password_hash: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts any key length");
        mac.update(password_hash.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let deriver = ResetSecretDeriver::new(b"server-secret".to_vec());
        assert_eq!(deriver.derive("$argon2id$hash"), deriver.derive("$argon2id$hash"));
    }

    #[test]
    fn changing_the_hash_changes_the_secret() {
        let deriver = ResetSecretDeriver::new(b"server-secret".to_vec());
        assert_ne!(deriver.derive("hash-one"), deriver.derive("hash-two"));
    }

    #[test]
    fn changing_the_server_secret_changes_the_secret() {
        let a = ResetSecretDeriver::new(b"secret-a".to_vec());
        let b = ResetSecretDeriver::new(b"secret-b".to_vec());
        assert_ne!(a.derive("same-hash"), b.derive("same-hash"));
    }
}
