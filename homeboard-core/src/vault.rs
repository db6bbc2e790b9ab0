//! Symmetric encryption of OAuth tokens at rest.
//!
//! Tokens are sealed with ChaCha20-Poly1305 (authenticated encryption) under
//! a key derived from a process-wide secret. Each call uses a fresh random
//! nonce, so encrypting the same plaintext twice yields different ciphertext.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce, aead::Aead};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{HomeboardError, HomeboardResult};

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
const NONCE_LEN: usize = 12;

/// Encrypts and decrypts credential material with a key derived from the
/// configured secret.
#[derive(Clone)]
pub struct Vault {
    key: [u8; 32],
}

impl Vault {
    /// Build a vault from the configured secret. Fails fast when the secret
    /// is absent so a misconfigured deployment cannot silently store
    /// plaintext-adjacent garbage.
    pub fn new(secret: &str) -> HomeboardResult<Self> {
        if secret.is_empty() {
            return Err(HomeboardError::Config(
                "token encryption secret is not set".into(),
            ));
        }

        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);

        Ok(Vault { key })
    }

    /// Encrypt a plaintext into `base64(nonce ‖ ciphertext)`.
    pub fn encrypt(&self, plaintext: &str) -> HomeboardResult<String> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| HomeboardError::Crypto(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a value produced by [`Vault::encrypt`]. Fails on tampered
    /// ciphertext or a wrong key (the auth tag no longer verifies).
    pub fn decrypt(&self, sealed: &str) -> HomeboardResult<String> {
        let sealed = BASE64
            .decode(sealed)
            .map_err(|e| HomeboardError::Crypto(format!("Invalid ciphertext encoding: {e}")))?;

        if sealed.len() < NONCE_LEN {
            return Err(HomeboardError::Crypto("Ciphertext too short".into()));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| HomeboardError::Crypto("Decryption failed (tampered or wrong key)".into()))?;

        String::from_utf8(plaintext)
            .map_err(|e| HomeboardError::Crypto(format!("Decrypted payload is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let vault = Vault::new("test-secret").unwrap();

        for plaintext in ["", "ya29.a0AfH6SMBx", "日本語テキスト 🗓️", "multi\nline"] {
            let sealed = vault.encrypt(plaintext).unwrap();
            assert_eq!(vault.decrypt(&sealed).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_roundtrip_large_payload() {
        // Serialized token bundles can run to tens of kilobytes
        let vault = Vault::new("test-secret").unwrap();
        let plaintext = "x".repeat(10 * 1024);

        let sealed = vault.encrypt(&plaintext).unwrap();
        assert_eq!(vault.decrypt(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_encrypt_is_randomized() {
        let vault = Vault::new("test-secret").unwrap();

        let a = vault.encrypt("same plaintext").unwrap();
        let b = vault.encrypt("same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decrypt_rejects_tampering() {
        let vault = Vault::new("test-secret").unwrap();
        let sealed = vault.encrypt("refresh-token-value").unwrap();

        // Flip the tail of the ciphertext
        let mut bytes = BASE64.decode(&sealed).unwrap();
        let len = bytes.len();
        for b in &mut bytes[len - 5..] {
            *b ^= 0xff;
        }
        let tampered = BASE64.encode(bytes);

        assert!(vault.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_decrypt_rejects_wrong_key() {
        let vault = Vault::new("correct-secret").unwrap();
        let other = Vault::new("wrong-secret").unwrap();

        let sealed = vault.encrypt("refresh-token-value").unwrap();
        assert!(other.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(Vault::new("").is_err());
    }
}
