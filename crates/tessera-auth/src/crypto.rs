//! Secret encryption primitives — PBKDF2 key derivation and
//! AES-256-GCM.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::CryptoError;

/// Application-wide KDF salt. Key separation between secrets comes
/// from the per-secret context key, not the salt; the salt only
/// partitions this application's key space.
const KDF_SALT: [u8; 4] = [0x43, 0x87, 0x23, 0x72];

/// PBKDF2-HMAC-SHA256 iteration count.
const KDF_ITERATIONS: u32 = 10_000;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Symmetric encryption for secrets at rest.
///
/// Every value is encrypted under a key derived from the caller's
/// context key concatenated with the master key, so two tenants'
/// secrets never share an encryption key and a ciphertext copied
/// between scopes will not decrypt. Stateless; safe to clone and use
/// concurrently.
#[derive(Clone)]
pub struct EncryptionService {
    master_key: String,
}

impl EncryptionService {
    pub fn new(master_key: impl Into<String>) -> Self {
        Self {
            master_key: master_key.into(),
        }
    }

    /// Derive the 256-bit key for `context_key`.
    fn derive_key(&self, context_key: &str) -> [u8; 32] {
        let material = format!("{context_key}{}", self.master_key);
        let mut key = [0u8; 32];
        pbkdf2_hmac::<Sha256>(material.as_bytes(), &KDF_SALT, KDF_ITERATIONS, &mut key);
        key
    }

    /// Encrypt `plaintext` under the key derived for `context_key`.
    ///
    /// Output is `base64(nonce || ciphertext || tag)` with a fresh
    /// random nonce per call, so encrypting the same value twice
    /// yields different ciphertexts.
    pub fn encrypt(&self, plaintext: &str, context_key: &str) -> Result<String, CryptoError> {
        let key = self.derive_key(context_key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Any tampering, truncation, or key mismatch fails with
    /// [`CryptoError::Decryption`].
    pub fn decrypt(&self, encoded: &str, context_key: &str) -> Result<String, CryptoError> {
        let combined = STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::Decryption)?;
        if combined.len() <= NONCE_LEN {
            return Err(CryptoError::Decryption);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let key = self.derive_key(context_key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Decryption)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
    }
}

/// Generate a 512-bit random value, base64-encoded. High-entropy
/// enough to serve as a tenant's HMAC-SHA256 signing secret.
pub fn generate_secure_key() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 64] = rand::Rng::random(&mut rng);
    STANDARD.encode(bytes)
}
