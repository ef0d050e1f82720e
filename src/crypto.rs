//! Token encryption module using AES-256-GCM
//!
//! Encryption and decryption utilities for the OAuth access and refresh
//! tokens stored on connected accounts, using AES-256-GCM with additional
//! authenticated data (AAD) bound to the owning account.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::connected_account::Model as ConnectedAccountModel;

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Secure wrapper for encryption keys with zeroization
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::EncryptionFailed(
                "Invalid key length: expected 32 bytes".to_string(),
            ));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // Version byte + nonce prefix the ciphertext.
    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    // Legacy plaintext payloads carry no version marker.
    if ciphertext[0] != VERSION_ENCRYPTED {
        return Ok(ciphertext.to_vec());
    }

    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let tag_and_ct = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    debug_assert!(tag_and_ct.len() >= TAG_LEN);

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: tag_and_ct,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

fn account_aad(account: &ConnectedAccountModel) -> String {
    format!(
        "{}|{}|{}",
        account.user_id, account.provider, account.provider_account_id
    )
}

/// Type alias for encrypted token result
type EncryptedTokens = Result<(Option<Vec<u8>>, Option<Vec<u8>>), CryptoError>;

/// Encrypt tokens for a connected account
pub fn encrypt_account_tokens(
    key: &CryptoKey,
    account: &ConnectedAccountModel,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> EncryptedTokens {
    let aad = account_aad(account);

    let encrypted_access_token = access_token
        .map(|token| encrypt_bytes(key, aad.as_bytes(), token.as_bytes()))
        .transpose()?;

    let encrypted_refresh_token = refresh_token
        .map(|token| encrypt_bytes(key, aad.as_bytes(), token.as_bytes()))
        .transpose()?;

    Ok((encrypted_access_token, encrypted_refresh_token))
}

/// Type alias for decrypted token result
type DecryptedTokens = Result<(Option<String>, Option<String>), CryptoError>;

/// Decrypt tokens for a connected account
pub fn decrypt_account_tokens(key: &CryptoKey, account: &ConnectedAccountModel) -> DecryptedTokens {
    let aad = account_aad(account);

    let decrypted_access_token = decrypt_optional(key, aad.as_bytes(), account.access_token_ciphertext.as_ref())?;
    let decrypted_refresh_token = decrypt_optional(key, aad.as_bytes(), account.refresh_token_ciphertext.as_ref())?;

    Ok((decrypted_access_token, decrypted_refresh_token))
}

fn decrypt_optional(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: Option<&Vec<u8>>,
) -> Result<Option<String>, CryptoError> {
    match ciphertext {
        Some(token) if is_encrypted_payload(token) => decrypt_bytes(key, aad, token)
            .and_then(|bytes| {
                String::from_utf8(bytes)
                    .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
            })
            .map(Some),
        Some(token) => String::from_utf8(token.clone())
            .map(Some)
            .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![0u8; 32]).expect("valid test key")
    }

    fn sample_account(
        access_token_ciphertext: Option<Vec<u8>>,
        refresh_token_ciphertext: Option<Vec<u8>>,
    ) -> ConnectedAccountModel {
        ConnectedAccountModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: "google".to_string(),
            provider_account_id: "account-123".to_string(),
            access_token_ciphertext,
            refresh_token_ciphertext,
            expires_at: None,
            last_synced_at: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let aad = b"test-aad";
        let plaintext = b"secret message";

        let encrypted = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");
        let decrypted = decrypt_bytes(&key, aad, &encrypted).expect("decryption succeeds");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_aad_fails() {
        let key = test_key();
        let plaintext = b"secret message";

        let encrypted = encrypt_bytes(&key, b"aad-1", plaintext).expect("encryption succeeds");
        let result = decrypt_bytes(&key, b"aad-2", &encrypted);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let aad = b"test-aad";

        let mut encrypted = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;

        assert!(matches!(
            decrypt_bytes(&key, aad, &encrypted),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_legacy_plaintext_pass_through() {
        let key = test_key();
        let plaintext = b"plain-old-token".to_vec();

        let decrypted = decrypt_bytes(&key, b"aad", &plaintext).expect("pass-through succeeds");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_account_token_roundtrip() {
        let key = test_key();
        let account = sample_account(None, None);

        let (access, refresh) =
            encrypt_account_tokens(&key, &account, Some("access-token"), Some("refresh-token"))
                .expect("encryption succeeds");

        let stored = ConnectedAccountModel {
            access_token_ciphertext: access,
            refresh_token_ciphertext: refresh,
            ..account
        };

        let (decrypted_access, decrypted_refresh) =
            decrypt_account_tokens(&key, &stored).expect("decryption succeeds");
        assert_eq!(decrypted_access.as_deref(), Some("access-token"));
        assert_eq!(decrypted_refresh.as_deref(), Some("refresh-token"));
    }

    #[test]
    fn test_empty_ciphertext_rejected() {
        let key = test_key();
        assert!(matches!(
            decrypt_bytes(&key, b"aad", &[]),
            Err(CryptoError::EmptyCiphertext)
        ));
    }
}
