//! Encryption of data bag item values
//!
//! Encrypted items keep their `id` in clear text. Every other top-level
//! value is replaced by an envelope:
//!
//! ```json
//! {
//!   "encrypted_data": "<base64 ciphertext>",
//!   "nonce": "<base64 96-bit nonce>",
//!   "cipher": "chacha20-poly1305",
//!   "version": 1
//! }
//! ```
//!
//! The plaintext of each envelope is the JSON encoding of the original value.
//! The key is the SHA-256 digest of the secret.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::ITEM_ID_KEY;
use crate::{Error, Record, Secret};

const CIPHER_NAME: &str = "chacha20-poly1305";
const ENVELOPE_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;

/// Decrypts the values of an encrypted item.
pub trait ItemCipher: Send + Sync {
    /// Decrypt every value of `record` except `id`.
    fn decrypt_item(&self, item: &str, record: Record, secret: &Secret) -> crate::Result<Record>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    encrypted_data: String,
    nonce: String,
    cipher: String,
    version: u32,
}

/// ChaCha20-Poly1305 item cipher.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChaChaItemCipher;

impl ChaChaItemCipher {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt every value of `record` except `id`.
    ///
    /// Each value gets a fresh random nonce.
    pub fn encrypt_item(&self, item: &str, record: &Record, secret: &Secret) -> crate::Result<Record> {
        let cipher = Self::cipher(item, secret)?;
        let mut encrypted = Record::new();

        for (field, value) in record {
            if field == ITEM_ID_KEY {
                encrypted.insert(field.clone(), value.clone());
                continue;
            }

            let plaintext = serde_json::to_vec(value)
                .map_err(|e| cipher_error(item, field, e.to_string()))?;
            let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
            let ciphertext = cipher
                .encrypt(&nonce, plaintext.as_ref())
                .map_err(|_| cipher_error(item, field, "encryption failed"))?;

            let envelope = Envelope {
                encrypted_data: STANDARD.encode(ciphertext),
                nonce: STANDARD.encode(nonce),
                cipher: CIPHER_NAME.to_string(),
                version: ENVELOPE_VERSION,
            };
            let envelope = serde_json::to_value(envelope)
                .map_err(|e| cipher_error(item, field, e.to_string()))?;
            encrypted.insert(field.clone(), envelope);
        }

        Ok(encrypted)
    }

    fn cipher(item: &str, secret: &Secret) -> crate::Result<ChaCha20Poly1305> {
        let key = Sha256::digest(secret.as_bytes());
        ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|_| cipher_error(item, ITEM_ID_KEY, "invalid key length"))
    }
}

impl ItemCipher for ChaChaItemCipher {
    fn decrypt_item(&self, item: &str, record: Record, secret: &Secret) -> crate::Result<Record> {
        let cipher = Self::cipher(item, secret)?;
        let mut decrypted = Record::new();

        for (field, value) in record {
            if field == ITEM_ID_KEY {
                decrypted.insert(field, value);
                continue;
            }

            let envelope: Envelope = serde_json::from_value(value)
                .map_err(|e| cipher_error(item, &field, format!("not an envelope: {e}")))?;
            if envelope.cipher != CIPHER_NAME || envelope.version != ENVELOPE_VERSION {
                return Err(cipher_error(
                    item,
                    &field,
                    format!(
                        "unsupported cipher {} (version {})",
                        envelope.cipher, envelope.version
                    ),
                ));
            }

            let nonce = STANDARD
                .decode(&envelope.nonce)
                .map_err(|e| cipher_error(item, &field, e.to_string()))?;
            if nonce.len() != NONCE_LEN {
                return Err(cipher_error(item, &field, "invalid nonce length"));
            }
            let ciphertext = STANDARD
                .decode(&envelope.encrypted_data)
                .map_err(|e| cipher_error(item, &field, e.to_string()))?;

            let plaintext = cipher
                .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
                .map_err(|_| cipher_error(item, &field, "authentication failed (wrong secret?)"))?;
            let value = serde_json::from_slice(&plaintext)
                .map_err(|e| cipher_error(item, &field, e.to_string()))?;
            decrypted.insert(field, value);
        }

        Ok(decrypted)
    }
}

fn cipher_error(item: &str, field: &str, message: impl Into<String>) -> Error {
    Error::Cipher {
        item: item.to_string(),
        field: field.to_string(),
        message: message.into(),
    }
}
