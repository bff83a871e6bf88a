use std::fmt;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::errors::CryptoError;
use crate::utils::gen_random_bytes;

type Aes192Gcm = AesGcm<Aes192, U12>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

enum AesGcmKey {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl AesGcmKey {
    fn seal(&self, nonce: &Nonce<U12>, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            Self::Aes128(c) => c.encrypt(nonce, plaintext),
            Self::Aes192(c) => c.encrypt(nonce, plaintext),
            Self::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn open(&self, nonce: &Nonce<U12>, ciphertext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            Self::Aes128(c) => c.decrypt(nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(nonce, ciphertext),
            Self::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
    }

    fn bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }
}

/// Symmetric cipher for individual session fields.
///
/// The key length picks AES-128, AES-192 or AES-256 in GCM mode. Every call to
/// [`Cipher::encrypt`] draws a fresh random nonce, so equal plaintexts never
/// produce equal ciphertexts. The output is `base64(nonce || ciphertext || tag)`.
pub struct Cipher {
    key: AesGcmKey,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cipher{{AES-{}-GCM}}", self.key.bits())
    }
}

impl Cipher {
    pub fn new(secret: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::InvalidKey(secret.len());
        let key = match secret.len() {
            16 => AesGcmKey::Aes128(Aes128Gcm::new_from_slice(secret).map_err(invalid)?),
            24 => AesGcmKey::Aes192(Aes192Gcm::new_from_slice(secret).map_err(invalid)?),
            32 => AesGcmKey::Aes256(Aes256Gcm::new_from_slice(secret).map_err(invalid)?),
            len => return Err(CryptoError::InvalidKey(len)),
        };
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = gen_random_bytes(NONCE_LEN)?;
        let sealed = self
            .key
            .seal(Nonce::<U12>::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption("failed to seal value".to_string()))?;

        let mut out = nonce;
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decryption(format!("invalid encoding: {e}")))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Decryption(
                "encrypted value is shorter than nonce and tag".to_string(),
            ));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .key
            .open(Nonce::<U12>::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption("plaintext is not UTF-8".to_string()))
    }

    /// Encrypt a field in place. Absent and empty values are left untouched.
    pub fn encrypt_into(&self, field: &mut Option<String>) -> Result<(), CryptoError> {
        if let Some(value) = field.as_mut() {
            if !value.is_empty() {
                *value = self.encrypt(value)?;
            }
        }
        Ok(())
    }

    /// Decrypt a field in place. Absent and empty values are left untouched.
    pub fn decrypt_into(&self, field: &mut Option<String>) -> Result<(), CryptoError> {
        if let Some(value) = field.as_mut() {
            if !value.is_empty() {
                *value = self.decrypt(value)?;
            }
        }
        Ok(())
    }
}
