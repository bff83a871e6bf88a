//! Server-side session handles.
//!
//! A ticket is a random id naming the cache entry plus a random secret that
//! encrypts that entry. Only the signed cookie ever carries the secret.

use ring::aead::{AES_128_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use std::fmt;

use crate::encryption::CryptoError;
use crate::session::SessionError;
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes};

pub const TICKET_ID_LEN: usize = 16;
pub const TICKET_SECRET_LEN: usize = 16;

#[derive(Clone, PartialEq, Eq)]
pub struct Ticket {
    id: String,
    secret: Vec<u8>,
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Ticket {
    /// Mint a ticket with a fresh id and secret from the system CSPRNG.
    pub fn new() -> Result<Self, SessionError> {
        let raw_id = gen_random_bytes(TICKET_ID_LEN)
            .map_err(|e| SessionError::Ticket(format!("failed to create new ticket ID: {e}")))?;
        let secret = gen_random_bytes(TICKET_SECRET_LEN).map_err(|e| {
            SessionError::Ticket(format!("failed to create encryption secret: {e}"))
        })?;

        Ok(Self {
            id: hex::encode(raw_id),
            secret,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cache key for this ticket: `<cookie_name>-<id>`.
    pub fn handle(&self, cookie_name: &str) -> String {
        format!("{cookie_name}-{}", self.id)
    }

    /// Cookie form: `<cookie_name>-<id>.<base64url secret>`.
    pub fn encode(&self, cookie_name: &str) -> String {
        format!("{}.{}", self.handle(cookie_name), base64url_encode(&self.secret))
    }

    pub fn decode(cookie_name: &str, encoded: &str) -> Result<Self, SessionError> {
        let prefix = format!("{cookie_name}-");
        let trimmed = encoded
            .strip_prefix(&prefix)
            .ok_or_else(|| SessionError::Ticket("failed to decode ticket handle".to_string()))?;

        let (id, secret) = trimmed
            .split_once('.')
            .filter(|(_, secret)| !secret.contains('.'))
            .ok_or_else(|| SessionError::Ticket("failed to decode ticket".to_string()))?;

        if id.is_empty() || hex::decode(id).is_err() {
            return Err(SessionError::Ticket(
                "server ticket failed sanity checks".to_string(),
            ));
        }

        let secret = base64url_decode(secret)
            .map_err(|e| SessionError::Ticket(format!("failed to decode ticket secret: {e}")))?;
        if secret.len() != TICKET_SECRET_LEN {
            return Err(SessionError::Ticket(format!(
                "ticket secret must be {TICKET_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    fn key(&self) -> Result<LessSafeKey, CryptoError> {
        UnboundKey::new(&AES_128_GCM, &self.secret)
            .map(LessSafeKey::new)
            .map_err(|_| CryptoError::InvalidKey(self.secret.len()))
    }

    /// Encrypt a session blob under the ticket secret. Output is `nonce || ciphertext || tag`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SessionError> {
        let key = self.key()?;
        let nonce_bytes = gen_random_bytes(NONCE_LEN).map_err(CryptoError::from)?;
        let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes)
            .map_err(|_| CryptoError::Encryption("invalid nonce".to_string()))?;

        let mut in_out = plaintext.to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("failed to seal session".to_string()))?;

        let mut sealed = nonce_bytes;
        sealed.extend_from_slice(&in_out);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SessionError> {
        if sealed.len() < NONCE_LEN {
            return Err(CryptoError::Decryption("sealed session is truncated".to_string()).into());
        }
        let key = self.key()?;
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CryptoError::Decryption("invalid nonce".to_string()))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Decryption("failed to open session".to_string()))?;
        Ok(plaintext.to_vec())
    }
}
