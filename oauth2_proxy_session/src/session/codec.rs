//! Serialized form of [`SessionState`] with field-level encryption.

use crate::encryption::Cipher;

use super::errors::SessionError;
use super::state::SessionState;

fn identity_only(state: &SessionState) -> SessionState {
    SessionState {
        email: state.email.clone(),
        user: state.user.clone(),
        preferred_username: state.preferred_username.clone(),
        ..Default::default()
    }
}

/// Decrypt `field` in place, keeping the stored value if it does not decrypt.
/// Only used for fields that were once written in plaintext.
fn decrypt_or_keep(cipher: &Cipher, field: &mut Option<String>) {
    let Some(stored) = field.as_deref().filter(|v| !v.is_empty()) else {
        return;
    };
    if let Ok(plain) = cipher.decrypt(stored) {
        *field = Some(plain);
    }
}

/// Serialize `state` for storage.
///
/// Without a cipher only the identity fields are kept; tokens are never
/// persisted unencrypted. With a cipher every string field is encrypted.
pub fn encode_session_state(
    state: &SessionState,
    cipher: Option<&Cipher>,
) -> Result<String, SessionError> {
    let encoded = match cipher {
        None => identity_only(state),
        Some(cipher) => {
            let mut ss = state.clone();
            cipher.encrypt_into(&mut ss.email)?;
            cipher.encrypt_into(&mut ss.user)?;
            cipher.encrypt_into(&mut ss.preferred_username)?;
            cipher.encrypt_into(&mut ss.access_token)?;
            cipher.encrypt_into(&mut ss.id_token)?;
            cipher.encrypt_into(&mut ss.refresh_token)?;
            ss
        }
    };

    serde_json::to_string(&encoded).map_err(|e| SessionError::Malformed(e.to_string()))
}

/// Parse a stored session.
///
/// `email` and `user` fall back to their stored value when they fail to
/// decrypt, so records written before those fields were encrypted still load.
/// Every other encrypted field must decrypt.
pub fn decode_session_state(
    serialized: &str,
    cipher: Option<&Cipher>,
) -> Result<SessionState, SessionError> {
    let mut ss: SessionState = serde_json::from_str(serialized)
        .map_err(|e| SessionError::Malformed(format!("error unmarshalling session: {e}")))?;

    match cipher {
        None => ss = identity_only(&ss),
        Some(cipher) => {
            decrypt_or_keep(cipher, &mut ss.email);
            decrypt_or_keep(cipher, &mut ss.user);
            cipher.decrypt_into(&mut ss.preferred_username)?;
            cipher.decrypt_into(&mut ss.access_token)?;
            cipher.decrypt_into(&mut ss.id_token)?;
            cipher.decrypt_into(&mut ss.refresh_token)?;
        }
    }

    if ss.user.as_deref().is_none_or(str::is_empty) && ss.email.is_some() {
        ss.user = ss.email.clone();
    }

    Ok(ss)
}
