mod cipher;
mod errors;
mod signature;

pub use cipher::Cipher;
pub use errors::{CryptoError, SignatureError};
pub use signature::{SignaturePolicy, sign, signed_value, validate, verify};

#[cfg(test)]
pub(crate) use signature::sign_legacy;
