//! # Signature Checks
//!
//! Verification of header signatures as they appear on the wire: a hex
//! public key from the header, the raw header bytes, and a hex signature.
//!
//! Two flavours. [`verify`] answers yes/no and is what most callers want.
//! [`verify_strict`] says *which* input was bad, for diagnostics in the
//! `inspect` command and in batch verification errors.

use thiserror::Error;

use super::keys::{PublicKey, Signature};

/// Errors during signature checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature encoding: expected 128 hex characters")]
    InvalidSignatureEncoding,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Verify `signature_hex` over `message` against `public_key_hex`.
///
/// Returns `false` for malformed inputs as well as for bad signatures.
///
/// # Example
///
/// ```
/// use sawmill_protocol::crypto::{verify, Secp256k1Signer};
///
/// let signer = Secp256k1Signer::generate().unwrap();
/// let sig = signer.sign(b"header").unwrap();
/// assert!(verify(&signer.public_key_hex(), b"header", &sig.to_hex()));
/// ```
pub fn verify(public_key_hex: &str, message: &[u8], signature_hex: &str) -> bool {
    verify_strict(public_key_hex, message, signature_hex).is_ok()
}

/// Like [`verify`], but reports why a check failed.
pub fn verify_strict(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), SignatureError> {
    let public_key = PublicKey::from_hex(public_key_hex)
        .map_err(|_| SignatureError::InvalidPublicKey(public_key_hex.to_string()))?;
    let signature =
        Signature::from_hex(signature_hex).map_err(|_| SignatureError::InvalidSignatureEncoding)?;

    if public_key.verify(message, &signature) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}
