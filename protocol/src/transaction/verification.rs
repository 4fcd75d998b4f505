//! Transaction errors and verification.
//!
//! [`verify_transaction`] is the client-side mirror of what a node checks
//! before it schedules a transaction: the header decodes, the header
//! signature is valid for the signer key in that header, and the payload
//! digest in the header matches the payload actually carried.
//!
//! The checks run cheapest first.

use thiserror::Error;

use crate::config::{PUBLIC_KEY_HEX_LENGTH, SHA512_HEX_LENGTH, SIGNATURE_HEX_LENGTH};
use crate::crypto::hash::sha512_hex;
use crate::crypto::keys::{KeyError, PublicKey, Signature};
use crate::messages::{Transaction, TransactionHeader};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while assembling or verifying a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("family name must not be empty")]
    EmptyFamilyName,

    #[error("family version must not be empty")]
    EmptyFamilyVersion,

    #[error("invalid state address: {address:?}")]
    InvalidAddress { address: String },

    #[error("invalid dependency {dependency:?}: expected a 128-character header signature")]
    InvalidDependency { dependency: String },

    #[error("invalid public key {key:?}")]
    InvalidPublicKey { key: String },

    #[error("signing failed: {0}")]
    Signing(#[source] KeyError),

    #[error("header does not decode: {0}")]
    HeaderDecode(#[from] prost::DecodeError),

    #[error("malformed header signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("header signature does not verify against signer {signer}")]
    InvalidSignature { signer: String },

    #[error("malformed payload digest {digest:?}: expected 128 hex characters")]
    MalformedPayloadDigest { digest: String },

    #[error("payload digest mismatch: header says {expected}, payload hashes to {actual}")]
    PayloadDigestMismatch { expected: String, actual: String },
}

pub(crate) fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub(crate) fn is_public_key_hex(value: &str) -> bool {
    is_hex_of_len(value, PUBLIC_KEY_HEX_LENGTH)
}

pub(crate) fn is_signature_hex(value: &str) -> bool {
    is_hex_of_len(value, SIGNATURE_HEX_LENGTH)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signed transaction and returns its decoded header.
///
/// The checks, in order:
///
/// 1. **Header** — `header` decodes as a [`TransactionHeader`].
/// 2. **Signature shape** — `header_signature` is 128 hex characters.
/// 3. **Payload digest** — `payload_sha512` is 128 hex characters and equals
///    SHA-512 of `payload`.
/// 4. **Signature** — valid over the raw header bytes for the header's
///    `signer_public_key`.
pub fn verify_transaction(txn: &Transaction) -> Result<TransactionHeader, TransactionError> {
    let header = txn.decode_header()?;

    if !is_signature_hex(&txn.header_signature) {
        return Err(TransactionError::MalformedSignature {
            reason: format!(
                "expected {} hex characters, got {:?}",
                SIGNATURE_HEX_LENGTH, txn.header_signature
            ),
        });
    }

    if !is_hex_of_len(&header.payload_sha512, SHA512_HEX_LENGTH) {
        return Err(TransactionError::MalformedPayloadDigest {
            digest: header.payload_sha512,
        });
    }

    let actual = sha512_hex(&txn.payload);
    if header.payload_sha512 != actual {
        return Err(TransactionError::PayloadDigestMismatch {
            expected: header.payload_sha512,
            actual,
        });
    }

    let signer = PublicKey::from_hex(&header.signer_public_key).map_err(|_| {
        TransactionError::InvalidPublicKey {
            key: header.signer_public_key.clone(),
        }
    })?;
    let signature = Signature::from_hex(&txn.header_signature).map_err(|e| {
        TransactionError::MalformedSignature {
            reason: e.to_string(),
        }
    })?;

    if !signer.verify(&txn.header, &signature) {
        return Err(TransactionError::InvalidSignature {
            signer: header.signer_public_key,
        });
    }

    Ok(header)
}
