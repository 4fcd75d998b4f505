//! Transaction signing.
//!
//! The signer signs the serialized header bytes as they are, and the
//! resulting signature becomes both `header_signature` and the transaction
//! ID. The payload is carried alongside unchanged; the header already
//! commits to its digest.

use crate::crypto::keys::Secp256k1Signer;
use crate::messages::Transaction;

use super::verification::TransactionError;

/// Signs `header_bytes` and assembles the [`Transaction`].
///
/// `header_bytes` must be the output of
/// [`TransactionHeaderBuilder::build_header`](super::TransactionHeaderBuilder::build_header)
/// for these same `payload_bytes`; otherwise the ledger rejects the
/// transaction on the payload digest. A signing failure is not retried here;
/// the caller restarts from a fresh key.
pub fn build_transaction(
    header_bytes: Vec<u8>,
    signer: &Secp256k1Signer,
    payload_bytes: Vec<u8>,
) -> Result<Transaction, TransactionError> {
    let signature = signer
        .sign(&header_bytes)
        .map_err(TransactionError::Signing)?;
    let header_signature = signature.to_hex();

    tracing::debug!(transaction_id = %header_signature, "transaction signed");

    Ok(Transaction {
        header: header_bytes,
        header_signature,
        payload: payload_bytes,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
