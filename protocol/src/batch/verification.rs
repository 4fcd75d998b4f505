//! Batch errors and verification.
//!
//! A node accepts a batch only if the batch header signature is valid, the
//! header lists exactly the carried transactions in carried order, every
//! transaction names the batch signer as its batcher, and every transaction
//! verifies on its own. [`verify_batch`] runs the same checks client-side.

use thiserror::Error;

use crate::crypto::keys::{KeyError, PublicKey, Signature};
use crate::messages::{Batch, BatchHeader, Transaction};
use crate::transaction::verification::{is_signature_hex, verify_transaction};
use crate::transaction::TransactionError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while assembling or verifying batches and batch lists.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("a batch must contain at least one transaction")]
    EmptyBatch,

    #[error("a batch list must contain at least one batch")]
    EmptyBatchList,

    #[error("invalid transaction id {id:?}: expected a 128-character header signature")]
    InvalidTransactionId { id: String },

    #[error("batch header lists {expected:?} but the batch carries {actual:?}")]
    TransactionOrderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("batch header names signer {header} but the batch is signed by {signer}")]
    SignerMismatch { header: String, signer: String },

    #[error("invalid public key {key:?}")]
    InvalidPublicKey { key: String },

    #[error("transaction {transaction_id} expects batcher {batcher}, batch signer is {signer}")]
    BatcherMismatch {
        transaction_id: String,
        batcher: String,
        signer: String,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] KeyError),

    #[error("header does not decode: {0}")]
    HeaderDecode(#[from] prost::DecodeError),

    #[error("malformed batch signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("batch signature does not verify against signer {signer}")]
    InvalidSignature { signer: String },

    #[error("transaction {index} is invalid: {source}")]
    Transaction {
        index: usize,
        #[source]
        source: TransactionError,
    },
}

/// Returns `Ok` if the header's ID list equals the carried transactions'
/// header signatures, element by element.
pub(crate) fn check_order(
    header: &BatchHeader,
    transactions: &[Transaction],
) -> Result<(), BatchError> {
    let actual: Vec<String> = transactions
        .iter()
        .map(|txn| txn.header_signature.clone())
        .collect();
    if header.transaction_ids != actual {
        return Err(BatchError::TransactionOrderMismatch {
            expected: header.transaction_ids.clone(),
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signed batch and all of its transactions.
///
/// Returns the decoded batch header on success.
pub fn verify_batch(batch: &Batch) -> Result<BatchHeader, BatchError> {
    let header = batch.decode_header()?;

    if batch.transactions.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    check_order(&header, &batch.transactions)?;

    if !is_signature_hex(&batch.header_signature) {
        return Err(BatchError::MalformedSignature {
            reason: format!("expected 128 hex characters, got {:?}", batch.header_signature),
        });
    }
    let signer = PublicKey::from_hex(&header.signer_public_key).map_err(|_| {
        BatchError::InvalidPublicKey {
            key: header.signer_public_key.clone(),
        }
    })?;
    let signature = Signature::from_hex(&batch.header_signature).map_err(|e| {
        BatchError::MalformedSignature {
            reason: e.to_string(),
        }
    })?;
    if !signer.verify(&batch.header, &signature) {
        return Err(BatchError::InvalidSignature {
            signer: header.signer_public_key,
        });
    }

    for (index, txn) in batch.transactions.iter().enumerate() {
        let txn_header = verify_transaction(txn)
            .map_err(|source| BatchError::Transaction { index, source })?;
        if txn_header.batcher_public_key != header.signer_public_key {
            return Err(BatchError::BatcherMismatch {
                transaction_id: txn.header_signature.clone(),
                batcher: txn_header.batcher_public_key,
                signer: header.signer_public_key,
            });
        }
    }

    Ok(header)
}
