//! Batch lists: the unit of submission.

use prost::Message;

use crate::messages::{Batch, BatchList};

use super::verification::BatchError;

/// Wraps `batches` in a [`BatchList`] and serializes it.
///
/// The returned bytes are the HTTP request body, sent as is.
pub fn build_batch_list(batches: Vec<Batch>) -> Result<Vec<u8>, BatchError> {
    if batches.is_empty() {
        return Err(BatchError::EmptyBatchList);
    }
    let list = BatchList { batches };
    let bytes = list.encode_to_vec();
    tracing::debug!(
        batches = list.batches.len(),
        bytes = bytes.len(),
        "batch list encoded"
    );
    Ok(bytes)
}

/// Parses a serialized batch list.
pub fn decode_batch_list(bytes: &[u8]) -> Result<BatchList, BatchError> {
    let list = BatchList::decode(bytes)?;
    if list.batches.is_empty() {
        return Err(BatchError::EmptyBatchList);
    }
    Ok(list)
}
