//! Batch construction.
//!
//! Two layers, mirroring the transaction module:
//!
//! - [`build_batch_header`] and [`build_batch`] take explicit inputs and do
//!   one step each. The header bytes produced by the first are the bytes
//!   signed by the second.
//! - [`BatchBuilder`] accumulates transactions and runs both steps, so the
//!   header's ID list is taken from the transactions themselves and cannot
//!   drift out of order.

use prost::Message;

use crate::crypto::keys::Secp256k1Signer;
use crate::messages::{Batch, BatchHeader, Transaction};
use crate::transaction::verification::is_signature_hex;

use super::verification::{check_order, BatchError};

/// Serializes a [`BatchHeader`] naming `signer` and listing
/// `transaction_ids` in the given order.
pub fn build_batch_header(
    signer: &Secp256k1Signer,
    transaction_ids: &[String],
) -> Result<Vec<u8>, BatchError> {
    if transaction_ids.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    if let Some(id) = transaction_ids.iter().find(|id| !is_signature_hex(id)) {
        return Err(BatchError::InvalidTransactionId { id: id.clone() });
    }

    let header = BatchHeader {
        signer_public_key: signer.public_key_hex(),
        transaction_ids: transaction_ids.to_vec(),
    };
    Ok(header.encode_to_vec())
}

/// Signs `header_bytes` and assembles the [`Batch`].
///
/// The header must name `signer` and list exactly the IDs of
/// `transactions`, in order. Both are checked here, since a node rejects
/// the whole batch otherwise.
pub fn build_batch(
    header_bytes: Vec<u8>,
    signer: &Secp256k1Signer,
    transactions: Vec<Transaction>,
) -> Result<Batch, BatchError> {
    if transactions.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    let header = BatchHeader::decode(header_bytes.as_slice())?;
    let signer_public_key = signer.public_key_hex();
    if header.signer_public_key != signer_public_key {
        return Err(BatchError::SignerMismatch {
            header: header.signer_public_key,
            signer: signer_public_key,
        });
    }
    check_order(&header, &transactions)?;

    let signature = signer.sign(&header_bytes).map_err(BatchError::Signing)?;
    let batch = Batch {
        header: header_bytes,
        header_signature: signature.to_hex(),
        transactions,
        trace: false,
    };

    tracing::debug!(
        batch_id = %batch.header_signature,
        transactions = batch.transactions.len(),
        "batch signed"
    );
    Ok(batch)
}

/// Accumulates transactions and produces a signed batch.
///
/// ```rust
/// use sawmill_protocol::batch::BatchBuilder;
/// use sawmill_protocol::crypto::Secp256k1Signer;
/// # use sawmill_protocol::payload::Payload;
/// # use sawmill_protocol::transaction::{build_transaction, TransactionHeaderBuilder};
///
/// let signer = Secp256k1Signer::generate().unwrap();
/// # let payload = Payload::example().encode().unwrap();
/// # let header = TransactionHeaderBuilder::new("intkey", "1.0")
/// #     .build_header(&payload, &signer).unwrap();
/// # let txn = build_transaction(header, &signer, payload).unwrap();
/// let batch = BatchBuilder::new(&signer).transaction(txn).build().unwrap();
/// assert_eq!(batch.transactions.len(), 1);
/// ```
#[derive(Debug)]
pub struct BatchBuilder<'a> {
    signer: &'a Secp256k1Signer,
    transactions: Vec<Transaction>,
    trace: bool,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(signer: &'a Secp256k1Signer) -> Self {
        Self {
            signer,
            transactions: Vec::new(),
            trace: false,
        }
    }

    /// Appends a transaction. Commit order is append order.
    pub fn transaction(mut self, txn: Transaction) -> Self {
        self.transactions.push(txn);
        self
    }

    pub fn transactions<I>(mut self, txns: I) -> Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        self.transactions.extend(txns);
        self
    }

    /// Sets the batch's trace flag.
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn build(self) -> Result<Batch, BatchError> {
        let ids: Vec<String> = self
            .transactions
            .iter()
            .map(|txn| txn.header_signature.clone())
            .collect();
        let header = build_batch_header(self.signer, &ids)?;
        let mut batch = build_batch(header, self.signer, self.transactions)?;
        // trace (field 4) is outside the signed header
        batch.trace = self.trace;
        Ok(batch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signatures::verify;
    use crate::payload::Payload;
    use crate::transaction::{build_transaction, TransactionHeaderBuilder};

    const ADDR: &str = "1cf1266e282c41be5e4254d8820772c5518a2c5a8c0c7f7eda19594a7eb539453e1ed7";

    fn txn(signer: &Secp256k1Signer, value: i64) -> Transaction {
        let payload = Payload::intkey("inc", "foo", value).encode().unwrap();
        let header = TransactionHeaderBuilder::new("intkey", "1.0")
            .input(ADDR)
            .output(ADDR)
            .build_header(&payload, signer)
            .unwrap();
        build_transaction(header, signer, payload).unwrap()
    }

    #[test]
    fn order_is_preserved() {
        let signer = Secp256k1Signer::generate().unwrap();
        let (t1, t2, t3) = (txn(&signer, 1), txn(&signer, 2), txn(&signer, 3));
        let expected = vec![
            t1.header_signature.clone(),
            t2.header_signature.clone(),
            t3.header_signature.clone(),
        ];

        let batch = BatchBuilder::new(&signer)
            .transactions(vec![t1, t2, t3])
            .build()
            .unwrap();

        let header = batch.decode_header().unwrap();
        assert_eq!(header.transaction_ids, expected);
        assert_eq!(batch.transaction_ids(), expected);
    }

    #[test]
    fn batch_signature_covers_raw_header() {
        let signer = Secp256k1Signer::generate().unwrap();
        let batch = BatchBuilder::new(&signer)
            .transaction(txn(&signer, 1))
            .build()
            .unwrap();
        assert!(verify(
            &signer.public_key_hex(),
            &batch.header,
            &batch.header_signature
        ));
        assert_eq!(batch.id(), batch.header_signature);
    }

    #[test]
    fn empty_batch_rejected() {
        let signer = Secp256k1Signer::generate().unwrap();
        assert!(matches!(
            BatchBuilder::new(&signer).build(),
            Err(BatchError::EmptyBatch)
        ));
        assert!(matches!(
            build_batch_header(&signer, &[]),
            Err(BatchError::EmptyBatch)
        ));
    }

    #[test]
    fn header_listing_wrong_order_rejected() {
        let signer = Secp256k1Signer::generate().unwrap();
        let (t1, t2) = (txn(&signer, 1), txn(&signer, 2));
        let header = build_batch_header(
            &signer,
            &[t2.header_signature.clone(), t1.header_signature.clone()],
        )
        .unwrap();
        assert!(matches!(
            build_batch(header, &signer, vec![t1, t2]),
            Err(BatchError::TransactionOrderMismatch { .. })
        ));
    }

    #[test]
    fn header_listing_wrong_count_rejected() {
        let signer = Secp256k1Signer::generate().unwrap();
        let (t1, t2) = (txn(&signer, 1), txn(&signer, 2));
        let header = build_batch_header(&signer, &[t1.header_signature.clone()]).unwrap();
        assert!(matches!(
            build_batch(header, &signer, vec![t1, t2]),
            Err(BatchError::TransactionOrderMismatch { .. })
        ));
    }

    #[test]
    fn header_for_other_signer_rejected() {
        let signer = Secp256k1Signer::generate().unwrap();
        let other = Secp256k1Signer::generate().unwrap();
        let t1 = txn(&signer, 1);
        let header = build_batch_header(&other, &[t1.header_signature.clone()]).unwrap();
        assert!(matches!(
            build_batch(header, &signer, vec![t1]),
            Err(BatchError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn malformed_id_rejected() {
        let signer = Secp256k1Signer::generate().unwrap();
        assert!(matches!(
            build_batch_header(&signer, &["t1".to_string()]),
            Err(BatchError::InvalidTransactionId { .. })
        ));
    }

    #[test]
    fn trace_flag_is_set_outside_header() {
        let signer = Secp256k1Signer::generate().unwrap();
        let t = txn(&signer, 1);
        let plain = BatchBuilder::new(&signer)
            .transaction(t.clone())
            .build()
            .unwrap();
        let traced = BatchBuilder::new(&signer)
            .transaction(t)
            .trace(true)
            .build()
            .unwrap();
        assert!(traced.trace);
        assert_eq!(plain.header, traced.header);
        assert_eq!(plain.header_signature, traced.header_signature);
    }
}
