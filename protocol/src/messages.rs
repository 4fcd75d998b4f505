//! Protocol-buffer wire messages.
//!
//! Field numbers and types match the ledger node's schema exactly; a node
//! decodes these bytes with its own generated code, so nothing here may be
//! renumbered. Written out by hand (rather than generated from `.proto`
//! files) to keep the build free of `protoc`.
//!
//! ```text
//! BatchList ─┬─ Batch ─┬─ header: BatchHeader bytes ── signer_public_key, transaction_ids[]
//!            │         ├─ header_signature (batch ID)
//!            │         └─ Transaction ─┬─ header: TransactionHeader bytes
//!            │                         ├─ header_signature (transaction ID)
//!            │                         └─ payload
//!            └─ Batch ...
//! ```
//!
//! `prost` writes fields in tag order and skips default values, so
//! decode-then-encode reproduces the original bytes.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct TransactionHeader {
    /// Public key of the party allowed to wrap this transaction in a batch.
    #[prost(string, tag = "1")]
    pub batcher_public_key: String,
    /// Header signatures of transactions that must commit first.
    #[prost(string, repeated, tag = "2")]
    pub dependencies: Vec<String>,
    #[prost(string, tag = "3")]
    pub family_name: String,
    #[prost(string, tag = "4")]
    pub family_version: String,
    /// State addresses the transaction may read.
    #[prost(string, repeated, tag = "5")]
    pub inputs: Vec<String>,
    /// Arbitrary string that makes otherwise-identical headers distinct.
    #[prost(string, tag = "6")]
    pub nonce: String,
    /// State addresses the transaction may write.
    #[prost(string, repeated, tag = "7")]
    pub outputs: Vec<String>,
    #[prost(string, tag = "9")]
    pub payload_sha512: String,
    #[prost(string, tag = "10")]
    pub signer_public_key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
    /// Serialized [`TransactionHeader`].
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// Signature over `header`; also the transaction ID.
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchHeader {
    #[prost(string, tag = "1")]
    pub signer_public_key: String,
    /// Transaction IDs in commit order.
    #[prost(string, repeated, tag = "2")]
    pub transaction_ids: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Batch {
    /// Serialized [`BatchHeader`].
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// Signature over `header`; also the batch ID.
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(message, repeated, tag = "3")]
    pub transactions: Vec<Transaction>,
    /// Asks the node to log this batch's progress through validation.
    #[prost(bool, tag = "4")]
    pub trace: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchList {
    #[prost(message, repeated, tag = "1")]
    pub batches: Vec<Batch>,
}

impl Transaction {
    /// The transaction ID.
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    /// Decodes the embedded header.
    pub fn decode_header(&self) -> Result<TransactionHeader, prost::DecodeError> {
        TransactionHeader::decode(self.header.as_slice())
    }
}

impl Batch {
    /// The batch ID.
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    /// Decodes the embedded header.
    pub fn decode_header(&self) -> Result<BatchHeader, prost::DecodeError> {
        BatchHeader::decode(self.header.as_slice())
    }

    /// IDs of the member transactions, in list order.
    pub fn transaction_ids(&self) -> Vec<String> {
        self.transactions
            .iter()
            .map(|txn| txn.header_signature.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> TransactionHeader {
        TransactionHeader {
            batcher_public_key: "02aa".into(),
            dependencies: vec![],
            family_name: "intkey".into(),
            family_version: "1.0".into(),
            inputs: vec!["1cf126".into()],
            nonce: String::new(),
            outputs: vec!["1cf126".into()],
            payload_sha512: "ab".repeat(64),
            signer_public_key: "02aa".into(),
        }
    }

    #[test]
    fn transaction_header_field_numbers() {
        let bytes = TransactionHeader {
            family_name: "x".into(),
            ..Default::default()
        }
        .encode_to_vec();
        // tag 3, wire type 2 (length-delimited), length 1, "x"
        assert_eq!(bytes, vec![0x1a, 0x01, b'x']);

        let bytes = TransactionHeader {
            signer_public_key: "k".into(),
            ..Default::default()
        }
        .encode_to_vec();
        // tag 10 -> (10 << 3) | 2 = 0x52
        assert_eq!(bytes, vec![0x52, 0x01, b'k']);
    }

    #[test]
    fn empty_nonce_is_omitted() {
        let without = sample_header().encode_to_vec();
        let with_nonce = TransactionHeader {
            nonce: "n".into(),
            ..sample_header()
        }
        .encode_to_vec();
        // tag 6 -> 0x32, length 1, "n"
        assert_eq!(with_nonce.len(), without.len() + 3);
        assert!(with_nonce.windows(3).any(|w| w == [0x32, 0x01, b'n']));
    }

    #[test]
    fn header_roundtrip_is_byte_identical() {
        let bytes = sample_header().encode_to_vec();
        let decoded = TransactionHeader::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, sample_header());
        assert_eq!(decoded.encode_to_vec(), bytes);
    }

    #[test]
    fn batch_list_leads_with_batches_tag() {
        let list = BatchList {
            batches: vec![Batch {
                header: vec![1, 2, 3],
                header_signature: "sig".into(),
                transactions: vec![],
                trace: false,
            }],
        };
        let bytes = list.encode_to_vec();
        assert_eq!(bytes[0], 0x0a, "field 1, length-delimited");
    }

    #[test]
    fn batch_transaction_ids_follow_list_order() {
        let txn = |sig: &str| Transaction {
            header: vec![],
            header_signature: sig.into(),
            payload: vec![],
        };
        let batch = Batch {
            header: vec![],
            header_signature: "b".into(),
            transactions: vec![txn("t1"), txn("t2"), txn("t3")],
            trace: false,
        };
        assert_eq!(batch.transaction_ids(), vec!["t1", "t2", "t3"]);
        assert_eq!(batch.id(), "b");
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let bytes = sample_header().encode_to_vec();
        assert!(TransactionHeader::decode(&bytes[..bytes.len() - 1]).is_err());
    }
}
