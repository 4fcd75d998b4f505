//! Transaction header construction via the builder pattern.
//!
//! The [`TransactionHeaderBuilder`] collects the routing and integrity
//! metadata of a transaction (family, addresses, dependencies, nonce) and,
//! given the encoded payload and the signer, produces the serialized header.
//!
//! The builder does not sign. That happens in [`super::signing`], which
//! takes the header bytes exactly as produced here.

use crate::address::is_address_hex;
use crate::crypto::hash::sha512_hex;
use crate::crypto::keys::Secp256k1Signer;
use crate::messages::TransactionHeader;

use super::verification::{is_public_key_hex, is_signature_hex, TransactionError};

/// Fluent builder for serialized [`TransactionHeader`]s.
///
/// # Usage
///
/// ```rust
/// use sawmill_protocol::crypto::Secp256k1Signer;
/// use sawmill_protocol::payload::Payload;
/// use sawmill_protocol::transaction::TransactionHeaderBuilder;
///
/// let signer = Secp256k1Signer::generate().unwrap();
/// let payload = Payload::example().encode().unwrap();
/// let address = "1cf1266e282c41be5e4254d8820772c5518a2c5a8c0c7f7eda19594a7eb539453e1ed7";
///
/// let header_bytes = TransactionHeaderBuilder::new("intkey", "1.0")
///     .input(address)
///     .output(address)
///     .build_header(&payload, &signer)
///     .unwrap();
/// assert!(!header_bytes.is_empty());
/// ```
///
/// The batcher key defaults to the signer's key. A transaction meant to be
/// batched by another party must name that party's key explicitly.
#[derive(Debug, Clone)]
pub struct TransactionHeaderBuilder {
    family_name: String,
    family_version: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    dependencies: Vec<String>,
    batcher_public_key: Option<String>,
    nonce: String,
}

impl TransactionHeaderBuilder {
    /// Creates a builder for the given transaction family.
    pub fn new(family_name: &str, family_version: &str) -> Self {
        Self {
            family_name: family_name.to_string(),
            family_version: family_version.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            dependencies: Vec::new(),
            batcher_public_key: None,
            nonce: String::new(),
        }
    }

    /// Adds a state address the transaction may read.
    pub fn input(mut self, address: &str) -> Self {
        self.inputs.push(address.to_string());
        self
    }

    /// Adds several input addresses.
    pub fn inputs<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Adds a state address the transaction may write.
    pub fn output(mut self, address: &str) -> Self {
        self.outputs.push(address.to_string());
        self
    }

    /// Adds several output addresses.
    pub fn outputs<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Adds the ID of a transaction that must be committed before this one.
    pub fn dependency(mut self, transaction_id: &str) -> Self {
        self.dependencies.push(transaction_id.to_string());
        self
    }

    /// Adds several dependencies, order preserved.
    pub fn dependencies<I, S>(mut self, transaction_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(transaction_ids.into_iter().map(Into::into));
        self
    }

    /// Names the key that will sign the enclosing batch.
    pub fn batcher_public_key(mut self, public_key_hex: &str) -> Self {
        self.batcher_public_key = Some(public_key_hex.to_string());
        self
    }

    /// Sets a nonce. Left empty, the field is omitted from the encoding.
    pub fn nonce(mut self, nonce: &str) -> Self {
        self.nonce = nonce.to_string();
        self
    }

    /// Validates the collected fields and produces the header message.
    ///
    /// Addresses must be non-empty lowercase hex. Their length is the
    /// ledger's business, so full addresses and namespace prefixes both pass.
    ///
    /// `payload_sha512` is computed from `payload_bytes`, binding the header
    /// to exactly these bytes.
    pub fn header(
        self,
        payload_bytes: &[u8],
        signer: &Secp256k1Signer,
    ) -> Result<TransactionHeader, TransactionError> {
        if self.family_name.is_empty() {
            return Err(TransactionError::EmptyFamilyName);
        }
        if self.family_version.is_empty() {
            return Err(TransactionError::EmptyFamilyVersion);
        }
        if let Some(address) = self
            .inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|a| !is_address_hex(a))
        {
            return Err(TransactionError::InvalidAddress {
                address: address.clone(),
            });
        }
        if let Some(dependency) = self.dependencies.iter().find(|d| !is_signature_hex(d)) {
            return Err(TransactionError::InvalidDependency {
                dependency: dependency.clone(),
            });
        }

        let signer_public_key = signer.public_key_hex();
        let batcher_public_key = match self.batcher_public_key {
            Some(key) if !is_public_key_hex(&key) => {
                return Err(TransactionError::InvalidPublicKey { key })
            }
            Some(key) => key,
            None => signer_public_key.clone(),
        };

        Ok(TransactionHeader {
            batcher_public_key,
            dependencies: self.dependencies,
            family_name: self.family_name,
            family_version: self.family_version,
            inputs: self.inputs,
            nonce: self.nonce,
            outputs: self.outputs,
            payload_sha512: sha512_hex(payload_bytes),
            signer_public_key,
        })
    }

    /// Like [`header`](Self::header), serialized. These are the bytes that
    /// get signed.
    pub fn build_header(
        self,
        payload_bytes: &[u8],
        signer: &Secp256k1Signer,
    ) -> Result<Vec<u8>, TransactionError> {
        use prost::Message;

        let header = self.header(payload_bytes, signer)?;
        let bytes = header.encode_to_vec();
        tracing::debug!(
            family = %header.family_name,
            version = %header.family_version,
            inputs = header.inputs.len(),
            outputs = header.outputs.len(),
            dependencies = header.dependencies.len(),
            bytes = bytes.len(),
            "transaction header built"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;

    const ADDR: &str = "1cf1266e282c41be5e4254d8820772c5518a2c5a8c0c7f7eda19594a7eb539453e1ed7";

    fn signer() -> Secp256k1Signer {
        Secp256k1Signer::from_hex("0000000000000000000000000000000000000000000000000000000000000007")
            .unwrap()
    }

    fn sample_builder() -> TransactionHeaderBuilder {
        TransactionHeaderBuilder::new("intkey", "1.0")
            .input(ADDR)
            .output(ADDR)
    }

    #[test]
    fn payload_digest_is_bound() {
        let payload = Payload::example().encode().unwrap();
        let header = sample_builder().header(&payload, &signer()).unwrap();
        assert_eq!(
            header.payload_sha512,
            "e1cb6185c30d4f939dfbd566b1b565aacecac38fe6acab4f8ae1c144066d2c10\
             cfd141fb80bf899db34be68bafc63896c41b638bff044900aa41180284f03f0e"
        );
    }

    #[test]
    fn header_bytes_are_deterministic() {
        let payload = Payload::example().encode().unwrap();
        let a = sample_builder().build_header(&payload, &signer()).unwrap();
        let b = sample_builder().build_header(&payload, &signer()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batcher_defaults_to_signer() {
        let s = signer();
        let header = sample_builder().header(b"p", &s).unwrap();
        assert_eq!(header.batcher_public_key, s.public_key_hex());
        assert_eq!(header.signer_public_key, s.public_key_hex());
    }

    #[test]
    fn explicit_batcher_is_kept() {
        let batcher = Secp256k1Signer::generate().unwrap().public_key_hex();
        let header = sample_builder()
            .batcher_public_key(&batcher)
            .header(b"p", &signer())
            .unwrap();
        assert_eq!(header.batcher_public_key, batcher);
        assert_ne!(header.signer_public_key, batcher);
    }

    #[test]
    fn malformed_batcher_rejected() {
        let err = sample_builder()
            .batcher_public_key("02abc")
            .header(b"p", &signer())
            .unwrap_err();
        assert!(matches!(err, TransactionError::InvalidPublicKey { .. }));
    }

    #[test]
    fn dependencies_keep_order() {
        let d1 = "1".repeat(128);
        let d2 = "2".repeat(128);
        let header = sample_builder()
            .dependency(&d1)
            .dependencies([d2.clone()])
            .header(b"p", &signer())
            .unwrap();
        assert_eq!(header.dependencies, vec![d1, d2]);
    }

    #[test]
    fn malformed_dependency_rejected() {
        let err = sample_builder()
            .dependency("not-a-signature")
            .header(b"p", &signer())
            .unwrap_err();
        assert!(matches!(err, TransactionError::InvalidDependency { .. }));
    }

    #[test]
    fn non_hex_address_rejected() {
        for bad in ["", "state/foo", "1CF126"] {
            let err = TransactionHeaderBuilder::new("intkey", "1.0")
                .input(bad)
                .header(b"p", &signer())
                .unwrap_err();
            assert!(matches!(err, TransactionError::InvalidAddress { .. }));
        }
    }

    #[test]
    fn prefix_and_short_addresses_accepted() {
        let short = "ab".repeat(32);
        let header = TransactionHeaderBuilder::new("intkey", "1.0")
            .input("1cf126")
            .output(&short)
            .header(b"p", &signer())
            .unwrap();
        assert_eq!(header.inputs, vec!["1cf126"]);
        assert_eq!(header.outputs, vec![short]);
    }

    #[test]
    fn empty_family_rejected() {
        assert!(matches!(
            TransactionHeaderBuilder::new("", "1.0").header(b"p", &signer()),
            Err(TransactionError::EmptyFamilyName)
        ));
        assert!(matches!(
            TransactionHeaderBuilder::new("intkey", "").header(b"p", &signer()),
            Err(TransactionError::EmptyFamilyVersion)
        ));
    }

    #[test]
    fn nonce_changes_header_bytes() {
        let a = sample_builder().build_header(b"p", &signer()).unwrap();
        let b = sample_builder()
            .nonce("1700000000")
            .build_header(b"p", &signer())
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bulk_address_setters() {
        let header = TransactionHeaderBuilder::new("intkey", "1.0")
            .inputs(vec![ADDR, ADDR])
            .outputs([ADDR.to_string()])
            .header(b"p", &signer())
            .unwrap();
        assert_eq!(header.inputs.len(), 2);
        assert_eq!(header.outputs, vec![ADDR.to_string()]);
    }
}
