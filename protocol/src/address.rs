//! State addressing.
//!
//! A transaction declares every state address it reads (`inputs`) and writes
//! (`outputs`). The node uses those lists to detect conflicts between
//! transactions it schedules together, and the family handler refuses to
//! touch anything outside them. The client therefore has to compute
//! addresses exactly the way the handler does.
//!
//! The convention is ledger- and family-specific, so it sits behind
//! [`AddressScheme`]. [`NamespacedSha512`] is the `intkey` convention: the
//! first 6 hex chars of `sha512(namespace)` followed by the last 64 hex chars
//! of `sha512(key)`. Any `Fn(&str, &str) -> Result<String, AddressError>` is
//! a scheme too.
//!
//! Length is left to the scheme. The only format rule applied here is
//! [`is_address_hex`], which also admits namespace prefixes such as `1cf126`
//! in input and output lists.

use thiserror::Error;

use crate::config::{ADDRESS_HEX_LENGTH, NAMESPACE_PREFIX_HEX_LENGTH};
use crate::crypto::hash::sha512_hex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address namespace must not be empty")]
    EmptyNamespace,

    #[error("address key must not be empty")]
    EmptyKey,

    #[error("malformed address {address:?}: expected non-empty lowercase hex")]
    Malformed { address: String },
}

/// Maps a logical `(namespace, key)` pair to a state address.
pub trait AddressScheme {
    fn compute_address(&self, namespace: &str, key: &str) -> Result<String, AddressError>;
}

impl<F> AddressScheme for F
where
    F: Fn(&str, &str) -> Result<String, AddressError>,
{
    fn compute_address(&self, namespace: &str, key: &str) -> Result<String, AddressError> {
        self(namespace, key)
    }
}

/// Returns `true` for a non-empty string of lowercase hex characters.
pub fn is_address_hex(address: &str) -> bool {
    !address.is_empty()
        && address
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Checks `address` with [`is_address_hex`], passing it through unchanged.
pub fn check_address(address: String) -> Result<String, AddressError> {
    if is_address_hex(&address) {
        Ok(address)
    } else {
        Err(AddressError::Malformed { address })
    }
}

/// The 6-hex-char prefix that scopes all of a family's addresses.
pub fn namespace_prefix(namespace: &str) -> String {
    let mut digest = sha512_hex(namespace.as_bytes());
    digest.truncate(NAMESPACE_PREFIX_HEX_LENGTH);
    digest
}

/// `prefix(sha512(namespace)) || suffix(sha512(key))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespacedSha512;

impl AddressScheme for NamespacedSha512 {
    fn compute_address(&self, namespace: &str, key: &str) -> Result<String, AddressError> {
        if namespace.is_empty() {
            return Err(AddressError::EmptyNamespace);
        }
        if key.is_empty() {
            return Err(AddressError::EmptyKey);
        }

        let key_digest = sha512_hex(key.as_bytes());
        let suffix_len = ADDRESS_HEX_LENGTH - NAMESPACE_PREFIX_HEX_LENGTH;
        let suffix = &key_digest[key_digest.len() - suffix_len..];

        let mut address = namespace_prefix(namespace);
        address.push_str(suffix);
        Ok(address)
    }
}
