//! # Hashing Utilities
//!
//! SHA-512 is the only digest the ledger protocol asks of a client: it binds
//! a transaction header to its payload (`payload_sha512`) and it is the
//! building block of namespace-derived state addresses.
//!
//! Digests travel as lowercase hex, so most callers want [`sha512_hex`].

use sha2::{Digest, Sha512};

/// Compute the SHA-512 digest of `data`. Always 64 bytes.
pub fn sha512(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Lowercase hex of the SHA-512 digest. Always 128 characters.
///
/// # Example
///
/// ```
/// use sawmill_protocol::crypto::sha512_hex;
///
/// let digest = sha512_hex(b"intkey");
/// assert!(digest.starts_with("1cf126"));
/// ```
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(sha512(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_output_length() {
        assert_eq!(sha512(b"").len(), 64);
        assert_eq!(sha512_hex(b"anything").len(), 128);
    }

    #[test]
    fn sha512_known_vector() {
        // FIPS 180-2 test vector for "abc".
        assert_eq!(
            sha512_hex(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn sha512_is_deterministic() {
        assert_eq!(sha512_hex(b"foo"), sha512_hex(b"foo"));
        assert_ne!(sha512_hex(b"foo"), sha512_hex(b"bar"));
    }

    #[test]
    fn sha512_hex_is_lowercase() {
        let digest = sha512_hex(b"case check");
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
