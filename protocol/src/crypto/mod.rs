//! # Cryptographic Primitives
//!
//! The three things a ledger client needs from cryptography:
//!
//! - **secp256k1 ECDSA** to sign transaction and batch headers.
//! - **SHA-512** to bind a header to its payload and to derive addresses.
//! - **Verification** of signatures exactly as they appear in headers.
//!
//! Everything here is a thin, typed wrapper over `k256` and `sha2`.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha512, sha512_hex};
pub use keys::{KeyError, PublicKey, Secp256k1Signer, Signature};
pub use signatures::{verify, verify_strict, SignatureError};
