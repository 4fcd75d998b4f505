//! # Key Management
//!
//! secp256k1 signing identities for transaction and batch headers.
//!
//! A run of the client creates one [`Secp256k1Signer`], uses it to sign a
//! transaction header and a batch header, and drops it. Keys are never
//! written anywhere by this crate.
//!
//! ## Wire conventions
//!
//! - Public keys are 33-byte compressed SEC1 points, hex-encoded (66 chars).
//! - Signatures are ECDSA over SHA-256 of the message, RFC 6979 nonces,
//!   low-S normalized, serialized as compact `r || s` (64 bytes, 128 hex).
//!
//! The signer signs the *raw* message bytes; hashing happens inside the
//! ECDSA step. Callers must never pre-hash a header before signing it.
//!
//! ## Security considerations
//!
//! - Secret scalars are drawn from `OsRng`. A failing OS RNG is reported as
//!   [`KeyError::Generation`] rather than a panic.
//! - `Debug` never prints secret material.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH};

/// Draws before giving up on finding a scalar in `[1, n)`. The chance of a
/// single draw missing is about 2^-128.
const MAX_KEYGEN_DRAWS: usize = 8;

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key generation failed: {0}")]
    Generation(String),

    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid secp256k1 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64-byte compact encoding")]
    InvalidSignature,

    #[error("signing failed: {0}")]
    Signing(String),
}

/// A secp256k1 signing identity.
///
/// Exposes exactly what the header assemblers need: [`sign`](Self::sign)
/// and [`public_key_hex`](Self::public_key_hex).
///
/// # Examples
///
/// ```
/// use sawmill_protocol::crypto::keys::Secp256k1Signer;
///
/// let signer = Secp256k1Signer::generate().unwrap();
/// let sig = signer.sign(b"header bytes").unwrap();
/// assert!(signer.public_key().verify(b"header bytes", &sig));
/// ```
pub struct Secp256k1Signer {
    signing_key: SigningKey,
}

/// The public half of a signing identity, as embedded in headers.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

/// A compact ECDSA signature over a header.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: EcdsaSignature,
}

// ---------------------------------------------------------------------------
// Secp256k1Signer
// ---------------------------------------------------------------------------

impl Secp256k1Signer {
    /// Generates a fresh identity from the OS cryptographic RNG.
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generates a fresh identity from the given RNG.
    ///
    /// Draws 32 bytes and accepts them if they form a valid scalar. The RNG's
    /// own failure (`try_fill_bytes`) becomes [`KeyError::Generation`].
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyError> {
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        for _ in 0..MAX_KEYGEN_DRAWS {
            rng.try_fill_bytes(&mut seed)
                .map_err(|e| KeyError::Generation(e.to_string()))?;
            let candidate = SigningKey::from_slice(&seed);
            seed.fill(0);
            if let Ok(signing_key) = candidate {
                return Ok(Self { signing_key });
            }
        }
        Err(KeyError::Generation(format!(
            "no valid secp256k1 scalar after {MAX_KEYGEN_DRAWS} draws"
        )))
    }

    /// Reconstructs an identity from a 32-byte big-endian secret scalar.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, KeyError> {
        if secret.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let signing_key = SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Reconstructs an identity from a hex-encoded secret scalar.
    ///
    /// Handy for pinning a key in tests or replaying a known batch. The
    /// client itself always generates.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the public key of this identity.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: self.signing_key.verifying_key().clone(),
        }
    }

    /// Hex-encoded compressed public key, as written into headers.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Signs `message` (the raw header bytes).
    ///
    /// ECDSA with RFC 6979 nonces is deterministic: the same key and message
    /// always produce the same signature.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, KeyError> {
        let inner: EcdsaSignature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| KeyError::Signing(e.to_string()))?;
        Ok(Signature { inner })
    }

    /// Exports the raw secret scalar. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut out = [0u8; SECRET_KEY_LENGTH];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Signer(pub={})", self.public_key_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Parses a SEC1-encoded point (compressed or uncompressed).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// Parses a hex-encoded SEC1 point.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Compressed SEC1 encoding, 33 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let encoded = self.key.to_encoded_point(true);
        debug_assert_eq!(encoded.as_bytes().len(), PUBLIC_KEY_LENGTH);
        encoded.as_bytes().to_vec()
    }

    /// Hex of the compressed encoding. 66 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Returns `true` if `signature` is valid for `message` under this key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.key.verify(message, &signature.inner).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Parses a compact 64-byte `r || s` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        let inner = EcdsaSignature::from_slice(bytes).map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { inner })
    }

    /// Parses a hex-encoded compact signature.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_bytes(&bytes)
    }

    /// Compact `r || s` bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Hex of the compact encoding. This string is the header signature and
    /// therefore the ID of whatever was signed.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}
