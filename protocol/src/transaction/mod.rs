//! # Transaction Module
//!
//! Construction, signing, and verification of ledger transactions.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs      — TransactionHeaderBuilder: family, addresses, dependencies, payload digest
//! signing.rs      — build_transaction: sign the header bytes, assemble the Transaction
//! verification.rs — TransactionError and verify_transaction
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Encode** — the application payload becomes CBOR bytes.
//! 2. **Header** — [`TransactionHeaderBuilder::build_header`] commits to the
//!    payload's SHA-512 and serializes the header.
//! 3. **Sign** — [`build_transaction`] signs those exact bytes. The signature
//!    is the transaction ID.
//! 4. **Batch** — the transaction goes into a batch (see [`crate::batch`]).
//!
//! ## Design Decisions
//!
//! - Headers are signed as serialized, never re-encoded. Re-encoding could
//!   reorder or normalize fields and break the signature.
//! - The batcher key defaults to the signer key, covering the common case of
//!   one party building and batching its own transactions.
//! - An empty nonce is omitted from the encoding entirely.

pub mod builder;
pub mod signing;
pub mod verification;

pub use crate::messages::{Transaction, TransactionHeader};
pub use builder::TransactionHeaderBuilder;
pub use signing::build_transaction;
pub use verification::{verify_transaction, TransactionError};
