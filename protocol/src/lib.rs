// Copyright (c) 2026 Sawmill Developers. MIT License.
// See LICENSE for details.

//! # Sawmill Protocol — Core Library
//!
//! Client-side construction of signed transactions and batches for
//! batch-oriented ledgers, plus the HTTP plumbing to hand a batch list to a
//! ledger node's REST endpoint.
//!
//! Nothing here runs a ledger. We build the exact bytes a node expects,
//! sign them with secp256k1, and POST them. Everything between "here is a
//! payload" and "here are the bytes on the wire" is deterministic.
//!
//! ## Architecture
//!
//! - **crypto** — secp256k1 signer, SHA-512 digests, signature checks.
//! - **payload** — canonical CBOR encoding of application payloads.
//! - **address** — state address schemes (fixed, or namespace-derived).
//! - **messages** — protocol-buffer wire messages (headers, batches, lists).
//! - **transaction** — transaction header construction, signing, verification.
//! - **batch** — batch header construction, batches, batch lists.
//! - **submit** — HTTP submission with timeouts and bounded retry.
//! - **pipeline** — the end-to-end flow as a chain of immutable stages.
//! - **config** — protocol constants and client configuration.
//!
//! ## Pipeline
//!
//! ```text
//! Secp256k1Signer ──► Payload::encode ──► TransactionHeaderBuilder ──► build_transaction
//!                                                                          │
//!         Submitter::submit_batch_list ◄── build_batch_list ◄── BatchBuilder
//! ```
//!
//! Each arrow consumes the previous stage's output and produces a new value.
//! Nothing is mutated after construction: header bytes are signed exactly as
//! they were encoded, and the signature becomes the entity's identifier.

pub mod address;
pub mod batch;
pub mod config;
pub mod crypto;
pub mod messages;
pub mod payload;
pub mod pipeline;
pub mod submit;
pub mod transaction;
