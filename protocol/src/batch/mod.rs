//! # Batch Module
//!
//! Batches are the atomic unit a ledger node commits: either every
//! transaction in a batch is applied, in the listed order, or none is.
//! Batches travel to the node inside a [`BatchList`].
//!
//! ```text
//! builder.rs      — build_batch_header, build_batch, BatchBuilder
//! list.rs         — build_batch_list, decode_batch_list
//! verification.rs — BatchError and verify_batch
//! ```

pub mod builder;
pub mod list;
pub mod verification;

pub use crate::messages::{Batch, BatchHeader, BatchList};
pub use builder::{build_batch, build_batch_header, BatchBuilder};
pub use list::{build_batch_list, decode_batch_list};
pub use verification::{verify_batch, BatchError};
