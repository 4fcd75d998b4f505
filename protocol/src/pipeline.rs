//! # Submission Pipeline
//!
//! The end-to-end flow, one stage per function:
//!
//! ```text
//! generate identity ─▶ encode payload ─▶ resolve addresses ─▶ transaction header
//!        ─▶ signed transaction ─▶ batch header ─▶ signed batch ─▶ batch list ─▶ POST
//! ```
//!
//! Each stage takes the previous stage's output by value or by reference
//! and returns a new value; nothing is updated in place once built. The
//! first failure short-circuits the rest, so a construction error never
//! reaches the network and a batch list is either submitted whole or not
//! at all.

use thiserror::Error;

use crate::address::{check_address, AddressError, AddressScheme, NamespacedSha512};
use crate::batch::{build_batch_list, BatchBuilder, BatchError};
use crate::config::{DEFAULT_ADDRESS, DEFAULT_FAMILY_NAME, DEFAULT_FAMILY_VERSION};
use crate::crypto::keys::{KeyError, Secp256k1Signer};
use crate::messages::{Batch, Transaction};
use crate::payload::{EncodingError, Payload};
use crate::submit::{SubmitError, SubmitResponse, Submitter};
use crate::transaction::{build_transaction, TransactionError, TransactionHeaderBuilder};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A failed run, classified by the stage that failed.
///
/// Everything but [`Submission`](Self::Submission) is a construction
/// failure: the run aborts and nothing is sent.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("key generation failed: {0}")]
    KeyGeneration(#[source] KeyError),

    #[error("payload encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("address derivation failed: {0}")]
    Address(#[from] AddressError),

    #[error("signing failed: {0}")]
    Signing(#[source] KeyError),

    #[error("transaction assembly failed: {0}")]
    Transaction(#[source] TransactionError),

    #[error("batch assembly failed: {0}")]
    Batch(#[source] BatchError),

    #[error("submission failed: {0}")]
    Submission(#[from] SubmitError),
}

impl From<TransactionError> for PipelineError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Signing(e) => Self::Signing(e),
            other => Self::Transaction(other),
        }
    }
}

impl From<BatchError> for PipelineError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Signing(e) => Self::Signing(e),
            other => Self::Batch(other),
        }
    }
}

impl PipelineError {
    /// `true` if the batch list was built and only delivery failed; the
    /// same bytes can be submitted again.
    pub fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Where a transaction's state addresses come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSource {
    /// Precomputed addresses or namespace prefixes, used as given.
    Fixed {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
    /// One address computed by an [`AddressScheme`], used as both the sole
    /// input and the sole output.
    Derived { namespace: String, key: String },
}

impl AddressSource {
    /// Resolves to `(inputs, outputs)`. Every address, given or computed,
    /// must be non-empty lowercase hex.
    pub fn resolve<S>(&self, scheme: &S) -> Result<(Vec<String>, Vec<String>), AddressError>
    where
        S: AddressScheme + ?Sized,
    {
        match self {
            Self::Fixed { inputs, outputs } => {
                let check_all = |list: &[String]| -> Result<Vec<String>, AddressError> {
                    list.iter().cloned().map(check_address).collect()
                };
                Ok((check_all(inputs.as_slice())?, check_all(outputs.as_slice())?))
            }
            Self::Derived { namespace, key } => {
                let address = check_address(scheme.compute_address(namespace, key)?)?;
                Ok((vec![address.clone()], vec![address]))
            }
        }
    }
}

/// Everything needed to build one transaction, except the key.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    pub family_name: String,
    pub family_version: String,
    pub addresses: AddressSource,
    pub dependencies: Vec<String>,
    pub payload: Payload,
    pub nonce: Option<String>,
}

impl BuildPlan {
    /// The reference transaction: `intkey` 1.0, the example payload, and the
    /// fixed `intkey`/`foo` address as input and output.
    pub fn example() -> Self {
        Self {
            family_name: DEFAULT_FAMILY_NAME.to_string(),
            family_version: DEFAULT_FAMILY_VERSION.to_string(),
            addresses: AddressSource::Fixed {
                inputs: vec![DEFAULT_ADDRESS.to_string()],
                outputs: vec![DEFAULT_ADDRESS.to_string()],
            },
            dependencies: Vec::new(),
            payload: Payload::example(),
            nonce: None,
        }
    }
}

/// A signed, serialized batch list and the pieces it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatchList {
    pub signer_public_key: String,
    pub transaction: Transaction,
    pub batch: Batch,
    /// The request body.
    pub bytes: Vec<u8>,
}

impl PreparedBatchList {
    pub fn transaction_id(&self) -> &str {
        self.transaction.id()
    }

    pub fn batch_id(&self) -> &str {
        self.batch.id()
    }
}

/// A delivered batch list and the node's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub prepared: PreparedBatchList,
    pub response: SubmitResponse,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Encodes the payload, builds and signs the transaction.
pub fn build_signed_transaction<S>(
    plan: &BuildPlan,
    signer: &Secp256k1Signer,
    scheme: &S,
) -> Result<Transaction, PipelineError>
where
    S: AddressScheme + ?Sized,
{
    let payload_bytes = plan.payload.encode()?;
    let (inputs, outputs) = plan.addresses.resolve(scheme)?;

    let mut builder = TransactionHeaderBuilder::new(&plan.family_name, &plan.family_version)
        .inputs(inputs)
        .outputs(outputs)
        .dependencies(plan.dependencies.iter().cloned());
    if let Some(nonce) = &plan.nonce {
        builder = builder.nonce(nonce);
    }
    let header_bytes = builder.build_header(&payload_bytes, signer)?;

    Ok(build_transaction(header_bytes, signer, payload_bytes)?)
}

/// Builds the batch list for `plan`, deriving addresses with the `intkey`
/// convention when the plan asks for derivation.
pub fn prepare(
    plan: &BuildPlan,
    signer: &Secp256k1Signer,
) -> Result<PreparedBatchList, PipelineError> {
    prepare_with_scheme(plan, signer, &NamespacedSha512)
}

/// Like [`prepare`], with a caller-supplied address scheme.
pub fn prepare_with_scheme<S>(
    plan: &BuildPlan,
    signer: &Secp256k1Signer,
    scheme: &S,
) -> Result<PreparedBatchList, PipelineError>
where
    S: AddressScheme + ?Sized,
{
    let transaction = build_signed_transaction(plan, signer, scheme)?;
    let batch = BatchBuilder::new(signer)
        .transaction(transaction.clone())
        .build()?;
    let bytes = build_batch_list(vec![batch.clone()])?;

    tracing::info!(
        transaction_id = %transaction.header_signature,
        batch_id = %batch.header_signature,
        bytes = bytes.len(),
        "batch list prepared"
    );

    Ok(PreparedBatchList {
        signer_public_key: signer.public_key_hex(),
        transaction,
        batch,
        bytes,
    })
}

/// Generates a fresh signing identity, builds, and submits.
pub async fn run(plan: &BuildPlan, submitter: &Submitter) -> Result<Submitted, PipelineError> {
    let signer = Secp256k1Signer::generate().map_err(PipelineError::KeyGeneration)?;
    tracing::debug!(public_key = %signer.public_key_hex(), "signing identity generated");
    run_with_signer(plan, &signer, submitter).await
}

/// Builds with the given identity and submits.
pub async fn run_with_signer(
    plan: &BuildPlan,
    signer: &Secp256k1Signer,
    submitter: &Submitter,
) -> Result<Submitted, PipelineError> {
    let prepared = prepare(plan, signer)?;
    let response = submitter.submit_batch_list(prepared.bytes.clone()).await?;
    Ok(Submitted { prepared, response })
}
