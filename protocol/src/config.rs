//! # Protocol Configuration & Constants
//!
//! Every magic number the client needs lives here, together with the
//! [`ClientConfig`] file format that lets an operator swap the hardcoded
//! example values (endpoint, family, addresses, payload) for real ones.
//!
//! The defaults reproduce the reference flow exactly: an `intkey` 1.0
//! transaction setting `foo` to 42, sent to a node on `localhost:8008`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payload::{EncodingError, Payload};
use crate::pipeline::{AddressSource, BuildPlan};
use crate::submit::RetryPolicy;

// ---------------------------------------------------------------------------
// Transaction Family
// ---------------------------------------------------------------------------

/// Family the reference transaction targets. The receiving node must have a
/// handler registered for this name, or the batch is rejected downstream.
pub const DEFAULT_FAMILY_NAME: &str = "intkey";

/// Version of the family handler.
pub const DEFAULT_FAMILY_VERSION: &str = "1.0";

/// The precomputed state address of key `foo` in the `intkey` namespace.
pub const DEFAULT_ADDRESS: &str =
    "1cf1266e282c41be5e4254d8820772c5518a2c5a8c0c7f7eda19594a7eb539453e1ed7";

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Base URL of the ledger node's REST API.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8008";

/// Path (relative to the endpoint) that accepts serialized batch lists.
pub const BATCHES_PATH: &str = "batches";

/// Content type of a serialized batch list.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Upper bound on a single POST, connect included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts per submission when retries are enabled (first try included).
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// First retry delay. Doubles on every subsequent retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Ceiling for the retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 secret scalar length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Compressed SEC1 public key length in bytes (`0x02`/`0x03` prefix + x).
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Compact `r || s` ECDSA signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Signatures travel hex-encoded; they double as transaction and batch IDs.
pub const SIGNATURE_HEX_LENGTH: usize = SIGNATURE_LENGTH * 2;

/// Public keys travel hex-encoded in headers.
pub const PUBLIC_KEY_HEX_LENGTH: usize = PUBLIC_KEY_LENGTH * 2;

/// SHA-512 digest length in hex characters.
pub const SHA512_HEX_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Hex characters of the namespace prefix at the start of every address.
pub const NAMESPACE_PREFIX_HEX_LENGTH: usize = 6;

/// Full address length in hex characters (3-byte prefix + 32-byte suffix).
pub const ADDRESS_HEX_LENGTH: usize = 70;

// ---------------------------------------------------------------------------
// Client Configuration File
// ---------------------------------------------------------------------------

/// Errors raised while loading a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// How the transaction's input/output addresses are obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AddressConfig {
    /// Literal addresses, used as-is.
    Fixed {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
    /// One address derived from `namespace` and `key`, used for both the
    /// input and the output list.
    Derived { namespace: String, key: String },
}

impl Default for AddressConfig {
    fn default() -> Self {
        AddressConfig::Fixed {
            inputs: vec![DEFAULT_ADDRESS.to_string()],
            outputs: vec![DEFAULT_ADDRESS.to_string()],
        }
    }
}

/// Retry settings for the submission step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Resubmitting the same batch list is safe: the batch keeps its ID, so
    /// the node either commits it once or reports it as a duplicate.
    pub retry_on_post: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF.as_millis() as u64,
            max_backoff_ms: DEFAULT_MAX_BACKOFF.as_millis() as u64,
            retry_on_post: true,
        }
    }
}

/// Client configuration, loaded from a JSON file.
///
/// Every field is optional; missing fields fall back to the reference flow.
///
/// ```json
/// {
///   "endpoint": "http://localhost:8008",
///   "family_name": "intkey",
///   "family_version": "1.0",
///   "address": { "mode": "derived", "namespace": "intkey", "key": "foo" },
///   "payload": { "Verb": "set", "Name": "foo", "Value": 42 },
///   "retry": { "max_attempts": 5 }
/// }
/// ```
///
/// The payload object keeps the key order of the file, which is also the
/// order the keys are CBOR-encoded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub endpoint: String,
    pub family_name: String,
    pub family_version: String,
    pub address: AddressConfig,
    pub dependencies: Vec<String>,
    pub payload: serde_json::Value,
    pub nonce: Option<String>,
    pub timeout_ms: u64,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            family_name: DEFAULT_FAMILY_NAME.to_string(),
            family_version: DEFAULT_FAMILY_VERSION.to_string(),
            address: AddressConfig::default(),
            dependencies: Vec::new(),
            payload: serde_json::json!({
                "Verb": "set",
                "Name": "foo",
                "Value": 42,
                "Keki": "keki",
            }),
            nonce: None,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Reads and parses a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        if config.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    /// Converts the file representation into a [`BuildPlan`].
    ///
    /// Fails only if the payload object holds values the payload encoder
    /// cannot represent. Address checks happen during address resolution,
    /// family checks during header construction.
    pub fn to_build_plan(&self) -> Result<BuildPlan, EncodingError> {
        let payload = Payload::from_json(&self.payload)?;
        let addresses = match &self.address {
            AddressConfig::Fixed { inputs, outputs } => AddressSource::Fixed {
                inputs: inputs.clone(),
                outputs: outputs.clone(),
            },
            AddressConfig::Derived { namespace, key } => AddressSource::Derived {
                namespace: namespace.clone(),
                key: key.clone(),
            },
        };

        Ok(BuildPlan {
            family_name: self.family_name.clone(),
            family_version: self.family_version.clone(),
            addresses,
            dependencies: self.dependencies.clone(),
            payload,
            nonce: self.nonce.clone(),
        })
    }

    /// Request timeout for a single POST.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry policy for the submitter.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            retry_non_idempotent: self.retry.retry_on_post,
        }
    }
}
