//! # Submitter
//!
//! Delivers a serialized batch list to a ledger node's REST endpoint:
//!
//! ```text
//! POST <endpoint>/batches
//! Content-Type: application/octet-stream
//!
//! <BatchList bytes>
//! ```
//!
//! Any 2xx status is success; the response body is kept as raw text and not
//! interpreted. Every request carries an explicit timeout.
//!
//! Submission is a POST, so a failed attempt may or may not have reached the
//! node. A connection failure (nothing was sent) is always retried within
//! the policy's attempt budget. Timeouts, `429`, and `5xx` are retried only
//! when [`RetryPolicy::retry_non_idempotent`] is set. Resubmitting the same
//! bytes is harmless for a ledger that deduplicates by batch ID, which is
//! why the client configuration turns it on by default.

pub mod retry;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::{BATCHES_PATH, CONTENT_TYPE_OCTET_STREAM, DEFAULT_REQUEST_TIMEOUT};

pub use retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node rejected the batch list with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl SubmitError {
    /// The HTTP status, if the node answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A 2xx answer from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    /// Raw response body, uninterpreted.
    pub body: String,
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

/// HTTP client bound to one ledger node.
#[derive(Debug, Clone)]
pub struct Submitter {
    client: reqwest::Client,
    batches_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
}

enum Outcome {
    Done(Result<SubmitResponse, SubmitError>),
    Retry(SubmitError),
}

impl Submitter {
    /// Targets `endpoint` with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, SubmitError> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Targets `endpoint`; each attempt is abandoned after `timeout`.
    ///
    /// `endpoint` is a base URL. `/batches` is appended to its path, so both
    /// `http://node:8008` and `http://gw/ledger/` work.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, SubmitError> {
        let batches_url = batches_url(endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SubmitError::Client)?;

        Ok(Self {
            client,
            batches_url,
            timeout,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batches_url(&self) -> &Url {
        &self.batches_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// POSTs `batch_list` and waits for the node's answer.
    ///
    /// Returns the final error once the attempt budget is spent.
    pub async fn submit_batch_list(
        &self,
        batch_list: Vec<u8>,
    ) -> Result<SubmitResponse, SubmitError> {
        let attempts = self.retry.attempts();
        tracing::info!(
            url = %self.batches_url,
            bytes = batch_list.len(),
            "submitting batch list"
        );

        let mut retry: u32 = 0;
        loop {
            let attempt = retry as usize + 1;
            let err = match self.attempt(batch_list.clone()).await {
                Outcome::Done(result) => {
                    if let Ok(response) = &result {
                        tracing::info!(status = response.status, attempt, "batch list accepted");
                    }
                    return result;
                }
                Outcome::Retry(err) => err,
            };
            if attempt >= attempts {
                tracing::warn!(attempt, error = %err, "giving up on submission");
                return Err(err);
            }

            let delay = {
                let mut rng = rand::thread_rng();
                retry::jittered_backoff(&mut rng, self.retry.backoff_for(retry))
            };
            tracing::warn!(
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "submission failed, retrying"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    async fn attempt(&self, body: Vec<u8>) -> Outcome {
        let sent = self
            .client
            .post(self.batches_url.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_OCTET_STREAM)
            .body(body)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_connect() => return Outcome::Retry(e.into()),
            Err(e) if e.is_timeout() && self.retry.retry_non_idempotent => {
                return Outcome::Retry(e.into())
            }
            Err(e) => return Outcome::Done(Err(e.into())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::Done(Err(e.into())),
        };

        if status.is_success() {
            return Outcome::Done(Ok(SubmitResponse {
                status: status.as_u16(),
                body,
            }));
        }

        let err = SubmitError::Rejected {
            status: status.as_u16(),
            body,
        };
        if self.retry.retry_non_idempotent && is_retryable_status(status) {
            Outcome::Retry(err)
        } else {
            Outcome::Done(Err(err))
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Resolves `<endpoint>/batches`, accepting only http and https.
pub fn batches_url(endpoint: &str) -> Result<Url, SubmitError> {
    let mut base = Url::parse(endpoint)?;
    match base.scheme() {
        "http" | "https" => {}
        other => return Err(SubmitError::InvalidScheme(other.to_string())),
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(BATCHES_PATH)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State as AxumState;
    use axum::http::StatusCode as AxumStatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_batches_url_normalization() {
        assert_eq!(
            batches_url("http://localhost:8008").unwrap().as_str(),
            "http://localhost:8008/batches"
        );
        assert_eq!(
            batches_url("http://localhost:8008/").unwrap().as_str(),
            "http://localhost:8008/batches"
        );
        assert_eq!(
            batches_url("https://gw.example/ledger").unwrap().as_str(),
            "https://gw.example/ledger/batches"
        );
    }

    #[test]
    fn test_invalid_scheme() {
        let err = Submitter::new("ftp://example.com").unwrap_err();
        assert!(matches!(err, SubmitError::InvalidScheme(_)));
        assert_eq!(
            err.to_string(),
            "invalid URL scheme: ftp (expected http or https)"
        );
        assert!(matches!(
            Submitter::new("not a url"),
            Err(SubmitError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::ACCEPTED));
    }

    async fn serve_router(router: Router) -> (String, tokio::task::JoinHandle<()>) {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let actual_addr = listener.local_addr().unwrap();
        let base_url = format!("http://{actual_addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        (base_url, handle)
    }

    fn flaky_router(counter: Arc<AtomicUsize>, failures: usize) -> Router {
        Router::new()
            .route(
                "/batches",
                post(
                    move |AxumState(counter): AxumState<Arc<AtomicUsize>>,
                          _body: axum::body::Bytes| async move {
                        let attempt = counter.fetch_add(1, Ordering::SeqCst);
                        if attempt < failures {
                            (AxumStatusCode::SERVICE_UNAVAILABLE, "busy")
                        } else {
                            (AxumStatusCode::ACCEPTED, "queued")
                        }
                    },
                ),
            )
            .with_state(counter)
    }

    fn fast_policy(retry_non_idempotent: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            retry_non_idempotent,
        }
    }

    #[tokio::test]
    async fn test_post_not_retried_by_default() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (base_url, handle) = serve_router(flaky_router(counter.clone(), 2)).await;

        let submitter = Submitter::new(&base_url)
            .unwrap()
            .with_retry_policy(fast_policy(false));
        let err = submitter.submit_batch_list(vec![0x0a]).await.unwrap_err();

        let SubmitError::Rejected { status, body } = err else {
            panic!("expected Rejected, got {err:?}");
        };
        assert_eq!(status, 503);
        assert_eq!(body, "busy");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_post_retried_when_enabled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (base_url, handle) = serve_router(flaky_router(counter.clone(), 2)).await;

        let submitter = Submitter::new(&base_url)
            .unwrap()
            .with_retry_policy(fast_policy(true));
        let response = submitter.submit_batch_list(vec![0x0a]).await.unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(response.body, "queued");
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (base_url, handle) = serve_router(flaky_router(counter.clone(), usize::MAX)).await;

        let submitter = Submitter::new(&base_url)
            .unwrap()
            .with_retry_policy(fast_policy(true));
        let err = submitter.submit_batch_list(vec![0x0a]).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let counter = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/batches",
                post(
                    |AxumState(counter): AxumState<Arc<AtomicUsize>>| async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        (AxumStatusCode::BAD_REQUEST, "malformed batch list")
                    },
                ),
            )
            .with_state(counter.clone());
        let (base_url, handle) = serve_router(router).await;

        let submitter = Submitter::new(&base_url)
            .unwrap()
            .with_retry_policy(fast_policy(true));
        let err = submitter.submit_batch_list(vec![0xff]).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = Submitter::new(&format!("http://{addr}"))
            .unwrap()
            .with_retry_policy(fast_policy(false));
        let err = submitter.submit_batch_list(vec![0x0a]).await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let router = Router::new().route(
            "/batches",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                AxumStatusCode::OK
            }),
        );
        let (base_url, handle) = serve_router(router).await;

        let submitter = Submitter::with_timeout(&base_url, Duration::from_millis(100))
            .unwrap()
            .with_retry_policy(RetryPolicy::none());
        let err = submitter.submit_batch_list(vec![0x0a]).await.unwrap_err();
        let SubmitError::Transport(inner) = err else {
            panic!("expected Transport, got {err:?}");
        };
        assert!(inner.is_timeout());

        handle.abort();
    }
}
