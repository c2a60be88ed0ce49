use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

/// Linear backoff: attempt `n` failing waits `base_delay * n` before the next try.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// HTTP GET with bounded retry and browser-like default headers.
///
/// The fetcher knows nothing about sources or aggregation: once the retry
/// budget is spent it returns the error to whichever source called it.
#[derive(Clone)]
pub struct Fetcher {
    http: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Fetcher { http, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url`, retrying non-2xx responses and transport errors.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.try_once(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt >= attempts => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "Fetch attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.get(url).await?;
        resp.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn try_once(&self, url: &str) -> Result<Response, FetchError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        Ok(resp)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{extract::State, http::HeaderMap as AxumHeaders, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fetcher(base_ms: u64) -> Fetcher {
        Fetcher::new(
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(base_ms),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn counting_router(hits: Arc<AtomicUsize>, succeed_from: usize) -> Router {
        Router::new()
            .route(
                "/",
                get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                    if n >= succeed_from {
                        (StatusCode::OK, "ok")
                    } else {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy")
                    }
                }),
            )
            .with_state(hits)
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_always_failing_target_is_tried_three_times() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(counting_router(hits.clone(), usize::MAX)).await;

        let started = Instant::now();
        let err = fetcher(25)
            .get(&format!("http://{}/", addr))
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        // 25ms after the first failure, 50ms after the second
        assert!(started.elapsed() >= Duration::from_millis(75));
        match err {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    *last,
                    FetchError::Status { status: StatusCode::SERVICE_UNAVAILABLE, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(counting_router(hits.clone(), 2)).await;

        let body = fetcher(5)
            .get_text(&format!("http://{}/", addr))
            .await
            .unwrap();
        assert_eq!(body, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_network_error_is_retried() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher(1)
            .get(&format!("http://{}/", addr))
            .await
            .unwrap_err();
        match err {
            FetchError::Exhausted { last, .. } => {
                assert!(matches!(*last, FetchError::Request { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_browser_headers_are_sent() {
        let app = Router::new().route(
            "/",
            get(|headers: AxumHeaders| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let addr = spawn_server(app).await;

        let ua = fetcher(1)
            .get_text(&format!("http://{}/", addr))
            .await
            .unwrap();
        assert_eq!(ua, BROWSER_USER_AGENT);
    }
}
