use std::{fmt, sync::Arc, thread, time::Duration};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use super::error::{RiotApiError, RiotApiResponse};
use super::rate_limiter::RateLimiter;
use super::region::Region;

/// Placeholder replaced by the routing cluster in a base URL override.
pub const CLUSTER_PLACEHOLDER: &str = "{cluster}";

/// Retry behaviour on HTTP 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Sleep before the retry following the given zero-based attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * (attempt + 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Replaces `https://<cluster>.api.riotgames.com`. May contain [`CLUSTER_PLACEHOLDER`].
    pub base_url: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            base_url: None,
        }
    }
}

#[derive(Clone)]
pub struct RiotClient {
    http: reqwest::blocking::Client,
    limiter: Arc<RateLimiter>,
    /// Riot API Key
    key: String,
    options: ClientOptions,
}

impl fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiotClient")
            .field("limiter", &self.limiter)
            .field("options", &self.options)
            .finish()
    }
}

impl RiotClient {
    pub fn new(
        key: String,
        limiter: Arc<RateLimiter>,
        options: ClientOptions,
    ) -> RiotApiResponse<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            http,
            limiter,
            key,
            options,
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Base URL of the cluster serving the given platform code.
    pub(crate) fn cluster_url(&self, region_code: &str) -> String {
        let region = Region::for_platform_code(region_code);

        match &self.options.base_url {
            Some(base) => base.replace(CLUSTER_PLACEHOLDER, region.as_str()),
            None => region.base_url(),
        }
    }

    /// Rate limited GET with retry on 429.
    pub(crate) fn request<T: DeserializeOwned>(&self, url: &str) -> RiotApiResponse<T> {
        let retry = self.options.retry;
        let mut attempt = 0;

        loop {
            self.limiter.acquire();
            trace!(url, attempt, "🛰️ GET");

            let res = self
                .http
                .get(url)
                .header("X-Riot-Token", &self.key)
                .send()
                .map_err(|e| self.classify(e))?;

            match res.status() {
                StatusCode::OK => {
                    let body = res.bytes().map_err(|e| self.classify(e))?;
                    return serde_json::from_slice(&body).map_err(RiotApiError::Serde);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    attempt += 1;
                    if attempt >= retry.max_attempts {
                        return Err(RiotApiError::RateLimited { attempts: attempt });
                    }

                    let backoff = retry.backoff(attempt - 1);
                    warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "🛰️ ⚠️ Rate limited by Riot despite local throttling, backing off"
                    );
                    thread::sleep(backoff);
                }
                status => return Err(RiotApiError::Status(status)),
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> RiotApiError {
        if err.is_timeout() {
            RiotApiError::Timeout(self.options.request_timeout)
        } else {
            RiotApiError::Reqwest(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::time::Instant;

    use httpmock::prelude::*;
    use serde_json::{Value, json};

    use super::*;

    fn client_for(server: &MockServer, retry: RetryPolicy, timeout: Duration) -> RiotClient {
        let limiter = Arc::new(RateLimiter::new(
            NonZeroU32::new(100).unwrap(),
            Duration::from_secs(1),
        ));
        RiotClient::new(
            "RGAPI-TEST".to_string(),
            limiter,
            ClientOptions {
                request_timeout: timeout,
                retry,
                base_url: Some(server.base_url()),
            },
        )
        .unwrap()
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(10),
        }
    }

    #[test]
    fn ok_response_is_decoded_and_key_header_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/ping")
                .header("X-Riot-Token", "RGAPI-TEST");
            then.status(200).json_body(json!(["a", "b"]));
        });
        let client = client_for(&server, fast_retry(), Duration::from_secs(5));

        let ids: Vec<String> = client.request(&server.url("/ping")).unwrap();

        mock.assert();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn too_many_requests_is_retried_up_to_three_attempts() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/limited");
            then.status(429);
        });
        let client = client_for(&server, fast_retry(), Duration::from_secs(5));

        let res: RiotApiResponse<Value> = client.request(&server.url("/limited"));

        assert!(matches!(res, Err(RiotApiError::RateLimited { attempts: 3 })));
        assert_eq!(mock.hits(), 3);
    }

    #[test]
    fn other_statuses_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });
        let client = client_for(&server, fast_retry(), Duration::from_secs(5));

        let res: RiotApiResponse<Value> = client.request(&server.url("/missing"));

        assert!(matches!(res, Err(RiotApiError::Status(StatusCode::NOT_FOUND))));
        assert_eq!(mock.hits(), 1);
    }

    #[test]
    fn malformed_body_is_a_decoding_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/garbage");
            then.status(200).body("{not json");
        });
        let client = client_for(&server, fast_retry(), Duration::from_secs(5));

        let res: RiotApiResponse<Value> = client.request(&server.url("/garbage"));

        assert!(matches!(res, Err(RiotApiError::Serde(_))));
        assert_eq!(mock.hits(), 1);
    }

    #[test]
    fn slow_endpoint_times_out_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .json_body(json!([]))
                .delay(Duration::from_millis(800));
        });
        let client = client_for(&server, fast_retry(), Duration::from_millis(100));
        let start = Instant::now();

        let res: RiotApiResponse<Value> = client.request(&server.url("/slow"));

        assert!(matches!(res, Err(RiotApiError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_millis(800));
        assert_eq!(mock.hits(), 1);
    }

    #[test]
    fn request_propagates_reqwest_error() {
        let server = MockServer::start();
        let client = client_for(&server, fast_retry(), Duration::from_secs(5));

        let res: RiotApiResponse<()> = client.request("ht!tp://invalid-url");

        assert!(matches!(res, Err(RiotApiError::Reqwest(_))));
    }

    #[test]
    fn backoff_grows_linearly_with_attempts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(0), Duration::from_secs(2));
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
    }
}
