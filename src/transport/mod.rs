//! Resilient HTTP transport
//!
//! One long-lived [`Transport`] is shared by the auth manager and the
//! purchase workflow. It owns the cookie jar, paces every request with a
//! politeness delay, and retries idempotent GETs on transient failures.
//! POST is never retried here; the purchase workflow decides when a POST
//! may be repeated.

use crate::{Result, config::NetworkSettings};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Browser user agent presented on every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.77 Safari/537.36";

/// HTTP statuses worth retrying on idempotent requests
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Initial retry backoff; doubles on each subsequent retry
const RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Browser-like request headers the site expects
///
/// The site serves different content to clients that do not look like a
/// browser, so every request carries this baseline set. `Content-Type` is
/// left to reqwest's form/json encoders.
pub fn browser_headers(origin: &str, referer: &str) -> HeaderMap {
    use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, REFERER};

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("ko,en-US;q=0.9,en;q=0.8,ko-KR;q=0.7"),
    );
    headers.insert(
        CACHE_CONTROL,
        reqwest::header::HeaderValue::from_static("max-age=0"),
    );
    headers.insert(
        "Upgrade-Insecure-Requests",
        reqwest::header::HeaderValue::from_static("1"),
    );
    if let Ok(value) = reqwest::header::HeaderValue::from_str(origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = reqwest::header::HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    headers
}

/// Client plus the cookie jar it was built with
///
/// reqwest's [`Jar`] cannot be emptied in place, so switching accounts
/// replaces the whole pair.
#[derive(Debug)]
struct ClientState {
    client: Client,
    jar: Arc<Jar>,
}

/// Shared HTTP transport with pacing, timeouts, and GET retry
#[derive(Debug)]
pub struct Transport {
    /// Live client/jar pair, replaced by [`Transport::reset_session`]
    state: RwLock<ClientState>,
    /// Transport configuration
    network: NetworkSettings,
}

impl Transport {
    /// Create a transport from network settings
    pub fn new(network: NetworkSettings) -> Result<Self> {
        let state = Self::build_state(&network)?;
        Ok(Self {
            state: RwLock::new(state),
            network,
        })
    }

    fn build_state(network: &NetworkSettings) -> Result<ClientState> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
            .timeout(Duration::from_secs(network.read_timeout_secs))
            .cookie_provider(Arc::clone(&jar))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| crate::Error::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ClientState { client, jar })
    }

    /// Replace the client and cookie jar with fresh ones
    ///
    /// Must be called before logging in a different account on the same
    /// transport; otherwise cookies bleed across accounts.
    pub async fn reset_session(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = Self::build_state(&self.network)?;
        tracing::debug!("Transport session reset, cookie jar replaced");
        Ok(())
    }

    /// Read the live cookie jar entries that apply to `url`
    ///
    /// Returns `(name, value)` pairs in jar order. The auth manager prefers
    /// this over the raw login response because redirects may set cookies on
    /// a later hop the direct response never sees.
    pub async fn cookies_for(&self, url: &str) -> Vec<(String, String)> {
        let Ok(parsed) = url::Url::parse(url) else {
            return Vec::new();
        };
        let state = self.state.read().await;
        let Some(header) = state.jar.cookies(&parsed) else {
            return Vec::new();
        };
        let Ok(joined) = header.to_str() else {
            return Vec::new();
        };
        joined
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Issue a GET with automatic retry on transient failures
    ///
    /// Retries connection failures, read timeouts, and HTTP
    /// {429, 500, 502, 503, 504} up to `max_retries` times with exponential
    /// backoff. Any other failure surfaces immediately as
    /// [`crate::Error::Request`].
    pub async fn get(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        params: Option<&[(&str, &str)]>,
    ) -> Result<Response> {
        let mut attempt: u32 = 0;
        let mut backoff = Duration::from_millis(RETRY_INITIAL_DELAY_MS);

        loop {
            attempt += 1;
            self.pace().await;

            let client = self.client().await;
            let mut request = client.get(url);
            if let Some(headers) = &headers {
                request = request.headers(headers.clone());
            }
            if let Some(params) = params {
                request = request.query(params);
            }

            tracing::info!("[http] GET url={} attempt={}", url, attempt);
            match request.send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => {
                        tracing::info!(
                            "[http] GET success url={} status={}",
                            url,
                            response.status()
                        );
                        return Ok(response);
                    }
                    Err(e) => {
                        let status = e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                        if RETRYABLE_STATUS.contains(&status.as_u16())
                            && attempt <= self.network.max_retries
                        {
                            tracing::warn!(
                                "[http] GET retryable status url={} status={} attempt={}",
                                url,
                                status,
                                attempt
                            );
                            tokio::time::sleep(backoff).await;
                            backoff *= 2;
                            continue;
                        }
                        tracing::error!("[http] GET failed url={} error={}", url, e);
                        return Err(crate::Error::request(url, e));
                    }
                },
                Err(e) => {
                    if (e.is_connect() || e.is_timeout()) && attempt <= self.network.max_retries {
                        tracing::warn!(
                            "[http] GET transient error url={} attempt={} error={}",
                            url,
                            attempt,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    tracing::error!("[http] GET failed url={} error={}", url, e);
                    return Err(crate::Error::request(url, e));
                }
            }
        }
    }

    /// Issue a form-encoded POST
    ///
    /// Never auto-retried: whether a POST can be repeated is a workflow
    /// decision, made where idempotency can be reasoned about.
    pub async fn post(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        form: Option<&[(String, String)]>,
    ) -> Result<Response> {
        self.pace().await;

        let client = self.client().await;
        let mut request = client.post(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        tracing::info!("[http] POST url={}", url);
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!("[http] POST failed url={} error={}", url, e);
                crate::Error::request(url, e)
            })?;

        tracing::info!(
            "[http] POST success url={} status={}",
            url,
            response.status()
        );
        Ok(response)
    }

    async fn client(&self) -> Client {
        self.state.read().await.client.clone()
    }

    async fn pace(&self) {
        if self.network.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.network.request_delay_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_network() -> NetworkSettings {
        let mut network = Settings::default().network;
        network.request_delay_ms = 0;
        network
    }

    #[test]
    fn test_browser_headers_carry_origin_and_referer() {
        let headers = browser_headers(
            "https://www.dhlottery.co.kr",
            "https://www.dhlottery.co.kr/login",
        );
        assert_eq!(
            headers.get(reqwest::header::ORIGIN).unwrap(),
            "https://www.dhlottery.co.kr"
        );
        assert_eq!(
            headers.get(reqwest::header::REFERER).unwrap(),
            "https://www.dhlottery.co.kr/login"
        );
        assert!(headers.get(reqwest::header::ACCEPT).is_some());
    }

    #[tokio::test]
    async fn test_transport_creation() {
        let transport = Transport::new(test_network()).unwrap();
        assert!(
            transport
                .cookies_for("https://www.dhlottery.co.kr/")
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_cookies_for_invalid_url_is_empty() {
        let transport = Transport::new(test_network()).unwrap();
        assert!(transport.cookies_for("not a url").await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_session_replaces_jar() {
        let transport = Transport::new(test_network()).unwrap();
        {
            let state = transport.state.read().await;
            state.jar.add_cookie_str(
                "JSESSIONID=abc123; Path=/",
                &url::Url::parse("https://www.dhlottery.co.kr/").unwrap(),
            );
        }
        assert_eq!(
            transport.cookies_for("https://www.dhlottery.co.kr/").await,
            vec![("JSESSIONID".to_string(), "abc123".to_string())]
        );

        transport.reset_session().await.unwrap();
        assert!(
            transport
                .cookies_for("https://www.dhlottery.co.kr/")
                .await
                .is_empty()
        );
    }
}
