//! Lotto 6/45 purchase and verification workflow
//!
//! This module drives the two site interactions that matter:
//! - [`purchase`]: gather the dynamic form requirements, submit a purchase,
//!   and classify the response with bounded retry and one re-login
//! - [`winnings`]: read the recent purchase ledger and per-ticket details
//!   into a normalized winning record
//!
//! Both sit on top of the shared [`Transport`] and take an
//! [`AuthManager`](crate::auth::AuthManager) for the session cookie.

mod purchase;
mod winnings;

pub use purchase::PurchaseRequirements;

use crate::auth::AuthManager;
use crate::config::Settings;
use crate::transport::{Transport, browser_headers};
use reqwest::header::HeaderMap;
use std::sync::Arc;

/// The Lotto 6/45 workflow over one transport and configuration
#[derive(Debug)]
pub struct Lotto645 {
    /// Shared HTTP transport
    transport: Arc<Transport>,
    /// Configuration settings
    settings: Arc<Settings>,
}

impl Lotto645 {
    /// Create the workflow on top of an existing transport
    pub fn new(transport: Arc<Transport>, settings: Arc<Settings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Absolute URL on the main host
    fn main_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.endpoints.main_url, path)
    }

    /// Absolute URL on the game host
    fn game_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.endpoints.game_url, path)
    }

    /// Browser headers for the game host, with the session cookie attached
    fn game_headers(&self, auth: &AuthManager) -> HeaderMap {
        let headers = browser_headers(
            &self.settings.endpoints.game_url,
            &self.game_url("/olotto/game/game645.do"),
        );
        auth.add_auth_cred_to_headers(&headers)
    }

    /// Browser headers for the main host, with the session cookie attached
    fn main_headers(&self, auth: &AuthManager) -> HeaderMap {
        let headers = browser_headers(
            &self.settings.endpoints.main_url,
            &format!("{}/", self.settings.endpoints.main_url),
        );
        auth.add_auth_cred_to_headers(&headers)
    }
}

/// Read a response body that must be JSON
///
/// HTML-shaped bodies (content type or a body starting with `<`) never
/// reach the JSON parser; they surface as
/// [`MalformedResponse`](crate::Error::MalformedResponse) carrying status,
/// content type, and a body excerpt.
pub(crate) async fn read_json_body(response: reqwest::Response) -> crate::Result<serde_json::Value> {
    let url = response.url().to_string();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response
        .text()
        .await
        .map_err(|e| crate::Error::request(url, e))?;

    if content_type.contains("text/html") || body.trim_start().starts_with('<') {
        return Err(crate::Error::malformed_response(
            status,
            content_type,
            crate::utils::body_excerpt(&body),
        ));
    }

    serde_json::from_str(&body).map_err(|_| {
        crate::Error::malformed_response(status, content_type, crate::utils::body_excerpt(&body))
    })
}
