//! Login state machine and session cookie capture

use crate::config::Settings;
use crate::transport::{Transport, browser_headers};
use crate::{Error, Result};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use std::sync::Arc;

use super::cookies::{self, CookieHeader, SESSION_COOKIE};
use super::crypto::RsaKeyMaterial;

/// Invalid-credential markers the login endpoint embeds in its body,
/// regardless of HTTP status
const LOGIN_FAILURE_MARKERS: [&str; 3] = [
    "아이디 또는 비밀번호를 확인해주세요",
    "로그인에 실패",
    "loginFail",
];

/// Login credentials, held only in memory
///
/// Kept by the manager after a successful login so the purchase workflow
/// can request a single re-login; never written anywhere.
#[derive(Clone)]
pub struct Credentials {
    /// Site user id
    pub user_id: String,
    /// Site password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No login attempted, or session cleared
    Unauthenticated,
    /// RSA key material fetched for the current attempt
    KeyFetched,
    /// Encrypted credentials submitted, awaiting classification
    Authenticating,
    /// Session cookie captured
    Authenticated,
    /// The last login attempt failed terminally
    Failed,
}

/// Relevant parts of the login response, captured before the body is consumed
struct LoginResponse {
    status: u16,
    set_cookie: Option<String>,
    body: String,
}

/// Authentication/session manager
///
/// Owns the login protocol against the site: fetches the per-attempt RSA
/// key, encrypts credentials, submits the login form, and gathers session
/// cookies from every observable source into one [`CookieHeader`].
#[derive(Debug)]
pub struct AuthManager {
    /// Shared HTTP transport
    transport: Arc<Transport>,
    /// Configuration settings
    settings: Arc<Settings>,
    /// Current state machine position
    state: AuthState,
    /// Credentials of the authenticated account, for the one re-login
    credentials: Option<Credentials>,
    /// Most recently discovered session id
    session_id: Option<String>,
    /// Aggregated cookie header built at login
    cookie_header: Option<CookieHeader>,
}

impl AuthManager {
    /// Create a manager on top of an existing transport
    pub fn new(transport: Arc<Transport>, settings: Arc<Settings>) -> Self {
        Self {
            transport,
            settings,
            state: AuthState::Unauthenticated,
            credentials: None,
            session_id: None,
            cookie_header: None,
        }
    }

    /// Current state machine position
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Whether a session cookie is currently held
    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// The aggregated cookie header from the last successful login
    pub fn cookie_header(&self) -> Option<&CookieHeader> {
        self.cookie_header.as_ref()
    }

    /// Log in with the given credentials
    ///
    /// Resets the transport's cookie jar first so a previous account's
    /// cookies cannot bleed into this session. On success the manager is
    /// `Authenticated` and holds the aggregated cookie header; on any
    /// failure it is `Failed` and holds no session state.
    pub async fn login(&mut self, credentials: Credentials) -> Result<()> {
        self.transport.reset_session().await?;
        self.state = AuthState::Unauthenticated;
        self.session_id = None;
        self.cookie_header = None;

        match self.run_login(&credentials).await {
            Ok(()) => {
                self.state = AuthState::Authenticated;
                self.credentials = Some(credentials);
                Ok(())
            }
            Err(e) => {
                self.state = AuthState::Failed;
                Err(e)
            }
        }
    }

    /// Repeat the login with the stored credentials
    ///
    /// Used by the purchase workflow when the site answers with an HTML
    /// error page that usually means the session silently expired.
    pub async fn relogin(&mut self) -> Result<()> {
        let credentials = self
            .credentials
            .clone()
            .ok_or_else(|| Error::internal("No credentials available for re-login"))?;
        tracing::info!("Re-authenticating user {}", credentials.user_id);
        self.login(credentials).await
    }

    /// Drop all session state without logging in again
    pub fn clear_session(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.session_id = None;
        self.cookie_header = None;
        self.credentials = None;
    }

    /// Return a copy of `headers` with the Cookie header set
    ///
    /// Pure with respect to the input: the caller's map is never mutated.
    /// Uses the aggregated header when one was built, a minimal
    /// session-id-only header otherwise, and leaves the copy untouched when
    /// no session was ever captured.
    pub fn add_auth_cred_to_headers(&self, headers: &HeaderMap) -> HeaderMap {
        let mut copied = headers.clone();
        let value = match (&self.cookie_header, &self.session_id) {
            (Some(header), _) if !header.is_empty() => header.header_value(),
            (_, Some(session_id)) => format!("{}={}", SESSION_COOKIE, session_id),
            _ => return copied,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            copied.insert(COOKIE, value);
        }
        copied
    }

    async fn run_login(&mut self, credentials: &Credentials) -> Result<()> {
        self.warm_login_page().await;

        let key = self.fetch_rsa_key().await?;
        self.state = AuthState::KeyFetched;

        let encrypted_user_id = key.encrypt(&credentials.user_id)?;
        let encrypted_password = key.encrypt(&credentials.password)?;

        self.state = AuthState::Authenticating;
        let response = self
            .submit_login(encrypted_user_id, encrypted_password)
            .await?;
        self.capture_session(response).await
    }

    /// Best-effort GET of the login page, only for realistic cookie seeding
    async fn warm_login_page(&self) {
        let url = format!("{}/login", self.settings.endpoints.main_url);
        if let Err(e) = self.transport.get(&url, Some(self.login_headers()), None).await {
            tracing::warn!("Login page warm-up failed, continuing: {}", e);
        }
    }

    async fn fetch_rsa_key(&self) -> Result<RsaKeyMaterial> {
        let url = format!("{}/login/selectRsaModulus.do", self.settings.endpoints.main_url);
        let response = self
            .transport
            .get(&url, Some(self.login_headers()), None)
            .await?;
        let body = response.text().await.map_err(|e| Error::request(url.as_str(), e))?;
        RsaKeyMaterial::from_payload(&body)
    }

    async fn submit_login(
        &self,
        encrypted_user_id: String,
        encrypted_password: String,
    ) -> Result<LoginResponse> {
        let url = format!(
            "{}/login/securityLoginCheck.do",
            self.settings.endpoints.main_url
        );
        let form = [
            ("userId".to_string(), encrypted_user_id),
            ("userPswdEncn".to_string(), encrypted_password),
        ];

        let response = self
            .transport
            .post(&url, Some(self.login_headers()), Some(&form))
            .await?;

        let status = response.status().as_u16();
        let set_cookie: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let set_cookie = if set_cookie.is_empty() {
            None
        } else {
            Some(set_cookie.join(", "))
        };
        let body = response.text().await.map_err(|e| Error::request(url.as_str(), e))?;

        if LOGIN_FAILURE_MARKERS
            .iter()
            .any(|marker| body.contains(marker))
        {
            return Err(Error::permission_denied(
                "invalid user id or password reported by login endpoint",
            ));
        }

        Ok(LoginResponse {
            status,
            set_cookie,
            body,
        })
    }

    /// Extract the session id and build the aggregated cookie header
    ///
    /// The live jar is preferred over the direct response because redirects
    /// may set the session cookie on a later hop the response object never
    /// sees; the raw Set-Cookie header (and finally a tolerant regex over
    /// it) is the fallback.
    async fn capture_session(&mut self, login: LoginResponse) -> Result<()> {
        let jar_pairs = self
            .transport
            .cookies_for(&self.settings.endpoints.main_url)
            .await;
        let response_pairs = login
            .set_cookie
            .as_deref()
            .map(cookies::parse_set_cookie)
            .unwrap_or_default();

        let session_id = jar_pairs
            .iter()
            .chain(response_pairs.iter())
            .find(|(name, value)| cookies::is_session_cookie(name) && !value.is_empty())
            .map(|(_, value)| value.clone())
            .or_else(|| login.set_cookie.as_deref().and_then(cookies::find_session_id));

        let Some(session_id) = session_id else {
            return Err(Error::SessionCookieMissing {
                status: login.status,
                set_cookie: login.set_cookie,
                body_excerpt: crate::utils::body_excerpt(&login.body),
            });
        };

        let mut header = CookieHeader::new();
        header.merge(jar_pairs);
        header.merge(
            self.transport
                .cookies_for(&self.settings.endpoints.game_url)
                .await,
        );
        header.merge(response_pairs);
        header.ensure(SESSION_COOKIE, &session_id);

        tracing::info!(
            "Login succeeded, cookie header carries {} cookie(s)",
            header.header_value().split("; ").count()
        );
        self.session_id = Some(session_id);
        self.cookie_header = Some(header);
        Ok(())
    }

    fn login_headers(&self) -> HeaderMap {
        let main = &self.settings.endpoints.main_url;
        browser_headers(main, &format!("{}/login", main))
    }
}

#[cfg(test)]
impl AuthManager {
    /// Build a manager in a given session state for unit tests
    pub fn with_session(
        transport: Arc<Transport>,
        settings: Arc<Settings>,
        session_id: Option<&str>,
        cookie_header: Option<CookieHeader>,
    ) -> Self {
        let mut manager = Self::new(transport, settings);
        manager.session_id = session_id.map(str::to_string);
        manager.cookie_header = cookie_header;
        if manager.session_id.is_some() {
            manager.state = AuthState::Authenticated;
        }
        manager
    }
}
