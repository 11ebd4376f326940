//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests against a
//! mocked lottery site.

use dhlottery_bot::{AuthManager, Credentials, Settings, Transport};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An RSA keypair the mock site hands out at login
pub struct TestKey {
    private_key: RsaPrivateKey,
}

impl TestKey {
    /// Generate a fresh keypair (small, for test speed)
    pub fn generate() -> Self {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("test key generation");
        Self { private_key }
    }

    /// The key endpoint payload for this key
    pub fn payload(&self) -> serde_json::Value {
        let public_key = self.private_key.to_public_key();
        serde_json::json!({
            "data": {
                "rsaModulus": public_key.n().to_str_radix(16),
                "publicExponent": public_key.e().to_str_radix(16),
            }
        })
    }

    /// Decrypt a hex ciphertext as the site would
    pub fn decrypt(&self, ciphertext_hex: &str) -> String {
        let ciphertext = hex::decode(ciphertext_hex).expect("hex ciphertext");
        let plaintext = self
            .private_key
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .expect("decryptable ciphertext");
        String::from_utf8(plaintext).expect("utf-8 credential")
    }
}

/// Settings aimed at the mock server, with pacing and backoff minimized
pub fn test_settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.network.request_delay_ms = 0;
    settings.network.max_retries = 3;
    settings.endpoints.main_url = server.uri();
    settings.endpoints.game_url = server.uri();
    settings.purchase.backoff_cap_ms = 50;
    settings
}

/// Mount the three login endpoints on the mock server
pub async fn mount_login_mocks(server: &MockServer, key: &TestKey) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login page</html>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login/selectRsaModulus.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(key.payload()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login/securityLoginCheck.do"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=test-session-id; Path=/")
                .set_body_string("<html>main</html>"),
        )
        .mount(server)
        .await;
}

/// Log a test account in against the mock server
pub async fn logged_in_manager(
    server: &MockServer,
    settings: Settings,
) -> (Arc<Transport>, Arc<Settings>, AuthManager) {
    let key = TestKey::generate();
    mount_login_mocks(server, &key).await;

    let settings = Arc::new(settings);
    let transport = Arc::new(Transport::new(settings.network.clone()).expect("transport"));
    let mut auth = AuthManager::new(Arc::clone(&transport), Arc::clone(&settings));
    auth.login(Credentials::new("test-user", "test-password"))
        .await
        .expect("login against mock server");

    (transport, settings, auth)
}
