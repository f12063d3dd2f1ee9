//! Shared helpers for unit and end-to-end tests.

use openssl::{
    pkey::{PKey, Private},
    rsa::Rsa,
    symm::Cipher,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{
    auth::{Authenticator, ServiceAccountCredentials},
    config::AnalyticsConfig,
};

pub const TEST_KEY_PASSPHRASE: &str = "notasecret";
pub const TEST_SERVICE_ACCOUNT: &str = "widget@test.iam.gserviceaccount.com";
pub const TEST_ACCESS_TOKEN: &str = "ya29.test-token";

/// Throwaway RSA key pair (2048-bit, generated per test).
pub struct TestKeyPair {
    key: PKey<Private>,
}

impl TestKeyPair {
    pub fn generate() -> Self {
        let rsa = Rsa::generate(2048).unwrap();
        Self {
            key: PKey::from_rsa(rsa).unwrap(),
        }
    }

    pub fn private_pem(&self) -> String {
        String::from_utf8(self.key.private_key_to_pem_pkcs8().unwrap()).unwrap()
    }

    pub fn encrypted_private_pem(&self, passphrase: &str) -> String {
        let pem = self
            .key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase.as_bytes())
            .unwrap();
        String::from_utf8(pem).unwrap()
    }

    pub fn public_pem(&self) -> String {
        String::from_utf8(self.key.public_key_to_pem().unwrap()).unwrap()
    }

    pub fn credentials(&self, view_id: &str) -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            email: TEST_SERVICE_ACCOUNT.to_string(),
            private_key: self.private_pem(),
            private_key_secret: None,
            view_id: view_id.to_string(),
        }
    }
}

/// Analytics config pointing both the token and reporting endpoints at a mock server.
pub fn analytics_config_for(server: &MockServer) -> AnalyticsConfig {
    AnalyticsConfig {
        token_uri: format!("{}/token", server.uri()),
        api_base_url: format!("{}/analytics/v3", server.uri()),
        ..Default::default()
    }
}

/// Mount a token endpoint that always grants [`TEST_ACCESS_TOKEN`].
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": TEST_ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// A ready authenticator whose token endpoint is on `server`.
pub fn ready_authenticator(server: &MockServer, view_id: &str) -> Authenticator {
    let keys = TestKeyPair::generate();
    let authenticator = Authenticator::from_credentials(
        Ok(keys.credentials(view_id)),
        &analytics_config_for(server),
        reqwest::Client::new(),
    );
    assert!(authenticator.is_ready());
    authenticator
}
