use jsonwebtoken::EncodingKey;
use openssl::pkey::{Id, PKey, Private};

use super::CredentialsError;

/// Service account email, used as the JWT issuer.
pub const SERVICE_ACCOUNT_EMAIL_VAR: &str = "GOOGLE_SERVICE_ACCOUNT_EMAIL";
/// RSA private key in PEM form.
pub const PRIVATE_KEY_VAR: &str = "GOOGLE_PRIVATE_KEY";
/// Passphrase for an encrypted private key.
pub const PRIVATE_KEY_SECRET_VAR: &str = "GOOGLE_PRIVATE_KEY_SECRET";
/// Reporting view id.
pub const VIEW_ID_VAR: &str = "GOOGLE_ANALYTICS_VIEW_ID";

/// Service-account identity and key material read from the environment.
#[derive(Clone)]
pub struct ServiceAccountCredentials {
    pub email: String,
    pub private_key: String,
    pub private_key_secret: Option<String>,
    pub view_id: String,
}

impl ServiceAccountCredentials {
    /// Load credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup.
    ///
    /// The passphrase is optional: unset or empty means the key is stored
    /// unencrypted. A `ga:` prefix on the view id is accepted and stripped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CredentialsError> {
        let required = |name: &'static str| -> Result<String, CredentialsError> {
            let value = lookup(name).ok_or(CredentialsError::Missing(name))?;
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(CredentialsError::Empty(name));
            }
            Ok(value)
        };

        let email = required(SERVICE_ACCOUNT_EMAIL_VAR)?;
        let private_key = required(PRIVATE_KEY_VAR)?;
        let view_id = required(VIEW_ID_VAR)?;
        let view_id = view_id
            .strip_prefix("ga:")
            .map(str::to_string)
            .unwrap_or(view_id);
        let private_key_secret = lookup(PRIVATE_KEY_SECRET_VAR).filter(|s| !s.is_empty());

        Ok(Self {
            email,
            private_key,
            private_key_secret,
            view_id,
        })
    }

    /// Decode the private key into an RS256 signing key.
    pub fn signing_key(&self) -> Result<EncodingKey, CredentialsError> {
        let pkey = load_private_key(&self.private_key, self.private_key_secret.as_deref())?;
        let pkcs8 = pkey
            .private_key_to_pem_pkcs8()
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;
        EncodingKey::from_rsa_pem(&pkcs8).map_err(|e| CredentialsError::InvalidKey(e.to_string()))
    }
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("email", &self.email)
            .field("view_id", &self.view_id)
            .field("encrypted_key", &self.private_key_secret.is_some())
            .finish_non_exhaustive()
    }
}

fn load_private_key(pem: &str, passphrase: Option<&str>) -> Result<PKey<Private>, CredentialsError> {
    let pem = normalize_pem(pem);
    let pkey = match passphrase {
        Some(passphrase) => {
            PKey::private_key_from_pem_passphrase(pem.as_bytes(), passphrase.as_bytes())
        }
        // An empty passphrase callback makes encrypted keys fail instead of
        // prompting on the terminal.
        None => PKey::private_key_from_pem_callback(pem.as_bytes(), |_| Ok(0)),
    }
    .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;

    if pkey.id() != Id::RSA {
        return Err(CredentialsError::InvalidKey(
            "service account keys must be RSA".into(),
        ));
    }

    Ok(pkey)
}

/// Environment variables often carry PEM newlines as literal `\n`.
fn normalize_pem(pem: &str) -> String {
    pem.trim().replace("\\n", "\n")
}
