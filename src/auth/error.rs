/// Problems with the service-account configuration found at startup.
///
/// These never abort the process: they turn the authenticator into
/// [`super::Authenticator::Unconfigured`].
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is empty")]
    Empty(&'static str),

    #[error("private key could not be loaded: {0}")]
    InvalidKey(String),
}

/// Failures while exchanging a signed assertion for a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to sign token assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint rejected the assertion (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("token endpoint returned an invalid response: {0}")]
    InvalidResponse(String),
}
