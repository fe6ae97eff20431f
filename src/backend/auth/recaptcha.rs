//! reCAPTCHA verification for signups.

use serde::Deserialize;

/// Google's verification endpoint
pub const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Checks reCAPTCHA tokens against the siteverify API
#[derive(Debug, Clone)]
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
    endpoint: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_endpoint(secret, SITEVERIFY_URL)
    }

    /// Verifier posting to a different endpoint
    pub fn with_endpoint(secret: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret: secret.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Whether Google accepts the client's response token
    pub async fn verify(&self, response_token: &str) -> Result<bool, reqwest::Error> {
        let result: SiteVerifyResponse = self
            .client
            .post(&self.endpoint)
            .form(&[("secret", self.secret.as_str()), ("response", response_token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !result.success {
            tracing::warn!(errors = ?result.error_codes, "reCAPTCHA rejected");
        }
        Ok(result.success)
    }
}
