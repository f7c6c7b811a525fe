//! Client for the credential exchange endpoint.
//!
//! The endpoint owns token issuance and OTP delivery; this client only
//! moves requests and payloads. Every operation resolves to an
//! [`AuthCallbackPayload`] so upstream rejections travel in the same shape
//! as accepted logins.

use crate::{FlowError, FlowResult};
use auth_callback::{AuthCallbackPayload, UserSummary};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Boxed future returned by exchange operations.
pub type ExchangeFuture<T> = Pin<Box<dyn Future<Output = FlowResult<T>> + Send>>;

/// Operations against the credential exchange endpoint.
pub trait CredentialExchange: Send + Sync {
    /// Begin a signup flow; the endpoint emails an OTP.
    fn start_signup(&self, email: &str, password: &str) -> ExchangeFuture<AuthCallbackPayload>;

    /// Begin a password-reset flow; the endpoint emails an OTP.
    fn start_password_reset(&self, email: &str) -> ExchangeFuture<AuthCallbackPayload>;

    /// Verify an OTP for the flow started for `email`.
    fn verify_otp(&self, email: &str, code: &str) -> ExchangeFuture<AuthCallbackPayload>;

    /// Complete a password reset for `email`.
    fn reset_password(&self, email: &str, new_password: &str)
        -> ExchangeFuture<AuthCallbackPayload>;

    /// Exchange a stored bearer token for a fresh user record.
    fn validate_token(&self, token: &str) -> ExchangeFuture<UserSummary>;
}

/// HTTP implementation of the exchange client.
pub struct HttpExchange {
    base_url: String,
    http_client: Client,
}

impl HttpExchange {
    /// Create a client against the given exchange base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    fn post_payload(&self, path: &str, body: serde_json::Value) -> ExchangeFuture<AuthCallbackPayload> {
        let url = format!("{}{}", self.base_url, path);
        let client = self.http_client.clone();

        Box::pin(async move {
            debug!(url = %url, "Calling credential exchange");

            let response = client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            // Rejections come back as a failure payload; anything else is a
            // broken endpoint.
            match serde_json::from_str::<AuthCallbackPayload>(&text) {
                Ok(payload) => Ok(payload),
                Err(_) => {
                    warn!(status = %status, body = %text, "Unparseable exchange response");
                    Err(FlowError::Exchange(format!("HTTP {}: {}", status, text)))
                }
            }
        })
    }
}

impl CredentialExchange for HttpExchange {
    fn start_signup(&self, email: &str, password: &str) -> ExchangeFuture<AuthCallbackPayload> {
        self.post_payload(
            "/auth/signup",
            serde_json::json!({ "email": email, "password": password }),
        )
    }

    fn start_password_reset(&self, email: &str) -> ExchangeFuture<AuthCallbackPayload> {
        self.post_payload(
            "/auth/forgot-password",
            serde_json::json!({ "email": email }),
        )
    }

    fn verify_otp(&self, email: &str, code: &str) -> ExchangeFuture<AuthCallbackPayload> {
        self.post_payload(
            "/auth/verify-otp",
            serde_json::json!({ "email": email, "otp": code }),
        )
    }

    fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> ExchangeFuture<AuthCallbackPayload> {
        self.post_payload(
            "/auth/reset-password",
            serde_json::json!({ "email": email, "password": new_password }),
        )
    }

    fn validate_token(&self, token: &str) -> ExchangeFuture<UserSummary> {
        let url = format!("{}/auth/me", self.base_url);
        let token = token.to_string();
        let client = self.http_client.clone();

        Box::pin(async move {
            debug!(url = %url, "Validating stored session token");

            let response = client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "Stored token rejected");
                return Err(FlowError::Exchange(format!(
                    "Server rejected session: HTTP {}: {}",
                    status, body
                )));
            }

            Ok(response.json::<UserSummary>().await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let exchange = HttpExchange::new("https://api.tweakbench.app/");
        assert_eq!(exchange.base_url, "https://api.tweakbench.app");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let exchange = HttpExchange::new("http://127.0.0.1:1");
        let result = exchange.start_password_reset("a@example.com").await;
        assert!(matches!(result, Err(FlowError::Http(_))));
    }
}
