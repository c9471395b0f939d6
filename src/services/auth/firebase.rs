//! Firebase Authentication over the Identity Toolkit REST API
//!
//! API Flow:
//! 1. Sign in: POST /accounts:signInWithPassword → localId + idToken
//! 2. Sign up: POST /accounts:signUp → localId + idToken
//!
//! Tokens are not refreshed; sign-out is local because the REST API keeps no
//! server-side session.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthErrorCode, IdentityProvider};
use crate::models::Identity;

#[derive(Clone)]
pub struct FirebaseIdentity {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let url = format!("{}/accounts:{}", self.api_url, endpoint);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::new(AuthErrorCode::Network, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::new(AuthErrorCode::Network, e.to_string()))?;

        if !status.is_success() {
            let error = parse_error(&body);
            tracing::warn!(
                endpoint = endpoint,
                status = %status,
                code = ?error.code,
                "Identity Toolkit rejected request"
            );
            return Err(error);
        }

        let account: AccountResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::new(
                AuthErrorCode::Other("MALFORMED_RESPONSE".to_string()),
                format!("Failed to parse Identity Toolkit response: {}", e),
            )
        })?;

        Ok(Identity {
            user_id: account.local_id,
            email: account.email.or_else(|| Some(email.to_string())),
            id_token: account.id_token,
        })
    }
}

/// Turns an Identity Toolkit error body into an [`AuthError`]
fn parse_error(body: &str) -> AuthError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => {
            let message = response.error.message;
            let code = AuthErrorCode::from_backend(&message);
            // "WEAK_PASSWORD : Password should be at least 6 characters"
            let readable = message
                .split_once(" : ")
                .map(|(_, detail)| detail.to_string())
                .unwrap_or(message);
            AuthError::new(code, readable)
        }
        Err(_) => AuthError::new(AuthErrorCode::Other("UNKNOWN".to_string()), body.to_string()),
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), AuthError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "firebase"
    }
}
