//! Google OAuth2 flows: authorization URL, code exchange, token refresh and
//! the userinfo lookup used to label a linked account.

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::config::Config;

const AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USER_INFO_URL: &str = "https://www.googleapis.com/userinfo/v2/me";

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present on the first consent; refresh responses omit it.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Client credentials plus the HTTP client used against Google's endpoints.
#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOAuth {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
        }
    }

    /// Consent-screen URL the browser is sent to. `state` round-trips
    /// through Google and comes back on the callback.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            AUTHORIZATION_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                // offline + consent so Google issues a refresh token
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .context("building authorization url")?;
        Ok(url.into())
    }

    /// Exchange the callback code for an access/refresh token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.post_token(&params).await
    }

    /// Mint a fresh access token from a stored refresh token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        self.post_token(&params).await
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await
            .context("token endpoint unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("token request failed ({status}): {body}"));
        }

        response
            .json::<TokenResponse>()
            .await
            .context("malformed token response")
    }

    /// Email/name of the account the token belongs to.
    pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo> {
        let response = self
            .http
            .get(USER_INFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .context("userinfo endpoint unreachable")?;

        if !response.status().is_success() {
            return Err(anyhow!("userinfo request failed ({})", response.status()));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .context("malformed userinfo response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth() -> GoogleOAuth {
        GoogleOAuth {
            http: reqwest::Client::new(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/api/integrations/google/callback".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let url = oauth().authorization_url("abc123").unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("drive.readonly"));
    }

    #[test]
    fn test_redirect_uri_is_percent_encoded() {
        let url = oauth().authorization_url("s").unwrap();
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost"));
    }
}
