use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Login rejected by spotify ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Application credentials used for the client credentials flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// An authenticated web api session.
///
/// The bearer token is obtained once and used for every request of the run.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn connect(credentials: &ClientCredentials) -> Result<Session, LoginError> {
        Self::connect_with(credentials, TOKEN_URL, API_URL).await
    }

    pub async fn connect_with(
        credentials: &ClientCredentials,
        token_url: &str,
        api_url: &str,
    ) -> Result<Session, LoginError> {
        let client = reqwest::Client::new();
        let response = client
            .post(token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("failed to reach {}: {}", token_url, err);
                LoginError::Request(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("error while authenticating with spotify servers: {}", status);
            return Err(LoginError::Rejected { status, body });
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("obtained access token, expires in {}s", token.expires_in);

        Ok(Session {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            access_token: token.access_token,
        })
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.access_token)
    }
}
