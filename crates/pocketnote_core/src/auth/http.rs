//! HTTP-backed account gateway.
//!
//! # Responsibility
//! - Implement [`AuthGateway`] against the hosted account API.
//! - Hold the session cookie for the signed-in account.
//!
//! # Invariants
//! - Account calls authenticate by session cookie; the server key from
//!   the config is never attached here.
//! - `current_user` maps a missing session to `None`, not an error.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AccountUser, AuthError, AuthGateway, AuthResult};
use crate::config::BackendConfig;
use crate::model::note::OwnerId;

const HEADER_PROJECT: &str = "X-Appwrite-Project";

/// Sentinel user id asking the backend to mint one.
const NEW_USER_ID: &str = "unique()";

/// Session alias for "the session this cookie belongs to".
const CURRENT_SESSION: &str = "current";

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidData(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Account gateway speaking the backend's account REST surface.
pub struct HttpAuthGateway {
    http: Client,
    config: BackendConfig,
}

impl HttpAuthGateway {
    /// Builds a gateway with its own cookie-carrying client.
    pub fn new(config: BackendConfig) -> AuthResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, config))
    }

    /// Builds a gateway on a shared client so the session cookie it
    /// captures also applies to document calls on the same client.
    pub fn with_client(http: Client, config: BackendConfig) -> Self {
        Self { http, config }
    }

    /// Client holding this gateway's session cookie. Hand a clone to the
    /// note store so document calls run on the same session.
    pub fn session_client(&self) -> &Client {
        &self.http
    }

    fn account_url(&self) -> String {
        format!("{}/account", self.config.endpoint)
    }

    fn email_session_url(&self) -> String {
        format!("{}/account/sessions/email", self.config.endpoint)
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/account/sessions/{}", self.config.endpoint, session_id)
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(HEADER_PROJECT, &self.config.project_id)
    }

    async fn read_failure(&self, response: Response) -> AuthError {
        let status = response.status().as_u16();
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("request failed with status {status}"),
        };
        classify_failure(status, message)
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<AccountUser> {
        let body = json!({
            "userId": NEW_USER_ID,
            "email": email,
            "password": password,
            "name": name,
        });
        let response = self
            .decorate(self.http.post(self.account_url()))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        response.json::<WireUser>().await?.into_user()
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<AccountUser> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .decorate(self.http.post(self.email_session_url()))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        // The session cookie is now in the jar; resolve the account it
        // belongs to.
        match self.current_user().await? {
            Some(user) => Ok(user),
            None => Err(AuthError::InvalidData(
                "session opened but no account resolved".to_string(),
            )),
        }
    }

    async fn current_user(&self) -> AuthResult<Option<AccountUser>> {
        let response = self.decorate(self.http.get(self.account_url())).send().await?;
        if response.status().as_u16() == 401 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        response.json::<WireUser>().await?.into_user().map(Some)
    }

    async fn logout(&self) -> AuthResult<()> {
        let response = self
            .decorate(self.http.delete(self.session_url(CURRENT_SESSION)))
            .send()
            .await?;
        // No session to delete means the account is already signed out.
        if response.status().as_u16() == 401 {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        Ok(())
    }
}

fn classify_failure(status: u16, message: String) -> AuthError {
    match status {
        401 | 403 => AuthError::InvalidCredentials(message),
        _ => AuthError::Api { status, message },
    }
}

/// Account record as returned by the backend.
#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    name: String,
    email: String,
}

impl WireUser {
    fn into_user(self) -> AuthResult<AccountUser> {
        let id = OwnerId::new(self.id);
        if id.is_blank() {
            return Err(AuthError::InvalidData(
                "account record carries a blank id".to_string(),
            ));
        }
        Ok(AccountUser {
            id,
            name: self.name,
            email: self.email,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
