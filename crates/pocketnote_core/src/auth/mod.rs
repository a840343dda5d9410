//! Account sessions and the authentication contract.
//!
//! # Responsibility
//! - Define the gateway contract for account registration, session login,
//!   session inspection and logout.
//! - Orchestrate multi-step flows (register then sign in) in one service.
//!
//! # Invariants
//! - A resolved user always carries a non-blank owner id.
//! - Blank credentials are rejected before any account call.
//! - Log lines never carry emails or passwords.
//!
//! # See also
//! - `controller` for the note list scoped to the signed-in owner.

use async_trait::async_trait;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use crate::model::note::OwnerId;

pub mod http;
pub mod memory;

pub use http::HttpAuthGateway;
pub use memory::InMemoryAuthGateway;

pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication-layer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input rejected before any account call was issued.
    Validation(&'static str),
    /// The backend refused the credentials.
    InvalidCredentials(String),
    /// Network-level failure before any response arrived.
    Transport(String),
    /// Non-success answer other than a credential rejection.
    Api { status: u16, message: String },
    /// The backend answered, but the payload could not be decoded.
    InvalidData(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::InvalidCredentials(message) => write!(f, "invalid credentials: {message}"),
            Self::Transport(message) => write!(f, "account service unreachable: {message}"),
            Self::Api { status, message } => {
                write!(f, "account request failed (HTTP {status}): {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid account response: {message}"),
        }
    }
}

impl Error for AuthError {}

impl AuthError {
    /// Stable machine-readable code for logs and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::Transport(_) => "transport_failed",
            Self::Api { .. } => "api_failed",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

/// Signed-in account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUser {
    /// Account id; doubles as the owner id notes are scoped by.
    pub id: OwnerId,
    /// Display name; may be empty for accounts created without one.
    pub name: String,
    pub email: String,
}

/// Account backend contract.
///
/// Implementations hold whatever session state the backend needs (a
/// cookie jar for the hosted backend, a slot for the in-memory one), so a
/// successful `login` makes later calls act on that session.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Creates an account. Does not sign the new account in.
    async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<AccountUser>;

    /// Opens a session for the credentials and resolves the user.
    async fn login(&self, email: &str, password: &str) -> AuthResult<AccountUser>;

    /// Resolves the currently signed-in user, if any.
    async fn current_user(&self) -> AuthResult<Option<AccountUser>>;

    /// Ends the current session. Already-signed-out is not an error.
    async fn logout(&self) -> AuthResult<()>;
}

/// Use-case facade over an [`AuthGateway`].
pub struct AuthService<G: AuthGateway> {
    gateway: G,
}

impl<G: AuthGateway> AuthService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Creates an account and signs it in, mirroring the first-run flow.
    ///
    /// `name` is the display name and may be empty.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<AccountUser> {
        let started_at = Instant::now();
        info!("event=auth_register module=auth status=start");

        if let Err(err) = check_credentials(email, password) {
            error!(
                "event=auth_register module=auth status=error duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code(),
            );
            return Err(err);
        }

        let outcome = match self.gateway.register(email, password, name).await {
            Ok(_) => self.gateway.login(email, password).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(user) => {
                info!(
                    "event=auth_register module=auth status=ok user_id={} duration_ms={}",
                    user.id,
                    started_at.elapsed().as_millis(),
                );
                Ok(user)
            }
            Err(err) => {
                error!(
                    "event=auth_register module=auth status=error duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Signs in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AccountUser> {
        let started_at = Instant::now();
        info!("event=auth_login module=auth status=start");

        if let Err(err) = check_credentials(email, password) {
            error!(
                "event=auth_login module=auth status=error duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code(),
            );
            return Err(err);
        }

        match self.gateway.login(email, password).await {
            Ok(user) => {
                info!(
                    "event=auth_login module=auth status=ok user_id={} duration_ms={}",
                    user.id,
                    started_at.elapsed().as_millis(),
                );
                Ok(user)
            }
            Err(err) => {
                error!(
                    "event=auth_login module=auth status=error duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Resolves the signed-in user, or `None` without error when there is
    /// no session.
    pub async fn current_user(&self) -> AuthResult<Option<AccountUser>> {
        let started_at = Instant::now();
        info!("event=auth_check module=auth status=start");

        match self.gateway.current_user().await {
            Ok(user) => {
                info!(
                    "event=auth_check module=auth status=ok signed_in={} duration_ms={}",
                    user.is_some(),
                    started_at.elapsed().as_millis(),
                );
                Ok(user)
            }
            Err(err) => {
                error!(
                    "event=auth_check module=auth status=error duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Ends the current session.
    pub async fn logout(&self) -> AuthResult<()> {
        let started_at = Instant::now();
        info!("event=auth_logout module=auth status=start");

        match self.gateway.logout().await {
            Ok(()) => {
                info!(
                    "event=auth_logout module=auth status=ok duration_ms={}",
                    started_at.elapsed().as_millis(),
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=auth_logout module=auth status=error duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }
}

fn check_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Validation("email must not be blank"));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Validation("password must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(matches!(
            check_credentials("", "secret123"),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            check_credentials("user@example.com", "   "),
            Err(AuthError::Validation(_))
        ));
        assert!(check_credentials("user@example.com", "secret123").is_ok());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::Validation("blank").code(), "validation_failed");
        assert_eq!(
            AuthError::InvalidCredentials("refused".into()).code(),
            "invalid_credentials"
        );
        assert_eq!(
            AuthError::Api {
                status: 409,
                message: "exists".into()
            }
            .code(),
            "api_failed"
        );
    }
}
