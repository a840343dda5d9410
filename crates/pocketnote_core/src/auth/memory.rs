//! In-memory account gateway.
//!
//! # Responsibility
//! - Emulate the account backend for tests and local walkthroughs:
//!   registered accounts and at most one live session, in process memory.
//!
//! # Invariants
//! - Email addresses are unique, compared case-insensitively.
//! - Failure answers reuse the HTTP gateway's taxonomy so callers cannot
//!   tell the two implementations apart.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::auth::{AccountUser, AuthError, AuthGateway, AuthResult};
use crate::model::note::OwnerId;

/// Account gateway holding accounts and the session in memory.
#[derive(Default)]
pub struct InMemoryAuthGateway {
    state: Mutex<AuthState>,
}

#[derive(Default)]
struct AuthState {
    accounts: Vec<StoredAccount>,
    session: Option<AccountUser>,
}

struct StoredAccount {
    user: AccountUser,
    password: String,
}

impl InMemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<AccountUser> {
        let mut state = self.guard();
        let taken = state
            .accounts
            .iter()
            .any(|account| account.user.email.eq_ignore_ascii_case(email));
        if taken {
            return Err(AuthError::Api {
                status: 409,
                message: "a user with the same email already exists".to_string(),
            });
        }
        let user = AccountUser {
            id: OwnerId::new(Uuid::new_v4().simple().to_string()),
            name: name.to_string(),
            email: email.to_string(),
        };
        state.accounts.push(StoredAccount {
            user: user.clone(),
            password: password.to_string(),
        });
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<AccountUser> {
        let mut state = self.guard();
        let matched = state
            .accounts
            .iter()
            .find(|account| {
                account.user.email.eq_ignore_ascii_case(email) && account.password == password
            })
            .map(|account| account.user.clone());
        match matched {
            Some(user) => {
                state.session = Some(user.clone());
                Ok(user)
            }
            None => Err(AuthError::InvalidCredentials(
                "invalid email or password".to_string(),
            )),
        }
    }

    async fn current_user(&self) -> AuthResult<Option<AccountUser>> {
        Ok(self.guard().session.clone())
    }

    async fn logout(&self) -> AuthResult<()> {
        self.guard().session = None;
        Ok(())
    }
}
