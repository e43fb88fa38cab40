//! Identity gateway.
//!
//! Registration, authentication and token validation are delegated to a managed
//! identity provider reached through [`AuthProvider`]. [`InMemoryAuthProvider`] is
//! a stand-in for tests and local runs; it keeps everything in process memory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors from the identity provider and account flows.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("User already exists: {0}")]
    UserExists(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Identity provider error: {0}")]
    Provider(String),
    #[error(transparent)]
    Store(#[from] crate::error::Error),
}

impl AuthError {
    /// True for failures that mean "who are you?" rather than "something broke".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::InvalidToken)
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Tokens issued on a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn register(&self, username: &str, password: &str, email: &str) -> AuthResult<()>;

    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<TokenBundle>;

    /// `Ok(false)` means the provider answered and rejected the token.
    async fn validate_token(&self, token: &str) -> AuthResult<bool>;
}

const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    #[allow(dead_code)]
    email: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    access_tokens: HashSet<String>,
}

/// In-process identity provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthProvider {
    state: Arc<RwLock<State>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn register(&self, username: &str, password: &str, email: &str) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.accounts.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }
        state.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                email: email.to_string(),
            },
        );
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<TokenBundle> {
        let mut state = self.state.write().await;
        match state.accounts.get(username) {
            Some(account) if account.password == password => {}
            _ => return Err(AuthError::InvalidCredentials),
        }

        let bundle = TokenBundle {
            access_token: Uuid::new_v4().to_string(),
            id_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: TOKEN_LIFETIME_SECS,
            token_type: "Bearer".to_string(),
        };
        state.access_tokens.insert(bundle.access_token.clone());
        Ok(bundle)
    }

    async fn validate_token(&self, token: &str) -> AuthResult<bool> {
        Ok(self.state.read().await.access_tokens.contains(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_authenticate_validate() {
        let provider = InMemoryAuthProvider::new();
        provider
            .register("alice", "s3cret", "alice@example.com")
            .await
            .unwrap();

        let tokens = provider.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 3600);
        assert!(provider.validate_token(&tokens.access_token).await.unwrap());
        assert!(!provider.validate_token(&tokens.id_token).await.unwrap());
        assert!(!provider.validate_token("garbage").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let provider = InMemoryAuthProvider::new();
        provider.register("alice", "a", "a@example.com").await.unwrap();

        let err = provider
            .register("alice", "b", "b@example.com")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::UserExists("alice".to_string()));
        assert!(!err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let provider = InMemoryAuthProvider::new();
        provider.register("alice", "right", "a@example.com").await.unwrap();

        for (user, password) in [("alice", "wrong"), ("bob", "right")] {
            let err = provider.authenticate(user, password).await.unwrap_err();
            assert_eq!(err, AuthError::InvalidCredentials);
            assert!(err.is_authentication_failure());
        }
    }

    #[test]
    fn test_token_bundle_json_shape() {
        let bundle = TokenBundle {
            access_token: "a".to_string(),
            id_token: "i".to_string(),
            refresh_token: "r".to_string(),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["accessToken"], "a");
        assert_eq!(value["expiresIn"], 3600);
    }
}
