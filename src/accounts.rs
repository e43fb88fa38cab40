//! Register and log in users: the identity provider owns credentials, the Users
//! table maps each user name to the id its budget records are filed under.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider, AuthResult, TokenBundle};
use crate::models::UserRecord;
use crate::repository::UserRepository;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    #[serde(flatten)]
    pub tokens: TokenBundle,
    pub user_id: String,
}

#[derive(Clone)]
pub struct Accounts {
    auth: Arc<dyn AuthProvider>,
    users: UserRepository,
}

impl Accounts {
    pub fn new(auth: Arc<dyn AuthProvider>, users: UserRepository) -> Self {
        Self { auth, users }
    }

    /// Registers with the identity provider, then files a new user id for the name.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> AuthResult<String> {
        self.auth.register(username, password, email).await?;

        let user = UserRecord {
            user_name: username.to_string(),
            user_id: Uuid::new_v4().to_string(),
        };
        if let Err(e) = self.users.create(&user).await {
            error!(
                "User '{username}' is registered with the identity provider but has no user \
                 record and cannot log in: {e}"
            );
            return Err(e.into());
        }
        info!("Registered user '{username}'");
        Ok(user.user_id)
    }

    /// Authenticates and resolves the caller's user id.
    ///
    /// A user the provider knows but the Users table doesn't is rejected as an
    /// authentication failure.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginResult> {
        let tokens = self.auth.authenticate(username, password).await?;

        let Some(user_id) = self.users.find_user_id(username).await? else {
            warn!("User '{username}' authenticated but has no user record");
            return Err(AuthError::InvalidCredentials);
        };

        Ok(LoginResult { tokens, user_id })
    }

    /// Fails with [`AuthError::InvalidToken`] unless the provider accepts `token`.
    pub async fn authorize(&self, token: &str) -> AuthResult<()> {
        if self.auth.validate_token(token).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::auth::InMemoryAuthProvider;
    use crate::dynamodb::{Item, Table, Tables};
    use crate::error::{Error, Result};
    use crate::store::{InMemoryStore, Key, RecordStore};

    fn accounts() -> (Accounts, Arc<InMemoryAuthProvider>, UserRepository) {
        let provider = Arc::new(InMemoryAuthProvider::new());
        let users = UserRepository::new(Arc::new(InMemoryStore::new()), &Tables::default());
        let accounts = Accounts::new(provider.clone(), users.clone());
        (accounts, provider, users)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (accounts, _, users) = accounts();

        let user_id = accounts
            .register("alice", "s3cret", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(
            users.find_user_id("alice").await.unwrap(),
            Some(user_id.clone())
        );

        let login = accounts.login("alice", "s3cret").await.unwrap();
        assert_eq!(login.user_id, user_id);
        accounts.authorize(&login.tokens.access_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_without_user_record_is_rejected() {
        let (accounts, provider, _) = accounts();
        provider
            .register("ghost", "pw", "ghost@example.com")
            .await
            .unwrap();

        let err = accounts.login("ghost", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_register_stores_nothing_new() {
        let (accounts, _, users) = accounts();
        let first = accounts.register("alice", "a", "a@example.com").await.unwrap();

        let err = accounts
            .register("alice", "b", "b@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserExists(_)));
        assert_eq!(users.find_user_id("alice").await.unwrap(), Some(first));
    }

    /// Store whose every call fails, as an unreachable backend would.
    struct UnreachableStore;

    fn unreachable_error(operation: &'static str, table: &Table) -> Error {
        Error::StoreUnavailable {
            operation,
            table: table.name().to_string(),
            key: None,
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn put(&self, table: &Table, _item: Item) -> Result<()> {
            Err(unreachable_error("PutItem", table))
        }

        async fn query(&self, table: &Table, _partition: &str) -> Result<Vec<Item>> {
            Err(unreachable_error("Query", table))
        }

        async fn update(&self, table: &Table, _key: &Key, _updates: Item) -> Result<()> {
            Err(unreachable_error("UpdateItem", table))
        }

        async fn delete(&self, table: &Table, _key: &Key) -> Result<()> {
            Err(unreachable_error("DeleteItem", table))
        }

        async fn write_chunk(&self, table: &Table, _items: Vec<Item>) -> Result<()> {
            Err(unreachable_error("BatchWriteItem", table))
        }
    }

    #[tokio::test]
    async fn test_failed_user_record_surfaces_store_error() {
        let provider = Arc::new(InMemoryAuthProvider::new());
        let users = UserRepository::new(Arc::new(UnreachableStore), &Tables::default());
        let accounts = Accounts::new(provider.clone(), users);

        let err = accounts
            .register("alice", "pw", "a@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(Error::StoreUnavailable { .. })));
        assert!(!err.is_authentication_failure());
        assert!(provider.authenticate("alice", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_authorize_rejects_unknown_token() {
        let (accounts, _, _) = accounts();
        let err = accounts.authorize("nope").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
        assert!(err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_login_result_json_is_flat() {
        let (accounts, _, _) = accounts();
        accounts.register("alice", "pw", "a@example.com").await.unwrap();
        let login = accounts.login("alice", "pw").await.unwrap();

        let value = serde_json::to_value(&login).unwrap();
        assert_eq!(value["userId"], login.user_id.as_str());
        assert_eq!(value["tokenType"], "Bearer");
    }
}
