use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{NewUser, UserId};
use crate::error::{ServiceError, ServiceResult};

/// Account creation and password login on top of a [`UserRepo`].
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepo>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, id: UserId, username: &str, password: &str) -> ServiceResult<()> {
        let username = username.trim();
        let password = password.trim();

        if id <= 0 {
            return Err(ServiceError::InvalidInput("user id must be positive".into()));
        }
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput(
                "username and password are required".into(),
            ));
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = self
            .users
            .create(NewUser {
                id,
                username: username.to_string(),
                password_hash,
            })
            .await
            .inspect_err(|e| warn!(error = %e, "registration rejected"))?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(())
    }

    /// `Some(id)` when the credentials match. Unknown usernames and wrong
    /// passwords are both `None` and cost one hash verification each.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Option<UserId>> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let user = self.users.find_by_username(username).await?;
        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let ok = verify_password_blocking(password.to_string(), stored).await?;

        match user {
            Some(user) if ok => {
                info!(user_id = user.id, "user logged in");
                Ok(Some(user.id))
            }
            _ => {
                warn!("login rejected");
                Ok(None)
            }
        }
    }

    pub async fn user_exists(&self, id: UserId) -> ServiceResult<bool> {
        Ok(self.users.find_by_id(id).await?.is_some())
    }
}
