use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::log_info;
use crate::shared::errors::{AppError, AppResult};

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    /// Bearer token for the favorites store
    pub id_token: String,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            id_token: id_token.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Auth-state stream: the current user, or `None` when signed out.
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    current: std::sync::Arc<watch::Sender<Option<AuthUser>>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: std::sync::Arc::new(current),
        }
    }

    pub fn sign_in(&self, user: AuthUser) -> AppResult<()> {
        if user.uid.trim().is_empty() {
            return Err(AppError::AuthError("User id cannot be empty".to_string()));
        }
        log_info!("Auth: user {} signed in", user.uid);
        self.current.send_if_modified(|current| {
            if current.as_ref() == Some(&user) {
                return false;
            }
            *current = Some(user);
            true
        });
        Ok(())
    }

    pub fn sign_out(&self) {
        self.current.send_if_modified(|current| match current.take() {
            Some(user) => {
                log_info!("Auth: user {} signed out", user.uid);
                true
            }
            None => false,
        });
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|user| user.uid.clone())
    }

    /// Receiver that is notified on every sign-in/sign-out
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}
