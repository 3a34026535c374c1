use serde::{Deserialize, Serialize};

use super::{StateStorage, load_persisted, save_persisted};
use crate::types::user::PublicUser;

pub const AUTH_STORAGE_KEY: &str = "auth-storage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedAuth {
    user: Option<PublicUser>,
    token: Option<String>,
    is_authenticated: bool,
}

/// Who is signed in, plus request status for the auth screens.
pub struct AuthStore {
    storage: Box<dyn StateStorage>,
    user: Option<PublicUser>,
    token: Option<String>,
    is_authenticated: bool,
    is_loading: bool,
    error: Option<String>,
}

impl AuthStore {
    pub fn new(storage: Box<dyn StateStorage>) -> Self {
        let persisted: PersistedAuth =
            load_persisted(storage.as_ref(), AUTH_STORAGE_KEY).unwrap_or_default();
        // a session flag without a token cannot authenticate anything
        let restored = persisted.is_authenticated && persisted.token.is_some();
        Self {
            storage,
            user: if restored { persisted.user } else { None },
            token: if restored { persisted.token } else { None },
            is_authenticated: restored,
            is_loading: false,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn login(&mut self, user: PublicUser, token: impl Into<String>) {
        self.user = Some(user);
        self.token = Some(token.into());
        self.is_authenticated = true;
        self.is_loading = false;
        self.error = None;
        self.persist();
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
        self.error = None;
        self.persist();
    }

    /// Edit the signed-in user in place. Does nothing when nobody is signed in.
    pub fn update_user(&mut self, apply: impl FnOnce(&mut PublicUser)) {
        if let Some(user) = self.user.as_mut() {
            apply(user);
            self.persist();
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.is_loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// `Bearer <token>` for API calls, when signed in.
    pub fn authorization_header(&self) -> Option<String> {
        match (&self.token, self.is_authenticated) {
            (Some(token), true) => Some(format!("Bearer {token}")),
            _ => None,
        }
    }

    fn persist(&mut self) {
        let snapshot = PersistedAuth {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        };
        save_persisted(self.storage.as_mut(), AUTH_STORAGE_KEY, &snapshot);
    }
}
