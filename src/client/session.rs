use crate::model::profile::Profile;
use crate::models::{LoginResponse, SessionUser};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
struct Credentials {
    access_token: String,
    refresh_token: String,
    user: SessionUser,
}

/// Bearer session shared by every call of an [`ApiClient`](super::api::ApiClient).
///
/// Holds the access token and the logged-in user; cleared on logout and on
/// any 401.
#[derive(Debug, Default)]
pub struct Session {
    inner: RwLock<Option<Credentials>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, login: LoginResponse) {
        let credentials = Credentials {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
            user: login.user,
        };
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// Swaps the tokens after a refresh, keeping the user.
    pub fn rotate(&self, access_token: String, refresh_token: String) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(credentials) = guard.as_mut() {
            credentials.access_token = access_token;
            credentials.refresh_token = refresh_token;
        }
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(|c| c.refresh_token.clone())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.read(|c| c.user.clone())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.read(|c| c.user.profile)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    fn read<T>(&self, f: impl FnOnce(&Credentials) -> T) -> Option<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

#[cfg(test)]
pub(crate) fn login_response(profile: Profile, employee_id: u64) -> LoginResponse {
    LoginResponse {
        access_token: "access".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 1800,
        refresh_token: "refresh".to_string(),
        user: SessionUser {
            id: 7,
            username: "mmartin".to_string(),
            profile,
            employee_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(session.profile().is_none());
    }

    #[test]
    fn store_then_clear() {
        let session = Session::new();
        session.store(login_response(Profile::Supervisor, 3));

        assert_eq!(session.access_token().as_deref(), Some("access"));
        assert_eq!(session.profile(), Some(Profile::Supervisor));
        assert_eq!(session.user().map(|u| u.employee_id), Some(3));

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn rotate_keeps_user() {
        let session = Session::new();
        session.store(login_response(Profile::Validator, 9));
        session.rotate("a2".to_string(), "r2".to_string());

        assert_eq!(session.access_token().as_deref(), Some("a2"));
        assert_eq!(session.refresh_token().as_deref(), Some("r2"));
        assert_eq!(session.user().map(|u| u.id), Some(7));
    }

    #[test]
    fn rotate_without_session_is_ignored() {
        let session = Session::new();
        session.rotate("a".to_string(), "r".to_string());
        assert!(!session.is_authenticated());
    }
}
