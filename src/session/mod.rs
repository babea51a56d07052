//! Identity of the current browser session.
//!
//! There is no credential check: logging in records a username, synthesizes a
//! handle from it and persists the result so it survives a reload.

mod identity;

pub use identity::Identity;

use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

use crate::collections::{ChangeNotifier, Committed, Subscription};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

/// Storage key of the persisted identity, shared by all handles.
pub const CURRENT_USER_KEY: &str = "current_user";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("the username cannot be empty")]
    EmptyUsername,

    #[error("already logged in as {0}, log out first")]
    AlreadyLoggedIn(String),

    #[error("nobody is logged in")]
    NotLoggedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Identity),
}

/// Outcome of an operation that needs a logged in user.
///
/// `RedirectToLogin` is not a failure: the operation was skipped and the UI is
/// expected to send the user to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Proceed(T),
    RedirectToLogin,
}

impl<T> Guarded<T> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Guarded::RedirectToLogin)
    }

    pub fn proceeded(self) -> Option<T> {
        match self {
            Guarded::Proceed(value) => Some(value),
            Guarded::RedirectToLogin => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Guarded<U> {
        match self {
            Guarded::Proceed(value) => Guarded::Proceed(f(value)),
            Guarded::RedirectToLogin => Guarded::RedirectToLogin,
        }
    }
}

pub struct SessionStore {
    key: StorageKey,
    persistence: PersistenceAdapter,
    notifier: ChangeNotifier,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Restores the persisted identity, if any.
    pub fn open(persistence: PersistenceAdapter, notifier: ChangeNotifier) -> Self {
        let key = StorageKey::global(CURRENT_USER_KEY);
        let state = match persistence.load::<Identity>(&key) {
            Some(identity) if identity.is_valid() => {
                info!("Restored session of {}", identity.handle);
                SessionState::Authenticated(identity)
            }
            Some(_) => {
                warn!("Ignoring persisted identity with an invalid handle");
                SessionState::Anonymous
            }
            None => SessionState::Anonymous,
        };
        SessionStore {
            key,
            persistence,
            notifier,
            state: Mutex::new(state),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        self.state_guard().clone()
    }

    pub fn current(&self) -> Option<Identity> {
        match &*self.state_guard() {
            SessionState::Authenticated(identity) => Some(identity.clone()),
            SessionState::Anonymous => None,
        }
    }

    pub fn handle(&self) -> Option<String> {
        self.current().map(|identity| identity.handle)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state_guard(), SessionState::Authenticated(_))
    }

    pub fn login(&self, username: &str) -> Result<Committed<Identity>, SessionError> {
        self.login_then(username, |_| {})
    }

    /// Like [`Self::login`], running `before_publish` once the new state is in
    /// place and before `LoggedIn` reaches subscribers.
    pub fn login_then<F>(
        &self,
        username: &str,
        before_publish: F,
    ) -> Result<Committed<Identity>, SessionError>
    where
        F: FnOnce(&Identity),
    {
        let identity = Identity::from_username(username)?;

        let save_result = {
            let mut state = self.state_guard();
            if let SessionState::Authenticated(current) = &*state {
                return Err(SessionError::AlreadyLoggedIn(current.handle.clone()));
            }
            *state = SessionState::Authenticated(identity.clone());
            self.persistence.save(&self.key, &identity)
        };
        if let Err(err) = &save_result {
            warn!("Could not persist the session of {}: {}", identity.handle, err);
        }
        info!("Logged in as {}", identity.handle);
        before_publish(&identity);

        self.notifier.publish(&ChangeEvent::LoggedIn {
            handle: identity.handle.clone(),
        });
        Ok(Committed::new(identity, save_result))
    }

    /// Ends the session. Collections stored under the handle are left alone.
    pub fn logout(&self) -> Result<Committed<Identity>, SessionError> {
        self.logout_then(|_| {})
    }

    /// Like [`Self::logout`], running `before_publish` before `LoggedOut`
    /// reaches subscribers.
    pub fn logout_then<F>(&self, before_publish: F) -> Result<Committed<Identity>, SessionError>
    where
        F: FnOnce(&Identity),
    {
        let (identity, delete_result) = {
            let mut state = self.state_guard();
            let identity = match std::mem::replace(&mut *state, SessionState::Anonymous) {
                SessionState::Authenticated(identity) => identity,
                SessionState::Anonymous => return Err(SessionError::NotLoggedIn),
            };
            (identity, self.persistence.delete(&self.key))
        };
        if let Err(err) = &delete_result {
            warn!("Could not forget the session of {}: {}", identity.handle, err);
        }
        info!("Logged out {}", identity.handle);
        before_publish(&identity);

        self.notifier.publish(&ChangeEvent::LoggedOut {
            handle: identity.handle.clone(),
        });
        Ok(Committed::new(identity, delete_result))
    }

    /// Gate for operations that only make sense for a logged in user.
    pub fn require_identity(&self) -> Guarded<Identity> {
        match self.current() {
            Some(identity) => Guarded::Proceed(identity),
            None => Guarded::RedirectToLogin,
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(move |event| {
            if matches!(
                event,
                ChangeEvent::LoggedIn { .. } | ChangeEvent::LoggedOut { .. }
            ) {
                callback(event);
            }
        })
    }
}
