//! Process-wide session store.
//!
//! Holds the bearer token and signed-in user, backed by a persistent
//! [`SessionStorage`] under the keys `authToken` and `userData`. The store
//! is hydrated once at startup and cleared on sign-out or when any request
//! gets a 401. Every change is broadcast on a watch channel, so listeners
//! (the navigation layer, the CLI) see an invalidation even when the view
//! that issued the failing request is gone.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::SecretString;
use tokio::sync::watch;

use crate::error::Result;
use crate::model::User;
use crate::remote::BearerToken;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_DATA_KEY: &str = "userData";

/// Where navigation should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    SignIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Loaded from storage at startup.
    Hydrated,
    SignedIn(User),
    SignedOut,
    /// Credentials were rejected by the API and have been cleared.
    Invalidated,
}

/// What listeners observe on the session channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub route: Route,
    pub last_event: SessionEvent,
}

#[derive(Default)]
struct Credentials {
    token: Option<SecretString>,
    user: Option<User>,
}

struct SessionInner {
    storage: Arc<dyn SessionStorage>,
    credentials: RwLock<Credentials>,
    events: watch::Sender<SessionSnapshot>,
}

/// Shared handle to the session. Clones refer to the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let credentials = self.inner.credentials.read();
        f.debug_struct("SessionStore")
            .field("token", &credentials.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &credentials.user)
            .finish()
    }
}

impl SessionStore {
    fn with_credentials(storage: Arc<dyn SessionStorage>, credentials: Credentials) -> Self {
        let snapshot = SessionSnapshot {
            user: credentials.user.clone(),
            route: route_for(&credentials),
            last_event: SessionEvent::Hydrated,
        };
        let (events, _) = watch::channel(snapshot);
        Self {
            inner: Arc::new(SessionInner {
                storage,
                credentials: RwLock::new(credentials),
                events,
            }),
        }
    }

    /// Load the session persisted in `storage`.
    ///
    /// The user is signed in only when both keys are present and the user
    /// record parses. A malformed record is reported and treated as
    /// signed out.
    pub fn hydrate(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let token = storage.get(AUTH_TOKEN_KEY)?;
        let user_data = storage.get(USER_DATA_KEY)?;

        let credentials = match (token, user_data) {
            (Some(token), Some(user_data)) => match serde_json::from_str::<User>(&user_data) {
                Ok(user) => Credentials {
                    token: Some(SecretString::from(token)),
                    user: Some(user),
                },
                Err(e) => {
                    tracing::warn!("ignoring malformed stored user data: {e}");
                    Credentials::default()
                }
            },
            _ => Credentials::default(),
        };

        tracing::debug!(
            authenticated = credentials.token.is_some(),
            "session hydrated"
        );
        Ok(Self::with_credentials(storage, credentials))
    }

    /// A signed-out session that is not persisted anywhere.
    pub fn in_memory() -> Self {
        Self::with_credentials(Arc::new(MemoryStorage::new()), Credentials::default())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.read().token.is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.credentials.read().user.clone()
    }

    pub fn route(&self) -> Route {
        self.inner.events.borrow().route
    }

    /// The token to attach to outgoing requests, if signed in.
    pub fn bearer(&self) -> Option<BearerToken> {
        self.inner
            .credentials
            .read()
            .token
            .clone()
            .map(BearerToken::from)
    }

    /// Persist and activate a new session.
    pub fn sign_in(&self, token: String, user: User) -> Result<()> {
        let user_data = serde_json::to_string(&user)?;
        self.inner.storage.set(AUTH_TOKEN_KEY, &token)?;
        self.inner.storage.set(USER_DATA_KEY, &user_data)?;

        {
            let mut credentials = self.inner.credentials.write();
            credentials.token = Some(SecretString::from(token));
            credentials.user = Some(user.clone());
        }

        tracing::info!(user = %user.email, "signed in");
        self.broadcast(Some(user.clone()), Route::Dashboard, SessionEvent::SignedIn(user));
        Ok(())
    }

    /// Clear the session at the user's request.
    pub fn sign_out(&self) -> Result<()> {
        self.clear_memory();
        self.inner.storage.remove(AUTH_TOKEN_KEY)?;
        self.inner.storage.remove(USER_DATA_KEY)?;

        tracing::info!("signed out");
        self.broadcast(None, Route::SignIn, SessionEvent::SignedOut);
        Ok(())
    }

    /// Clear the session after the API rejected the credentials.
    ///
    /// Never fails: storage errors are logged and the in-memory session is
    /// cleared regardless, so no further request carries the rejected token.
    pub fn invalidate(&self) {
        self.clear_memory();
        for key in [AUTH_TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.inner.storage.remove(key) {
                tracing::error!("failed to clear '{key}' from session storage: {e}");
            }
        }

        tracing::warn!("session invalidated by the API, sign-in required");
        self.broadcast(None, Route::SignIn, SessionEvent::Invalidated);
    }

    /// Receiver for session changes. Starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.events.borrow().clone()
    }

    fn clear_memory(&self) {
        let mut credentials = self.inner.credentials.write();
        credentials.token = None;
        credentials.user = None;
    }

    fn broadcast(&self, user: Option<User>, route: Route, last_event: SessionEvent) {
        self.inner.events.send_replace(SessionSnapshot {
            user,
            route,
            last_event,
        });
    }
}

fn route_for(credentials: &Credentials) -> Route {
    if credentials.token.is_some() {
        Route::Dashboard
    } else {
        Route::SignIn
    }
}
