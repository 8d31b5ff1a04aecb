use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use shared::models::{LoginResponse, RegisterData, SignUpData, User, UserRole};
use tracing::{debug, warn};

use crate::api::{ApiClient, AuthEvent};
use crate::error::ApiError;
use crate::store::{self, SessionStore};

/// In-memory authentication state as seen by the rest of the
/// application.
///
/// Invariant: `is_authenticated` holds exactly when both `user` and
/// `token` are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// The authenticated user, when there is one.
    pub user: Option<User>,

    /// The bearer token, present iff authenticated.
    pub token: Option<String>,

    /// Whether a user is currently signed in.
    pub is_authenticated: bool,

    /// True during startup rehydration and while a login or register
    /// call is in flight.
    pub is_loading: bool,
}

impl Session {
    fn bootstrapping() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    fn unauthenticated() -> Self {
        Self::default()
    }

    fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// The transient state while login/register is in flight: loading,
    /// with the previous identity preserved until the call resolves.
    fn loading(previous: &Session) -> Self {
        Self {
            is_loading: true,
            ..previous.clone()
        }
    }
}

type Subscriber = Box<dyn Fn(&Session) + Send + Sync>;

struct ManagerInner {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    state: Mutex<Session>,
    subscribers: Mutex<Vec<Subscriber>>,
    auth_gate: tokio::sync::Mutex<()>,
}

/// Single source of truth for "who is logged in".
///
/// Rehydrates from the session store at construction (a synchronous
/// local read, no network call), bridges the HTTP client's auth
/// operations to observable session state, and resets itself when the
/// client reports an out-of-band 401.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager over the given client and store, rehydrating
    /// immediately.
    #[must_use]
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        let manager = Self {
            inner: Arc::new(ManagerInner {
                client: client.clone(),
                store,
                state: Mutex::new(Session::bootstrapping()),
                subscribers: Mutex::new(Vec::new()),
                auth_gate: tokio::sync::Mutex::new(()),
            }),
        };
        manager.rehydrate();

        // The 401 handler runs for every request, including ones issued
        // outside this manager; a weak reference avoids a cycle with the
        // client's observer list.
        let weak: Weak<ManagerInner> = Arc::downgrade(&manager.inner);
        client.observe_auth_events(move |event| {
            if event == AuthEvent::SessionRevoked {
                if let Some(inner) = weak.upgrade() {
                    let manager = SessionManager { inner };
                    manager.apply(Session::unauthenticated());
                }
            }
        });
        manager
    }

    fn rehydrate(&self) {
        let next = match store::read_session(self.inner.store.as_ref()) {
            Some((token, user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => {
                    debug!(user = %user.email, "restored session from store");
                    Session::authenticated(user, token)
                }
                Err(err) => {
                    warn!(error = %err, "stored user record is unreadable, clearing session");
                    store::clear_session(self.inner.store.as_ref());
                    Session::unauthenticated()
                }
            },
            None => Session::unauthenticated(),
        };
        self.apply(next);
    }

    fn apply(&self, next: Session) {
        if let Ok(mut state) = self.inner.state.lock() {
            *state = next.clone();
        }
        self.notify(&next);
    }

    fn notify(&self, session: &Session) {
        if let Ok(subscribers) = self.inner.subscribers.lock() {
            for subscriber in subscribers.iter() {
                subscriber(session);
            }
        }
    }

    fn settle_failure(&self, previous: Session, err: &ApiError) {
        // A 401 already tore the session down globally; any other
        // failure leaves the prior state untouched.
        if matches!(err, ApiError::Unauthorized) {
            self.apply(Session::unauthenticated());
        } else {
            self.apply(Session {
                is_loading: false,
                ..previous
            });
        }
    }

    /// Sign in. Serialized per manager instance, so two concurrent calls
    /// cannot interleave their writes to the session store.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`]; the prior session state is
    /// preserved on failure.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<UserRole>,
    ) -> Result<LoginResponse, ApiError> {
        let _gate = self.inner.auth_gate.lock().await;
        let previous = self.session();
        self.apply(Session::loading(&previous));

        match self.inner.client.login(email, password, role).await {
            Ok(response) => {
                self.apply(Session::authenticated(
                    response.user.clone(),
                    response.token.clone(),
                ));
                Ok(response)
            }
            Err(err) => {
                self.settle_failure(previous, &err);
                Err(err)
            }
        }
    }

    /// Create an account and establish a session.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`]; the prior session state is
    /// preserved on failure.
    pub async fn register(&self, data: &RegisterData) -> Result<LoginResponse, ApiError> {
        let _gate = self.inner.auth_gate.lock().await;
        let previous = self.session();
        self.apply(Session::loading(&previous));

        match self.inner.client.register(data).await {
            Ok(response) => {
                self.apply(Session::authenticated(
                    response.user.clone(),
                    response.token.clone(),
                ));
                Ok(response)
            }
            Err(err) => {
                self.settle_failure(previous, &err);
                Err(err)
            }
        }
    }

    /// Register via the sign-up form's field set, mapping its company
    /// name onto the organization field.
    ///
    /// # Errors
    /// Returns the normalized [`ApiError`]; the prior session state is
    /// preserved on failure.
    pub async fn sign_up(&self, data: SignUpData) -> Result<LoginResponse, ApiError> {
        let register_data: RegisterData = data.into();
        self.register(&register_data).await
    }

    /// Sign out: best-effort backend notification, then clear both the
    /// persisted entries and the in-memory state. Idempotent.
    pub async fn logout(&self) {
        self.inner.client.logout().await;
        self.apply(Session::unauthenticated());
        debug!("logged out");
    }

    /// Snapshot of the current session state.
    #[must_use]
    pub fn session(&self) -> Session {
        self.inner
            .state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Current bearer token, without any network round-trip.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().token
    }

    /// Current user, when authenticated.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.session().user
    }

    /// Whether a user is currently signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated
    }

    /// Whether rehydration or a login/register call is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.session().is_loading
    }

    /// Register a callback invoked with every session state change.
    pub fn subscribe(&self, subscriber: impl Fn(&Session) + Send + Sync + 'static) {
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.push(Box::new(subscriber));
        }
    }
}
