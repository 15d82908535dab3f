//! Session state and authentication flows
//!
//! [`Session`] is the single owner of "is the user authenticated". It is
//! derived from the credential store at construction, changed only by the
//! flows below, and observable through [`Session::watch`] or the
//! [`EventBus`].
//!
//! ```text
//!            LoggedIn / login / register
//!   ┌─────────────────┐ ───────────────► ┌───────────────┐
//!   │ Unauthenticated │                  │ Authenticated │
//!   └─────────────────┘ ◄─────────────── └───────────────┘
//!            LoggedOut / logout / sign_out
//! ```
//!
//! Credential mutations (login, register, refresh, logout, sign-out) are
//! serialized, so the last published event always matches the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Error, ErrorKind, Result};
use crate::events::{EventBus, SessionEvent};
use crate::forms::{LoginForm, RegisterForm};
use crate::gateway::AuthGateway;
use crate::models::{LoginRequest, TokenResponse, UserProfile};
use crate::store::{CredentialStore, REFRESH_TOKEN_KEY};

/// Observable snapshot of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<ErrorKind>,
    /// User-facing text for `last_error`
    pub error_message: Option<String>,
}

pub struct Session {
    store: Arc<dyn CredentialStore>,
    auth: AuthGateway,
    bus: EventBus,
    state: Arc<watch::Sender<SessionState>>,
    in_flight: AtomicUsize,
    mutation: Mutex<()>,
    listener: JoinHandle<()>,
}

impl Session {
    /// Create the session, subscribe it to `bus` and probe the store
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the event listener is
    /// spawned onto it.
    pub fn new(store: Arc<dyn CredentialStore>, auth: AuthGateway, bus: EventBus) -> Self {
        let (sender, _) = watch::channel(SessionState::default());
        let state = Arc::new(sender);

        let listener = tokio::spawn(listen(bus.subscribe(), state.clone(), store.clone()));

        let session = Self {
            store,
            auth,
            bus,
            state,
            in_flight: AtomicUsize::new(0),
            mutation: Mutex::new(()),
            listener,
        };
        session.check_authentication_status();
        session
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every state change from now on
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Re-derive `is_authenticated` from the store
    ///
    /// Store failures count as "not authenticated" and are only logged.
    pub fn check_authentication_status(&self) -> bool {
        let authenticated = probe(self.store.as_ref());
        self.state
            .send_modify(|s| s.is_authenticated = authenticated);
        authenticated
    }

    // ========================================================================
    // Flows
    // ========================================================================

    /// Validate, log in, persist the token pair and publish `LoggedIn`
    ///
    /// Nothing is written to the store unless the server accepted the login.
    pub async fn login(&self, form: &LoginForm) -> Result<()> {
        let request = self.validated(form.validate())?;
        let _guard = self.mutation.lock().await;

        self.track(async {
            let tokens = self.auth.login(&request).await?;
            self.establish(&tokens)
        })
        .await
    }

    /// Create an account, then log in with the normalized email
    pub async fn register(&self, form: &RegisterForm) -> Result<UserProfile> {
        let request = self.validated(form.validate())?;
        let _guard = self.mutation.lock().await;

        self.track(async {
            let user = self.auth.register(&request).await?;
            log::info!("[session] Registered user {}, logging in", user.id);

            let login = LoginRequest {
                username_or_email: request.email.clone(),
                password: request.password.clone(),
            };
            let tokens = self.auth.login(&login).await?;
            self.establish(&tokens)?;
            Ok::<_, Error>(user)
        })
        .await
    }

    /// Revoke the token on the server, then sign out locally
    ///
    /// A failed remote call is logged and does not stop the local sign-out.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;

        self.track(async {
            if let Err(e) = self.auth.logout().await {
                log::warn!("[session] Remote logout failed, signing out locally: {}", e);
            }
            self.erase()
        })
        .await
    }

    /// Erase the stored credential and publish `LoggedOut`
    ///
    /// This is the session's logout transition on its own.
    /// [`Session::logout`] runs the same step after a backend call, while this
    /// one makes no network call. If the
    /// store cannot be cleared the state is left untouched and the error is
    /// returned.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;
        let result = self.erase();
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// Swap the stored refresh token for a new token pair
    ///
    /// The state does not change and no event is published.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.mutation.lock().await;

        self.track(async {
            let refresh_token = match self.store.get(REFRESH_TOKEN_KEY) {
                Ok(token) => token,
                Err(e) if e.is_not_found() => return Err(Error::Unauthorized),
                Err(e) => return Err(e.into()),
            };

            let tokens = self.auth.refresh(&refresh_token).await?;
            self.persist(&tokens)?;
            log::info!("[session] Access token refreshed");
            Ok::<_, Error>(())
        })
        .await
    }

    /// Profile of the logged-in user, fetched fresh every time
    pub async fn current_user(&self) -> Result<UserProfile> {
        self.track(self.auth.get_current_user()).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn establish(&self, tokens: &TokenResponse) -> Result<()> {
        self.persist(tokens)?;
        self.state.send_modify(|s| {
            s.is_authenticated = true;
            s.last_error = None;
            s.error_message = None;
        });
        log::info!("[session] Logged in");
        self.bus.publish(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Write the token pair, resyncing with the store if the write failed
    fn persist(&self, tokens: &TokenResponse) -> Result<()> {
        self.store.save_credential(&tokens.credential()).map_err(|e| {
            log::error!("[session] Failed to store credentials: {}", e);
            self.reconcile();
            Error::from(e)
        })
    }

    /// A failed dual write rolls the store back, possibly taking the previous
    /// credential with it
    fn reconcile(&self) {
        let authenticated = probe(self.store.as_ref());
        let was_authenticated = self.is_authenticated();
        self.state.send_modify(|s| s.is_authenticated = authenticated);

        if was_authenticated && !authenticated {
            log::warn!("[session] Stored credential lost, signing out");
            self.bus.publish(SessionEvent::LoggedOut);
        }
    }

    fn erase(&self) -> Result<()> {
        self.store.delete_all().map_err(|e| {
            log::error!("[session] Failed to clear credentials: {}", e);
            Error::from(e)
        })?;
        self.state.send_modify(|s| {
            s.is_authenticated = false;
            s.last_error = None;
            s.error_message = None;
        });
        log::info!("[session] Logged out");
        self.bus.publish(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Record a validation failure without starting a flow
    fn validated<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    fn record_error(&self, err: &Error) {
        let kind = err.kind();
        let message = err.user_message();
        self.state.send_modify(|s| {
            s.last_error = Some(kind);
            s.error_message = Some(message);
        });
    }

    /// Run `flow` with `is_loading` raised and its error recorded
    async fn track<T, F>(&self, flow: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.last_error = None;
            s.error_message = None;
        });

        let result = flow.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let failure = result.as_ref().err().map(|e| (e.kind(), e.user_message()));
        self.state.send_modify(|s| {
            s.is_loading = self.in_flight.load(Ordering::SeqCst) > 0;
            if let Some((kind, message)) = failure {
                s.last_error = Some(kind);
                s.error_message = Some(message);
            }
        });

        if let Err(e) = &result {
            log::warn!("[session] {}", e);
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store.backend_name())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

fn probe(store: &dyn CredentialStore) -> bool {
    match store.has_credential() {
        Ok(present) => present,
        Err(e) => {
            log::warn!("[session] Credential probe failed: {}", e);
            false
        }
    }
}

/// Apply bus events to the state until the task is aborted
async fn listen(
    mut events: broadcast::Receiver<SessionEvent>,
    state: Arc<watch::Sender<SessionState>>,
    store: Arc<dyn CredentialStore>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let authenticated = event == SessionEvent::LoggedIn;
                state.send_if_modified(|s| {
                    let changed = s.is_authenticated != authenticated;
                    s.is_authenticated = authenticated;
                    changed
                });
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                log::warn!("[session] Missed {} event(s), re-reading store", missed);
                let authenticated = probe(store.as_ref());
                state.send_modify(|s| s.is_authenticated = authenticated);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
