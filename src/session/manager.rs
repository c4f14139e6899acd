use crate::config::Credentials;
use crate::session::interface::Authenticator;
use crate::session::session::Session;
use crate::session::status::SessionStatus;
use crate::storage::session_store::SessionStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    /// Bumped every time the session is replaced or dropped.
    generation: u64,
    last_keepalive: Option<DateTime<Utc>>,
}

/// Owns the live session for the serving process.
///
/// Reads take a snapshot; replacements happen under `refresh_lock` so that
/// overlapping refreshes from request handlers and the keepalive task
/// collapse into one.
pub struct SessionManager {
    store: SessionStore,
    authenticator: Arc<dyn Authenticator>,
    credentials: Option<Credentials>,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
    needs_manual_refresh: AtomicBool,
}

impl SessionManager {
    pub fn new(
        store: SessionStore,
        authenticator: Arc<dyn Authenticator>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            store,
            authenticator,
            credentials,
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
            needs_manual_refresh: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    /// Current session and its generation, or `None` when nothing is loaded.
    pub async fn snapshot(&self) -> Option<(Session, u64)> {
        let state = self.state.read().await;
        state
            .session
            .as_ref()
            .map(|session| (session.clone(), state.generation))
    }

    pub async fn status(&self) -> SessionStatus {
        let needs_manual_refresh = self.needs_manual_refresh.load(Ordering::SeqCst);
        let state = self.state.read().await;
        match &state.session {
            Some(session) => SessionStatus {
                logged_in: true,
                username: Some(session.username().to_string()),
                has_sessionid: session.has_sessionid(),
                updated_at: Some(session.updated_at()),
                needs_manual_refresh,
                last_keepalive: state.last_keepalive,
            },
            None => SessionStatus::logged_out(needs_manual_refresh),
        }
    }

    /// Loads the active stored session, falling back to a credential login.
    /// Returns whether a session is loaded afterwards.
    #[instrument(skip(self))]
    pub async fn load(&self) -> bool {
        if self.is_loaded().await {
            return true;
        }
        let _guard = self.refresh_lock.lock().await;

        match self.store.load_active() {
            Ok(Some(session)) => {
                let username = session.username().to_string();
                let usable = session.has_sessionid();
                self.install(session).await;
                if !usable {
                    warn!("sessionid cookie empty, trying credential login");
                    if !self.try_login().await {
                        warn!(
                            "Credential login failed. Import a browser sessionid cookie for {}",
                            username
                        );
                    }
                }
                info!("Session loaded for user: {}", username);
                self.state.write().await.last_keepalive = Some(Utc::now());
                true
            }
            Ok(None) => {
                if self.try_login().await {
                    return true;
                }
                warn!("No session files found in {}", self.store.dir().display());
                false
            }
            Err(e) => {
                error!("Session load failed: {:#}", e);
                false
            }
        }
    }

    /// Persists `session`, makes it the active one and swaps it in.
    pub async fn activate(&self, session: Session) -> anyhow::Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.store.save(&session)?;
        self.store.set_active(session.username())?;
        self.needs_manual_refresh.store(false, Ordering::SeqCst);
        self.install(session).await;
        Ok(())
    }

    /// Re-authenticates after the upstream rejected the session seen at
    /// `seen_generation`. Returns whether a usable session is loaded.
    ///
    /// If another caller already replaced that session, no refresh is made.
    #[instrument(skip(self))]
    pub async fn refresh(&self, seen_generation: u64) -> bool {
        let _guard = self.refresh_lock.lock().await;
        {
            let state = self.state.read().await;
            if state.generation != seen_generation && state.session.is_some() {
                debug!("Session already refreshed by a concurrent caller");
                return true;
            }
        }

        info!("Session expired, attempting refresh");
        if self.try_login().await {
            return true;
        }

        match self.store.load_active() {
            Ok(Some(session)) => {
                self.install(session).await;
                info!("Session reloaded from file");
                return true;
            }
            Ok(None) => debug!("No stored session to reload"),
            Err(e) => warn!("Session reload failed: {:#}", e),
        }

        // The rejected session stays readable until every refresh route has failed.
        self.unload().await;
        self.needs_manual_refresh.store(true, Ordering::SeqCst);
        false
    }

    /// Merges `Set-Cookie` values from a response sent under the session at
    /// `generation`. Cookies from a replaced session are dropped.
    pub async fn absorb_cookies(&self, generation: u64, set_cookies: &[String]) {
        if set_cookies.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("Ignoring cookies from a replaced session");
            return;
        }
        if let Some(session) = state.session.as_mut() {
            session.absorb_set_cookies(set_cookies.iter().map(String::as_str));
        }
    }

    pub async fn record_keepalive(&self) {
        self.needs_manual_refresh.store(false, Ordering::SeqCst);
        self.state.write().await.last_keepalive = Some(Utc::now());
    }

    /// Credential login with the configured credentials. Callers hold `refresh_lock`.
    async fn try_login(&self) -> bool {
        let Some(credentials) = self.credentials.as_ref() else {
            return false;
        };
        match self.authenticator.login(credentials).await {
            Ok(session) => {
                if let Err(e) = self
                    .store
                    .save(&session)
                    .and_then(|_| self.store.set_active(session.username()))
                {
                    warn!("Logged in but failed to persist session: {:#}", e);
                }
                self.needs_manual_refresh.store(false, Ordering::SeqCst);
                self.install(session).await;
                self.state.write().await.last_keepalive = Some(Utc::now());
                info!("Auto-login successful, session saved");
                true
            }
            Err(e) => {
                if e.needs_manual_intervention() {
                    self.needs_manual_refresh.store(true, Ordering::SeqCst);
                }
                error!("Auto-login failed: {}", e);
                false
            }
        }
    }

    async fn install(&self, session: Session) {
        let mut state = self.state.write().await;
        state.session = Some(session);
        state.generation += 1;
    }

    async fn unload(&self) {
        let mut state = self.state.write().await;
        if state.session.take().is_some() {
            state.generation += 1;
        }
    }
}
