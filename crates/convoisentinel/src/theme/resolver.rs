//! The process-wide theme preference state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{resolve, AppearanceSource, ColorScheme, ThemePreference};
use crate::storage::{KeyValueStore, THEME_KEY};

/// Snapshot of the resolver's read surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeState {
    /// The user's choice.
    pub preference: ThemePreference,
    /// The scheme currently applied.
    pub scheme: ColorScheme,
    /// Whether the stored preference has been loaded.
    pub ready: bool,
}

/// Owns the theme preference, its persistence and the effective scheme.
///
/// Lifecycle: construct, call [`init`](Self::init) once at startup, and
/// [`shutdown`](Self::shutdown) (or drop) at teardown. While the preference
/// is [`ThemePreference::System`] a background task follows the host
/// appearance; it is stopped as soon as the preference changes away.
///
/// [`set_preference`](Self::set_preference) and `init` spawn tokio tasks and
/// must run inside a tokio runtime.
#[derive(Debug)]
pub struct ThemeResolver<S: ?Sized> {
    kv: Arc<S>,
    key: String,
    appearance: Arc<dyn AppearanceSource>,
    state: Arc<watch::Sender<ThemeState>>,
    follower: Mutex<Option<JoinHandle<()>>>,
    persist_lock: Arc<AsyncMutex<()>>,
    initialized: AtomicBool,
    changed_by_user: AtomicBool,
    shut_down: AtomicBool,
}

impl<S: KeyValueStore + ?Sized + 'static> ThemeResolver<S> {
    /// Create a resolver in its initial state: preference `system`, not ready.
    ///
    /// Inside a tokio runtime the host appearance is followed from here on,
    /// before [`init`](Self::init) runs.
    #[must_use]
    pub fn new(kv: Arc<S>, appearance: Arc<dyn AppearanceSource>) -> Self {
        let initial = ThemeState {
            preference: ThemePreference::System,
            scheme: appearance.current(),
            ready: false,
        };
        let (tx, _rx) = watch::channel(initial);

        let resolver = Self {
            kv,
            key: THEME_KEY.to_string(),
            appearance,
            state: Arc::new(tx),
            follower: Mutex::new(None),
            persist_lock: Arc::new(AsyncMutex::new(())),
            initialized: AtomicBool::new(false),
            changed_by_user: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            resolver.start_follower();
        }
        resolver
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Load the stored preference and mark the resolver ready.
    ///
    /// Anything other than exactly `light`, `dark` or `system` (including a
    /// missing key or a read error) resolves to `system`. Only the first call
    /// does anything. If the user already picked a preference while the load
    /// was in flight, that choice wins.
    pub async fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            trace!("Theme resolver already initialized");
            return;
        }

        let stored = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw.parse::<ThemePreference>().unwrap_or_else(|e| {
                warn!("Ignoring stored theme preference: {}", e);
                ThemePreference::System
            }),
            Ok(None) => ThemePreference::System,
            Err(e) => {
                warn!("Failed to read theme preference: {}", e);
                ThemePreference::System
            }
        };

        if self.changed_by_user.load(Ordering::SeqCst) {
            debug!("Preference set during startup, not applying stored {}", stored);
        } else {
            self.apply(stored);
        }
        self.state.send_modify(|s| s.ready = true);

        let state = self.state();
        info!(
            "Theme ready: preference={} scheme={}",
            state.preference, state.scheme
        );
    }

    /// Switch to `preference` immediately and persist it in the background.
    ///
    /// The in-memory state changes before this returns. A failed write is
    /// logged and otherwise ignored; the returned handle completes once the
    /// write has been attempted.
    pub fn set_preference(&self, preference: ThemePreference) -> JoinHandle<()> {
        self.changed_by_user.store(true, Ordering::SeqCst);
        self.apply(preference);

        let kv = Arc::clone(&self.kv);
        let key = self.key.clone();
        let state = Arc::clone(&self.state);
        let persist_lock = Arc::clone(&self.persist_lock);

        tokio::spawn(async move {
            let _guard = persist_lock.lock().await;
            // Write whatever is current so overlapping calls settle on the latest.
            let latest = state.borrow().preference;
            match kv.set(&key, latest.as_str()).await {
                Ok(()) => debug!("Persisted theme preference {}", latest),
                Err(e) => warn!("Failed to persist theme preference {}: {}", latest, e),
            }
        })
    }

    /// Current snapshot of `{preference, scheme, ready}`.
    ///
    /// Until [`shutdown`](Self::shutdown), a `system` preference reports the
    /// host appearance as of this call, even if the follower task has not
    /// caught up yet.
    #[must_use]
    pub fn state(&self) -> ThemeState {
        if !self.shut_down.load(Ordering::SeqCst) {
            follow_host(&self.state, self.appearance.current());
        }
        *self.state.borrow()
    }

    /// The user's preference.
    #[must_use]
    pub fn preference(&self) -> ThemePreference {
        self.state.borrow().preference
    }

    /// The effective scheme.
    #[must_use]
    pub fn scheme(&self) -> ColorScheme {
        self.state().scheme
    }

    /// Whether [`init`](Self::init) has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Receive every change of the theme state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.state.subscribe()
    }

    /// Whether the host appearance is currently being followed.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.follower
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop following the host appearance. The scheme is frozen from here on.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        if self.stop_follower() {
            info!("Theme resolver shut down");
        }
    }

    fn apply(&self, preference: ThemePreference) {
        let host = self.appearance.current();
        self.state.send_if_modified(|s| {
            let scheme = resolve(preference, host);
            let modified = s.preference != preference || s.scheme != scheme;
            s.preference = preference;
            s.scheme = scheme;
            modified
        });

        if preference == ThemePreference::System {
            self.start_follower();
        } else {
            self.stop_follower();
        }
    }

    fn start_follower(&self) {
        let mut follower = self.follower.lock().unwrap_or_else(PoisonError::into_inner);
        if follower.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let mut rx = self.appearance.subscribe();
        let host = *rx.borrow_and_update();
        follow_host(&self.state, host);

        let state = Arc::clone(&self.state);
        *follower = Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let host = *rx.borrow_and_update();
                follow_host(&state, host);
            }
            trace!("Host appearance source closed");
        }));
        debug!("Following host appearance");
    }

    fn stop_follower(&self) -> bool {
        let handle = self
            .follower
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                handle.abort();
                debug!("Stopped following host appearance");
                true
            }
            None => false,
        }
    }
}

/// Apply a host appearance change if the preference still follows the host.
fn follow_host(state: &watch::Sender<ThemeState>, host: ColorScheme) {
    let changed = state.send_if_modified(|s| {
        if s.preference == ThemePreference::System && s.scheme != host {
            s.scheme = host;
            true
        } else {
            false
        }
    });
    if changed {
        debug!("Host appearance is now {}", host);
    }
}

impl<S: ?Sized> Drop for ThemeResolver<S> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .follower
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
