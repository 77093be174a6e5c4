use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::models::Claims;

/// A point-in-time view of the authentication session, handed to listeners
/// and returned by the getters.
///
/// Invariant: `user` and `access_token` are present together or absent
/// together, and `is_authenticated` is true iff both are present and the
/// token's expiry was in the future when it was last validated.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub user: Option<Claims>,
    pub access_token: Option<String>,
    pub is_authenticated: bool,
    /// Becomes true exactly once, after the first restore attempt completes.
    pub initialized: bool,
}

/// Callback invoked with the snapshot after a notifying transition.
pub type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Holds the session snapshot and its subscribers. All mutation goes through
/// `apply`, which decides whether listeners hear about the transition: only
/// flips of `is_authenticated` and the one-time `initialized` flip are
/// delivered, not every mutation, so a token swap during refresh stays quiet.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    snapshot: SessionSnapshot,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot.clone()
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn subscribe(&self, listener: Listener) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.lock()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }

    /// Replace the session with a freshly validated token and its claims.
    pub fn set_session(&self, access_token: String, claims: Claims) {
        self.apply(|snapshot| {
            snapshot.user = Some(claims);
            snapshot.access_token = Some(access_token);
            snapshot.is_authenticated = true;
        });
    }

    /// Drop the session. `user` and `access_token` are cleared together.
    pub fn clear_session(&self) {
        self.apply(|snapshot| {
            snapshot.user = None;
            snapshot.access_token = None;
            snapshot.is_authenticated = false;
        });
    }

    /// Record the outcome of a startup restore attempt. `initialized` flips
    /// at most once for the lifetime of the store, and listeners hear about
    /// that flip even when the restore came back empty.
    pub fn complete_init(&self, restored: Option<(String, Claims)>) {
        self.apply(|snapshot| {
            match restored {
                Some((access_token, claims)) => {
                    snapshot.user = Some(claims);
                    snapshot.access_token = Some(access_token);
                    snapshot.is_authenticated = true;
                }
                None => {
                    snapshot.user = None;
                    snapshot.access_token = None;
                    snapshot.is_authenticated = false;
                }
            }
            snapshot.initialized = true;
        });
    }

    fn apply(&self, mutate: impl FnOnce(&mut SessionSnapshot)) {
        let (to_notify, snapshot) = {
            let mut inner = self.lock();
            let was_authenticated = inner.snapshot.is_authenticated;
            let was_initialized = inner.snapshot.initialized;
            mutate(&mut inner.snapshot);

            let notify = inner.snapshot.is_authenticated != was_authenticated
                || inner.snapshot.initialized != was_initialized;
            if !notify {
                return;
            }
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (listeners, inner.snapshot.clone())
        };

        debug!(
            authenticated = snapshot.is_authenticated,
            initialized = snapshot.initialized,
            "session state transition"
        );
        // Listeners run outside the lock so they can call back into getters.
        for listener in to_notify {
            listener(&snapshot);
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("session store lock poisoned")
    }
}
