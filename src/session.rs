use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::sync::Arc;

use crate::models::{AuthSession, Role};

// 1. SessionStore Contract

/// SessionStore
///
/// Defines the abstract contract for the two session storage scopes:
/// the tab-scoped demo scope (short-lived, holds only a role) and the
/// persistent scope (survives restarts, holds the authenticated session).
/// The identity resolver is the only writer; nothing else in the crate or
/// in consuming code touches storage directly, so every reader observes
/// the same state.
///
/// All operations are synchronous and infallible: a missing key reads as
/// `None`, and write failures are logged rather than surfaced, because no
/// caller can do anything useful with a broken storage substrate beyond
/// continuing without it.
pub trait SessionStore: Send + Sync {
    /// The demo role, if a demo session is active in this tab scope.
    fn read_demo_role(&self) -> Option<Role>;
    fn write_demo_role(&self, role: Role);
    fn clear_demo_role(&self);

    /// The persisted authenticated session, if any.
    fn read_persistent(&self) -> Option<AuthSession>;
    fn write_persistent(&self, session: &AuthSession);
    fn clear_persistent(&self);
}

/// SessionStoreState
///
/// The concrete type used to share the session store across the client core.
pub type SessionStoreState = Arc<dyn SessionStore>;

// 2. In-Memory Implementation (Tests and Demos)

/// MemorySessionStore
///
/// Both scopes held in memory. Used by tests and by the demo binary, where
/// process lifetime and "tab" lifetime coincide. Simulating a page reload
/// in tests means re-running cold-start resolution against the same store
/// instance.
#[derive(Default)]
pub struct MemorySessionStore {
    demo_role: Mutex<Option<Role>>,
    persistent: Mutex<Option<AuthSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read_demo_role(&self) -> Option<Role> {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_demo_role(&self, role: Role) {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner) = Some(role);
    }

    fn clear_demo_role(&self) {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn read_persistent(&self) -> Option<AuthSession> {
        self.persistent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_persistent(&self, session: &AuthSession) {
        *self.persistent.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
    }

    fn clear_persistent(&self) {
        *self.persistent.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// 3. File-Backed Implementation (Real Deployments)

/// FileSessionStore
///
/// The production store. The persistent scope is a small JSON file holding
/// the `AuthSession`; the demo scope stays in memory because its lifetime
/// is the process (the "tab"), never longer. A corrupt or unreadable
/// session file reads as absence: cold-start resolution then simply treats
/// the user as signed out instead of failing to start.
pub struct FileSessionStore {
    demo_role: Mutex<Option<Role>>,
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            demo_role: Mutex::new(None),
            path: path.into(),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn read_demo_role(&self) -> Option<Role> {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_demo_role(&self, role: Role) {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner) = Some(role);
    }

    fn clear_demo_role(&self) {
        *self.demo_role.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn read_persistent(&self) -> Option<AuthSession> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "discarding unreadable session file: {e}");
                None
            }
        }
    }

    fn write_persistent(&self, session: &AuthSession) {
        let serialized = match serde_json::to_string_pretty(session) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to serialize session: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, serialized) {
            tracing::error!(path = %self.path.display(), "failed to persist session: {e}");
        }
    }

    fn clear_persistent(&self) {
        // Missing file counts as already cleared.
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(path = %self.path.display(), "failed to clear session file: {e}");
            }
        }
    }
}
