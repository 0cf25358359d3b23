use std::sync::Arc;

// --- Module Structure ---

// Core client services and components.
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod provider;
pub mod session;

// --- Public Re-exports ---

// Makes the core types easily accessible to consuming applications and to
// the demo binary without deep module paths.
pub use config::{ClientConfig, Env, ProviderKind};
pub use dispatch::Dispatcher;
pub use error::ClientError;
pub use guard::{GuardDecision, RouteGuard, RoutePolicy};
pub use identity::{AuthState, Identity, IdentityHandle, IdentityResolver};
pub use models::{Actor, AuthSession, Credentials, Role, SignUpRequest};
pub use provider::{DataProvider, MemoryProvider, ProviderState, RestProvider, TableProvider};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreState};

/// Client
///
/// The unified client state: one immutable configuration plus the single
/// process-wide identity resolver, bundled so consuming code receives its
/// dependencies explicitly instead of reaching for ambient globals. The
/// resolver in turn owns the dispatcher and the session store, so this is
/// the only value an application needs to thread around.
#[derive(Clone)]
pub struct Client {
    pub config: ClientConfig,
    pub resolver: Arc<IdentityResolver>,
}

impl Client {
    /// init
    ///
    /// Assembles the core around the given store and provider and runs
    /// cold-start session resolution once, so the returned client already
    /// knows who the current actor is (or that there is none). This is the
    /// defined start of the resolver's lifecycle; teardown is dropping the
    /// client and every subscribed handle.
    pub async fn init(
        config: ClientConfig,
        store: SessionStoreState,
        provider: ProviderState,
    ) -> Self {
        let resolver = Arc::new(IdentityResolver::new(store, provider));
        resolver.init().await;

        Self { config, resolver }
    }

    /// Assembles the client from configuration alone: file-backed session
    /// store and the provider the configuration selects.
    pub async fn from_config(config: ClientConfig) -> Self {
        let store: SessionStoreState = Arc::new(FileSessionStore::new(&config.session_file));
        let provider = provider::from_config(&config);
        Self::init(config, store, provider).await
    }

    /// A read-only identity handle for views and guards.
    pub fn identity(&self) -> IdentityHandle {
        self.resolver.handle()
    }

    /// The dispatcher bound to the resolver's identity, for data operations.
    pub fn dispatcher(&self) -> Dispatcher {
        self.resolver.dispatcher()
    }

    /// A route guard over the live identity for the given policy.
    pub fn guard(&self, policy: RoutePolicy) -> RouteGuard {
        RouteGuard::new(self.identity(), policy)
    }
}
