use std::env;
use std::path::PathBuf;

/// Env
///
/// Defines the runtime context, used to switch between forgiving local
/// defaults and the fail-fast requirements of a real deployment.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// ProviderKind
///
/// Selects which of the three interchangeable backend providers the client
/// talks to. The rest of the core never branches on this value; it only
/// feeds the provider factory at startup.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProviderKind {
    /// The custom REST API (flat `/resource` paths, bearer auth).
    Rest,
    /// The hosted backend-as-a-service (table-oriented translation).
    Table,
    /// The in-memory provider (demo sessions and tests, no network).
    Memory,
}

/// ClientConfig
///
/// Holds the client core's entire configuration state, immutable once
/// loaded. It is read exactly once at startup and shared by reference;
/// nothing re-reads the environment afterwards.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base origin of the active backend, e.g. `http://localhost:8082/api`.
    pub api_base: String,
    /// Which provider implementation to construct at startup.
    pub provider: ProviderKind,
    /// Anonymous API key for the table-oriented hosted provider. Unused by
    /// the other providers.
    pub anon_key: String,
    /// Location of the persistent session file (the longer-lived storage
    /// scope). The tab-scoped demo scope is always in-memory.
    pub session_file: PathBuf,
    /// Runtime environment marker.
    pub env: Env,
}

impl Default for ClientConfig {
    /// Safe, non-panicking configuration for test setup and local demos.
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8082/api".to_string(),
            provider: ProviderKind::Rest,
            anon_key: String::new(),
            session_file: PathBuf::from(".skillport-session.json"),
            env: Env::Local,
        }
    }
}

impl ClientConfig {
    /// load
    ///
    /// The canonical function for initializing configuration at startup. It
    /// reads all parameters from environment variables and fails fast: a
    /// missing critical variable in Production aborts startup rather than
    /// letting the client run against a half-configured backend.
    ///
    /// # Panics
    /// Panics if `SKILLPORT_API_URL` is unset in Production, or if the
    /// table provider is selected in Production without `SKILLPORT_ANON_KEY`.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let runtime_env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let provider = match env::var("SKILLPORT_PROVIDER").as_deref() {
            Ok("table") => ProviderKind::Table,
            Ok("memory") => ProviderKind::Memory,
            // "rest" and anything unrecognized fall back to the REST API.
            _ => ProviderKind::Rest,
        };

        let api_base = match runtime_env {
            Env::Production => env::var("SKILLPORT_API_URL")
                .expect("FATAL: SKILLPORT_API_URL must be set in production."),
            Env::Local => env::var("SKILLPORT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8082/api".to_string()),
        };

        let anon_key = match (&runtime_env, provider) {
            (Env::Production, ProviderKind::Table) => env::var("SKILLPORT_ANON_KEY")
                .expect("FATAL: SKILLPORT_ANON_KEY must be set for the table provider."),
            _ => env::var("SKILLPORT_ANON_KEY").unwrap_or_default(),
        };

        let session_file = env::var("SKILLPORT_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".skillport-session.json"));

        Self {
            api_base,
            provider,
            anon_key,
            session_file,
            env: runtime_env,
        }
    }
}
