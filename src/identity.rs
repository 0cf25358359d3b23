use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};

use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::models::{Actor, AuthResponse, AuthSession, Credentials, Role, SignUpRequest};
use crate::provider::{Credential, ProviderState};
use crate::session::SessionStoreState;

/// Claims
///
/// The standard payload structure inside a JSON Web Token. Decoded locally
/// (without signature verification) only to spot a token whose expiry has
/// plainly passed, so cold start can skip a validation round trip that is
/// guaranteed to fail. The backend remains the authority for live tokens;
/// opaque non-JWT tokens simply skip this fast path.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id the token was issued for.
    pub sub: String,
    /// Expiration time. A token past this instant is never accepted.
    pub exp: usize,
    /// Issued-at timestamp.
    #[serde(default)]
    pub iat: usize,
}

/// Returns true only when the token is a decodable JWT whose `exp` is in
/// the past. Anything else (opaque token, malformed JWT) defers to the
/// backend's verdict.
fn token_plainly_expired(token: &str) -> bool {
    match jsonwebtoken::dangerous::insecure_decode::<Claims>(token) {
        Ok(data) => (data.claims.exp as i64) < Utc::now().timestamp(),
        Err(_) => false,
    }
}

/// Identity
///
/// The resolved current actor as a tagged union, so every consumer is
/// forced to handle the signed-out state explicitly. At most one variant
/// is authoritative at any time; the role inside is immutable for the
/// lifetime of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Identity {
    /// No session of either kind.
    #[default]
    Anonymous,
    /// A real account, validated against the active provider. Carries the
    /// bearer token so the dispatcher never has to read storage.
    Authenticated { actor: Actor, token: String },
    /// A synthetic, network-free identity used for presentation. Treated
    /// identically to a real actor everywhere except that persisted writes
    /// are simulated by the calling page.
    Demo { actor: Actor },
}

impl Identity {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { actor, .. } | Identity::Demo { actor } => Some(actor),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.actor().map(|a| a.role)
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Identity::Demo { .. })
    }

    /// The credential the dispatcher attaches to outbound calls: the bearer
    /// token for real sessions, the ownership id for demo sessions, nothing
    /// for anonymous callers.
    pub fn credential(&self) -> Option<Credential> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { token, .. } => Some(Credential::Bearer(token.clone())),
            Identity::Demo { actor } => Some(Credential::Owner(actor.id.clone())),
        }
    }
}

/// AuthState
///
/// The complete state published to subscribers: the resolved identity plus
/// a loading flag that is true only between construction and the end of
/// cold-start resolution. Views render a spinner while loading instead of
/// flashing the signed-out UI.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub loading: bool,
    pub identity: Identity,
}

/// IdentityHandle
///
/// The read-only view of the resolver handed to the dispatcher and to
/// every consumer. Cloning is cheap; dropping the clone unsubscribes.
/// Together with the resolver's mutation methods this forms the complete
/// public identity surface: actor, role, is_demo, loading, and change
/// notification.
#[derive(Clone)]
pub struct IdentityHandle {
    rx: watch::Receiver<AuthState>,
}

impl IdentityHandle {
    /// The current state, re-read on every call. Guard checks and credential
    /// stamping must never cache this across navigations.
    pub fn snapshot(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    pub fn actor(&self) -> Option<Actor> {
        self.rx.borrow().identity.actor().cloned()
    }

    pub fn role(&self) -> Option<Role> {
        self.rx.borrow().identity.role()
    }

    pub fn is_demo(&self) -> bool {
        self.rx.borrow().identity.is_demo()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    pub fn credential(&self) -> Option<Credential> {
        self.rx.borrow().identity.credential()
    }

    /// subscribe
    ///
    /// A change stream for re-rendering: the receiver yields whenever the
    /// resolver publishes a new state. Dropping the receiver is the whole
    /// teardown story; there is no listener registry to unwind.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.rx.clone()
    }
}

/// IdentityResolver
///
/// The single source of truth for "who is the current actor". It owns both
/// storage scopes through the session store, publishes every change over a
/// watch channel, and serializes its own mutations so a slow sign-in
/// response can never overwrite a sign-out issued while it was in flight.
///
/// One instance exists per process, created at app start and threaded to
/// consumers explicitly; there is no ambient singleton.
pub struct IdentityResolver {
    store: SessionStoreState,
    dispatcher: Dispatcher,
    tx: watch::Sender<AuthState>,
    handle: IdentityHandle,
    /// Mutation gate. Operations queue here in arrival order, so the state
    /// after any sequence of calls is the state of the last call.
    op_gate: Mutex<()>,
}

impl IdentityResolver {
    /// Wires the resolver, its handle, and the dispatcher together around
    /// one watch channel. The initial published state is anonymous and
    /// loading; call [`init`](Self::init) to run cold-start resolution.
    pub fn new(store: SessionStoreState, provider: ProviderState) -> Self {
        let (tx, rx) = watch::channel(AuthState {
            loading: true,
            identity: Identity::Anonymous,
        });
        let handle = IdentityHandle { rx };
        let dispatcher = Dispatcher::new(provider, handle.clone());

        Self {
            store,
            dispatcher,
            tx,
            handle,
            op_gate: Mutex::new(()),
        }
    }

    /// A fresh read-only handle for consumers.
    pub fn handle(&self) -> IdentityHandle {
        self.handle.clone()
    }

    /// The dispatcher bound to this resolver's identity, for data operations.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// init
    ///
    /// Cold-start resolution, run once on app start and again to simulate a
    /// page reload. Candidate sources are evaluated in strict order, first
    /// match wins:
    ///
    /// 1. A demo role in the tab scope materializes a synthetic actor with
    ///    no provider contact. Demo deliberately overrides any persisted
    ///    real session within the same tab.
    /// 2. A persisted session is validated against the provider. An
    ///    expired or rejected token clears the persistent scope and falls
    ///    through; a transport failure leaves the stored session in place
    ///    but resolves anonymous for now, so the next reload can retry.
    /// 3. Otherwise the caller is anonymous.
    ///
    /// Never returns an error: a broken stored session degrades to the
    /// signed-out state instead of taking the app down.
    pub async fn init(&self) {
        let _gate = self.op_gate.lock().await;

        // 1. Demo scope, highest precedence.
        if let Some(role) = self.store.read_demo_role() {
            tracing::info!(%role, "restored demo session");
            self.publish(Identity::Demo {
                actor: Actor::demo(role),
            });
            return;
        }

        // 2. Persistent scope.
        if let Some(session) = self.store.read_persistent() {
            if token_plainly_expired(&session.token) {
                tracing::info!("stored token expired, clearing persistent session");
                self.store.clear_persistent();
                self.publish(Identity::Anonymous);
                return;
            }

            // Restore optimistically so the stored actor fields are already
            // available to the dispatcher's credential stamping, then let
            // the provider confirm or reject the token.
            self.tx.send_replace(AuthState {
                loading: true,
                identity: Identity::Authenticated {
                    actor: session.actor.clone(),
                    token: session.token.clone(),
                },
            });

            match self.dispatcher.get("/auth/me").await {
                Ok(Some(data)) => match serde_json::from_value::<Actor>(data) {
                    Ok(actor) => {
                        tracing::info!(id = %actor.id, role = %actor.role, "restored authenticated session");
                        self.publish(Identity::Authenticated {
                            actor,
                            token: session.token,
                        });
                    }
                    Err(e) => {
                        tracing::error!("session validation returned an unusable payload: {e}");
                        self.store.clear_persistent();
                        self.publish(Identity::Anonymous);
                    }
                },
                Ok(None) => {
                    // The provider answered but knows nothing about this
                    // token. Same treatment as an explicit rejection.
                    self.store.clear_persistent();
                    self.publish(Identity::Anonymous);
                }
                Err(ClientError::NetworkUnavailable { reason }) => {
                    tracing::warn!("backend unreachable during session restore: {reason}");
                    self.publish(Identity::Anonymous);
                }
                Err(e) => {
                    tracing::info!(kind = e.kind(), "stored session rejected, clearing");
                    self.store.clear_persistent();
                    self.publish(Identity::Anonymous);
                }
            }
            return;
        }

        // 3. Anonymous.
        self.publish(Identity::Anonymous);
    }

    /// sign_in
    ///
    /// Exchanges credentials for a session with exactly one provider call.
    /// On success the demo scope is cleared, the session is persisted, and
    /// the new actor is published. On failure nothing is written and the
    /// previously published state stands, so the login view keeps its
    /// input and the prior session (if any) survives.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<Actor, ClientError> {
        let _gate = self.op_gate.lock().await;

        let payload = json!({
            "email": credentials.normalized_email(),
            "password": credentials.password,
        });

        let data = self.dispatcher.post("/auth/login", payload).await?;
        self.adopt_session(data)
    }

    /// sign_up
    ///
    /// Registers a new account and signs it in with one provider call.
    /// A duplicate email surfaces as a rejection with the server message;
    /// as with sign_in, failure writes nothing.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Actor, ClientError> {
        let _gate = self.op_gate.lock().await;

        let payload = json!({
            "firstName": request.first_name,
            "lastName": request.last_name,
            "email": request.email.trim().to_lowercase(),
            "password": request.password,
            "role": request.role,
        });

        let data = self.dispatcher.post("/auth/signup", payload).await?;
        self.adopt_session(data)
    }

    /// enter_demo_mode
    ///
    /// Activates a synthetic identity for the given role. Always succeeds
    /// and never touches the network: the persistent scope is cleared (the
    /// two session variants are mutually exclusive), the demo role is
    /// written to the tab scope, and the actor is published immediately.
    pub async fn enter_demo_mode(&self, role: Role) -> Actor {
        let _gate = self.op_gate.lock().await;

        self.store.clear_persistent();
        self.store.write_demo_role(role);

        let actor = Actor::demo(role);
        tracing::info!(%role, "entered demo mode");
        self.publish(Identity::Demo {
            actor: actor.clone(),
        });
        actor
    }

    /// sign_out
    ///
    /// Clears both storage scopes unconditionally and publishes the
    /// anonymous state. Idempotent: signing out without a session is a
    /// no-op, not an error.
    pub async fn sign_out(&self) {
        let _gate = self.op_gate.lock().await;

        self.store.clear_demo_role();
        self.store.clear_persistent();
        tracing::info!("signed out");
        self.publish(Identity::Anonymous);
    }

    /// Common tail of sign_in and sign_up: parse the provider's auth
    /// payload, persist the session, publish the actor.
    fn adopt_session(&self, data: Option<Value>) -> Result<Actor, ClientError> {
        // Some backends answer a failed login with 200 and a null body, so
        // an empty or unusable payload counts as rejected credentials.
        let auth: AuthResponse = serde_json::from_value(data.unwrap_or(Value::Null))
            .map_err(|_| ClientError::InvalidCredentials)?;

        self.store.clear_demo_role();
        let session = AuthSession {
            token: auth.token,
            actor: auth.user,
        };
        self.store.write_persistent(&session);

        tracing::info!(id = %session.actor.id, role = %session.actor.role, "signed in");
        self.publish(Identity::Authenticated {
            actor: session.actor.clone(),
            token: session.token,
        });
        Ok(session.actor)
    }

    fn publish(&self, identity: Identity) {
        self.tx.send_replace(AuthState {
            loading: false,
            identity,
        });
    }
}
