use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::{ClientConfig, ProviderKind};
use crate::error::ClientError;
use crate::models::{Actor, Role};

// --- Request Envelope ---

/// HttpMethod
///
/// The four verbs the dispatcher emits. Kept as a crate-local enum rather
/// than a transport type so the in-memory provider stays free of HTTP
/// machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Credential
///
/// The identity annotation the dispatcher attaches to every outbound call.
/// Authenticated sessions carry a bearer token; demo sessions carry the
/// synthetic actor's ownership id (sent as an `x-user-id` header by the
/// REST provider, matching its development bypass convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Owner(String),
}

/// RequestEnvelope
///
/// One outbound operation: method, resource path, optional JSON body, and
/// the credential resolved at dispatch time. Paths follow the flat
/// `/resource` and `/resource/{id}` convention; each provider translates
/// them into its own native addressing internally.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub credential: Option<Credential>,
}

// --- DataProvider Contract ---

/// DataProvider
///
/// Defines the abstract contract for all backend communication. This trait
/// allows the three divergent backends (REST API, hosted table store, and
/// the in-memory fake) to be swapped without affecting the dispatcher or
/// the identity resolver: every implementation maps its native wire format
/// (JSON body, empty 204, transport exception, or provider-specific error
/// object) onto the same normalized result.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn DataProvider>`) safely shareable across task boundaries.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Performs one operation. `Ok(None)` means the backend succeeded with
    /// no payload (HTTP 204 or an empty body); it is never an error.
    async fn execute(&self, envelope: RequestEnvelope) -> Result<Option<Value>, ClientError>;
}

/// ProviderState
///
/// The concrete type used to share the active provider across the client core.
pub type ProviderState = Arc<dyn DataProvider>;

/// from_config
///
/// Provider factory: constructs the implementation selected by the loaded
/// configuration. The rest of the core depends only on the trait object
/// this returns.
pub fn from_config(config: &ClientConfig) -> ProviderState {
    match config.provider {
        ProviderKind::Rest => Arc::new(RestProvider::new(config.api_base.clone())),
        ProviderKind::Table => Arc::new(TableProvider::new(
            config.api_base.clone(),
            config.anon_key.clone(),
        )),
        ProviderKind::Memory => Arc::new(MemoryProvider::new()),
    }
}

// --- Shared HTTP Normalization ---

/// Maps one HTTP response onto the normalized result shape shared by the
/// two network providers. Success with an empty or `null` body becomes
/// `Ok(None)`; a failure body is mined for a server-supplied message
/// before falling back to a generic one.
async fn normalize_response(
    response: reqwest::Response,
    auth_endpoint: bool,
) -> Result<Option<Value>, ClientError> {
    let status = response.status();
    let text = response.text().await.map_err(ClientError::from)?;

    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(None);
        }
        return match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A 2xx with garbage in the body is treated as an empty
                // success rather than a hard failure; the anomaly is logged.
                tracing::warn!(status = status.as_u16(), "unparseable success body: {e}");
                Ok(None)
            }
        };
    }

    // The auth endpoints reserve 401 for rejected credentials.
    if auth_endpoint && status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::InvalidCredentials);
    }

    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description"]
                .into_iter()
                .find_map(|key| v.get(key).and_then(Value::as_str).map(String::from))
        })
        .unwrap_or_else(|| format!("Backend error: {}", status.as_u16()));

    Err(ClientError::RequestRejected {
        status: status.as_u16(),
        message,
    })
}

fn is_auth_path(path: &str) -> bool {
    // Only the auth namespace itself; a resource like `/authors` is data.
    path.starts_with("/auth/")
}

// --- REST Provider ---

/// RestProvider
///
/// Talks to the custom REST API. Paths pass through unchanged on top of
/// the configured base origin; bodies are JSON; authenticated calls carry
/// `Authorization: Bearer <token>`. Demo ownership ids travel in the
/// `x-user-id` header, the same header the backend accepts for its local
/// development bypass.
#[derive(Clone)]
pub struct RestProvider {
    client: reqwest::Client,
    base_url: String,
}

impl RestProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DataProvider for RestProvider {
    async fn execute(&self, envelope: RequestEnvelope) -> Result<Option<Value>, ClientError> {
        let url = format!("{}{}", self.base_url, envelope.path);

        let mut request = match envelope.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        if let Some(body) = &envelope.body {
            request = request.json(body);
        }

        match &envelope.credential {
            Some(Credential::Bearer(token)) => request = request.bearer_auth(token),
            Some(Credential::Owner(id)) => request = request.header("x-user-id", id),
            None => {}
        }

        let response = request.send().await.map_err(ClientError::from)?;
        normalize_response(response, is_auth_path(&envelope.path)).await
    }
}

// --- Table Provider (Hosted BaaS) ---

/// TableProvider
///
/// Talks to the hosted backend-as-a-service. The flat envelope paths are
/// translated into table operations under `/rest/v1/{table}` with
/// PostgREST-style `id=eq.{id}` filters, and the auth endpoints map onto
/// the provider's `/auth/v1` surface. Every request carries the anonymous
/// `apikey` header; authenticated requests add the bearer token. This
/// translation is entirely internal: callers see the same flat paths and
/// normalized results as with the REST provider.
#[derive(Clone)]
pub struct TableProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl TableProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Reshapes the hosted provider's auth payloads (`access_token`, `user`
    /// with a metadata object) into the normalized `{token, user}` shape
    /// the identity resolver consumes.
    fn map_auth_payload(value: &Value, include_token: bool) -> Value {
        let user = value.get("user").unwrap_or(value);
        let metadata = user.get("user_metadata").cloned().unwrap_or(Value::Null);

        let role = metadata
            .get("role")
            .and_then(Value::as_str)
            .and_then(|s| Role::from_str(s).ok())
            .unwrap_or_default();

        let actor = json!({
            "id": user.get("id").and_then(Value::as_str).unwrap_or_default(),
            "role": role,
            "email": user.get("email").cloned().unwrap_or(Value::Null),
            "firstName": metadata.get("first_name").cloned().unwrap_or(Value::Null),
            "lastName": metadata.get("last_name").cloned().unwrap_or(Value::Null),
        });

        if include_token {
            json!({
                "token": value.get("access_token").and_then(Value::as_str).unwrap_or_default(),
                "user": actor,
            })
        } else {
            actor
        }
    }
}

#[async_trait]
impl DataProvider for TableProvider {
    async fn execute(&self, envelope: RequestEnvelope) -> Result<Option<Value>, ClientError> {
        let auth_endpoint = is_auth_path(&envelope.path);

        // Path translation. Auth endpoints map onto the provider's auth
        // surface; everything else is a table operation.
        let (method, url, id_filter) = match (envelope.method, envelope.path.as_str()) {
            (HttpMethod::Post, "/auth/login") => (
                HttpMethod::Post,
                format!("{}/auth/v1/token?grant_type=password", self.base_url),
                false,
            ),
            (HttpMethod::Post, "/auth/signup") => (
                HttpMethod::Post,
                format!("{}/auth/v1/signup", self.base_url),
                false,
            ),
            (HttpMethod::Get, "/auth/me") => {
                (HttpMethod::Get, format!("{}/auth/v1/user", self.base_url), false)
            }
            (method, path) => {
                let trimmed = path.trim_start_matches('/');
                match trimmed.split_once('/') {
                    Some((table, id)) => (
                        method,
                        format!("{}/rest/v1/{table}?id=eq.{id}", self.base_url),
                        true,
                    ),
                    None => (method, format!("{}/rest/v1/{trimmed}", self.base_url), false),
                }
            }
        };

        let mut request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            // PostgREST mutates filtered rows via PATCH.
            HttpMethod::Put => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        request = request.header("apikey", &self.anon_key);
        if let Some(Credential::Bearer(token)) = &envelope.credential {
            request = request.bearer_auth(token);
        }
        if !auth_endpoint && matches!(method, HttpMethod::Post | HttpMethod::Put) {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(body) = &envelope.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ClientError::from)?;
        let data = normalize_response(response, auth_endpoint).await?;

        if auth_endpoint {
            let include_token = envelope.path != "/auth/me";
            return Ok(data.map(|v| Self::map_auth_payload(&v, include_token)));
        }

        // Table reads and writes come back as arrays; unwrap them when the
        // caller addressed a single row.
        match data {
            Some(Value::Array(mut items)) if id_filter || envelope.method == HttpMethod::Post => {
                if items.is_empty() {
                    if envelope.method == HttpMethod::Get {
                        return Err(ClientError::RequestRejected {
                            status: 404,
                            message: "Resource not found".to_string(),
                        });
                    }
                    return Ok(None);
                }
                Ok(Some(items.remove(0)))
            }
            other => Ok(other),
        }
    }
}

// --- In-Memory Provider (Demo and Tests) ---

struct MemoryUser {
    email: String,
    password: String,
    actor: Actor,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<MemoryUser>,
    /// Issued bearer tokens, mapped to the owning account's email.
    tokens: HashMap<String, String>,
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
}

/// MemoryProvider
///
/// An in-memory implementation of `DataProvider` used for demo sessions and
/// for tests. It keeps every collection as a JSON array, assigns sequential
/// ids, and implements the auth endpoints against seeded accounts, so the
/// full sign-in / validate / sign-out cycle works without any network.
#[derive(Default)]
pub struct MemoryProvider {
    state: Mutex<MemoryState>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    /// Seeds one sign-in-capable account. Builder-style for test setup.
    pub fn with_user(
        self,
        email: impl Into<String>,
        password: impl Into<String>,
        actor: Actor,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.users.push(MemoryUser {
                email: email.into().trim().to_lowercase(),
                password: password.into(),
                actor,
            });
        }
        self
    }

    /// Seeds a resource collection with pre-built rows.
    pub fn seed(&self, resource: impl Into<String>, rows: Vec<Value>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.collections.insert(resource.into(), rows);
    }

    fn not_found() -> ClientError {
        ClientError::RequestRejected {
            status: 404,
            message: "Resource not found".to_string(),
        }
    }

    fn row_matches(row: &Value, id: &str) -> bool {
        match row.get("id") {
            Some(Value::Number(n)) => n.to_string() == id,
            Some(Value::String(s)) => s == id,
            _ => false,
        }
    }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn execute(&self, envelope: RequestEnvelope) -> Result<Option<Value>, ClientError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Auth surface.
        match (envelope.method, envelope.path.as_str()) {
            (HttpMethod::Post, "/auth/login") => {
                let body = envelope.body.unwrap_or(Value::Null);
                let email = body
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase();
                let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

                let user = state
                    .users
                    .iter()
                    .find(|u| u.email == email && u.password == password)
                    .ok_or(ClientError::InvalidCredentials)?;

                let actor = user.actor.clone();
                let token = Uuid::new_v4().to_string();
                state.tokens.insert(token.clone(), email);

                return Ok(Some(json!({
                    "token": token,
                    "user": serde_json::to_value(&actor).unwrap_or(Value::Null),
                })));
            }
            (HttpMethod::Post, "/auth/signup") => {
                let body = envelope.body.unwrap_or(Value::Null);
                let email = body
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase();
                if email.is_empty() {
                    return Err(ClientError::RequestRejected {
                        status: 400,
                        message: "Email is required".to_string(),
                    });
                }
                if state.users.iter().any(|u| u.email == email) {
                    return Err(ClientError::RequestRejected {
                        status: 400,
                        message: "User already exists with this email".to_string(),
                    });
                }

                let id = state.next_id;
                state.next_id += 1;

                let actor = Actor {
                    id: id.to_string(),
                    role: body
                        .get("role")
                        .and_then(Value::as_str)
                        .and_then(|s| Role::from_str(s).ok())
                        .unwrap_or_default(),
                    first_name: body
                        .get("firstName")
                        .and_then(Value::as_str)
                        .map(String::from),
                    last_name: body
                        .get("lastName")
                        .and_then(Value::as_str)
                        .map(String::from),
                    email: Some(email.clone()),
                    ..Actor::default()
                };

                let password = body
                    .get("password")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                state.users.push(MemoryUser {
                    email: email.clone(),
                    password,
                    actor: actor.clone(),
                });

                let token = Uuid::new_v4().to_string();
                state.tokens.insert(token.clone(), email);

                return Ok(Some(json!({
                    "token": token,
                    "user": serde_json::to_value(&actor).unwrap_or(Value::Null),
                })));
            }
            (HttpMethod::Get, "/auth/me") => {
                let email = match &envelope.credential {
                    Some(Credential::Bearer(token)) => {
                        state.tokens.get(token).cloned().ok_or(ClientError::InvalidCredentials)?
                    }
                    _ => return Err(ClientError::InvalidCredentials),
                };
                let actor = state
                    .users
                    .iter()
                    .find(|u| u.email == email)
                    .map(|u| u.actor.clone())
                    .ok_or(ClientError::InvalidCredentials)?;
                return Ok(Some(serde_json::to_value(actor).unwrap_or(Value::Null)));
            }
            _ => {}
        }

        // Collection surface: /resource and /resource/{id}.
        let trimmed = envelope.path.trim_start_matches('/');
        let (resource, id) = match trimmed.split_once('/') {
            Some((resource, id)) => (resource.to_string(), Some(id.to_string())),
            None => (trimmed.to_string(), None),
        };

        match (envelope.method, id) {
            (HttpMethod::Get, None) => {
                let rows = state.collections.get(&resource).cloned().unwrap_or_default();
                Ok(Some(Value::Array(rows)))
            }
            (HttpMethod::Get, Some(id)) => state
                .collections
                .get(&resource)
                .and_then(|rows| rows.iter().find(|r| Self::row_matches(r, &id)))
                .cloned()
                .map(Some)
                .ok_or_else(Self::not_found),
            (HttpMethod::Post, None) => {
                let mut row = envelope.body.unwrap_or_else(|| json!({}));
                let id = state.next_id;
                state.next_id += 1;
                if let Some(map) = row.as_object_mut() {
                    map.insert("id".to_string(), json!(id));
                }
                state
                    .collections
                    .entry(resource)
                    .or_default()
                    .push(row.clone());
                Ok(Some(row))
            }
            (HttpMethod::Put, Some(id)) => {
                let patch = envelope.body.unwrap_or_else(|| json!({}));
                let rows = state.collections.get_mut(&resource).ok_or_else(Self::not_found)?;
                let row = rows
                    .iter_mut()
                    .find(|r| Self::row_matches(r, &id))
                    .ok_or_else(Self::not_found)?;
                if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                    for (key, value) in fields {
                        if key != "id" {
                            target.insert(key.clone(), value.clone());
                        }
                    }
                }
                Ok(Some(row.clone()))
            }
            (HttpMethod::Delete, Some(id)) => {
                let rows = state.collections.get_mut(&resource).ok_or_else(Self::not_found)?;
                let before = rows.len();
                rows.retain(|r| !Self::row_matches(r, &id));
                if rows.len() == before {
                    return Err(Self::not_found());
                }
                // Deletions answer with no payload, like an HTTP 204.
                Ok(None)
            }
            _ => Err(ClientError::RequestRejected {
                status: 405,
                message: "Unsupported operation".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_auth_path;

    #[test]
    fn auth_classification_requires_the_auth_namespace() {
        assert!(is_auth_path("/auth/login"));
        assert!(is_auth_path("/auth/me"));
        assert!(!is_auth_path("/authors"));
        assert!(!is_auth_path("/authors/3"));
        assert!(!is_auth_path("/skills"));
    }
}
