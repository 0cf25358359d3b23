use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;
use crate::identity::IdentityHandle;
use crate::provider::{HttpMethod, ProviderState, RequestEnvelope};

/// Dispatcher
///
/// The normalized request/response boundary between consumers and the
/// active backend provider. It turns a (method, path, body) triple into a
/// `Result<Option<Value>, ClientError>` and stamps every envelope with the
/// current actor's credential.
///
/// The credential is sourced exclusively from the identity resolver's
/// published state, never from the session store, so there is exactly one
/// place identity can diverge from. The dispatcher performs no retries and
/// fabricates no data: pages running under an active demo session are
/// expected to check `is_demo` and simulate persisted writes locally
/// instead of calling here.
#[derive(Clone)]
pub struct Dispatcher {
    provider: ProviderState,
    identity: IdentityHandle,
}

impl Dispatcher {
    pub fn new(provider: ProviderState, identity: IdentityHandle) -> Self {
        Self { provider, identity }
    }

    pub async fn get(&self, path: &str) -> Result<Option<Value>, ClientError> {
        self.send(HttpMethod::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Option<Value>, ClientError> {
        self.send(HttpMethod::Post, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Option<Value>, ClientError> {
        self.send(HttpMethod::Put, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, ClientError> {
        self.send(HttpMethod::Delete, path, None).await
    }

    /// get_as
    ///
    /// Typed read: fetches and deserializes into `T`. A shape mismatch is
    /// reported as a rejection carrying the decode failure, since the
    /// backend did answer but not with anything the page can use.
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::decode(self.get(path).await?)
    }

    /// Typed create: posts `body` and deserializes the echoed resource.
    pub async fn post_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ClientError> {
        Self::decode(self.post(path, body).await?)
    }

    /// Typed update: puts `body` and deserializes the updated resource.
    pub async fn put_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ClientError> {
        Self::decode(self.put(path, body).await?)
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ClientError> {
        let credential = self.identity.credential();

        tracing::debug!(?method, path, "dispatching request");

        let result = self
            .provider
            .execute(RequestEnvelope {
                method,
                path: path.to_string(),
                body,
                credential,
            })
            .await;

        if let Err(e) = &result {
            tracing::debug!(path, kind = e.kind(), "request failed: {e}");
        }
        result
    }

    fn decode<T: DeserializeOwned>(data: Option<Value>) -> Result<T, ClientError> {
        serde_json::from_value(data.unwrap_or(Value::Null)).map_err(|e| {
            ClientError::RequestRejected {
                status: 200,
                message: format!("unexpected response shape: {e}"),
            }
        })
    }
}
