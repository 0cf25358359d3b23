use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use skillport_client::models::Skill;
use skillport_client::provider::{Credential, HttpMethod, RequestEnvelope};
use skillport_client::{
    Actor, ClientError, Credentials, DataProvider, IdentityResolver, MemoryProvider,
    MemorySessionStore, ProviderState, Role,
};
use uuid::Uuid;

/// A provider that records every envelope it receives and answers with a
/// canned response, for asserting what the dispatcher actually sends.
struct RecordingProvider {
    seen: Mutex<Vec<RequestEnvelope>>,
    response: Value,
}

impl RecordingProvider {
    fn new(response: Value) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            response,
        })
    }

    fn envelopes(&self) -> Vec<RequestEnvelope> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DataProvider for RecordingProvider {
    async fn execute(&self, envelope: RequestEnvelope) -> Result<Option<Value>, ClientError> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope);
        Ok(Some(self.response.clone()))
    }
}

fn seeded_memory() -> Arc<MemoryProvider> {
    let provider = Arc::new(MemoryProvider::new().with_user(
        "alex@uni.edu",
        "password123",
        Actor {
            id: "7".to_string(),
            role: Role::Student,
            ..Actor::default()
        },
    ));
    provider.seed(
        "skills",
        vec![
            json!({"id": 1, "name": "Rust", "level": "Advanced"}),
            json!({"id": 2, "name": "SQL", "level": "Intermediate"}),
        ],
    );
    provider
}

async fn resolver_over(provider: ProviderState) -> IdentityResolver {
    let resolver = IdentityResolver::new(Arc::new(MemorySessionStore::new()), provider);
    resolver.init().await;
    resolver
}

// --- Response Normalization ---

#[tokio::test]
async fn delete_normalizes_an_empty_body_to_ok_none() {
    let resolver = resolver_over(seeded_memory()).await;
    let dispatcher = resolver.dispatcher();

    // A deletion answers with no payload (the HTTP 204 case); that is a
    // success, never a parse failure.
    let result = dispatcher.delete("/skills/1").await;
    assert_eq!(result.unwrap(), None);

    let remaining: Vec<Skill> = dispatcher.get_as("/skills").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "SQL");
}

#[tokio::test]
async fn rejection_carries_the_server_supplied_message() {
    let resolver = resolver_over(seeded_memory()).await;

    let err = resolver.dispatcher().get("/skills/99").await.unwrap_err();
    assert_eq!(
        err,
        ClientError::RequestRejected {
            status: 404,
            message: "Resource not found".to_string(),
        }
    );
}

#[tokio::test]
async fn typed_reads_deserialize_and_shape_mismatches_surface_as_rejections() {
    let resolver = resolver_over(seeded_memory()).await;
    let dispatcher = resolver.dispatcher();

    let skills: Vec<Skill> = dispatcher.get_as("/skills").await.unwrap();
    assert_eq!(skills[0].name, "Rust");
    assert_eq!(skills[0].level, "Advanced");

    // A list endpoint does not deserialize into a single resource.
    let mismatch = dispatcher.get_as::<Skill>("/skills").await;
    assert!(matches!(
        mismatch,
        Err(ClientError::RequestRejected { .. })
    ));
}

#[tokio::test]
async fn create_assigns_an_id_and_echoes_the_resource() {
    let resolver = resolver_over(seeded_memory()).await;

    let created: Skill = resolver
        .dispatcher()
        .post_as("/skills", json!({"name": "Kotlin", "level": "Beginner"}))
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.name, "Kotlin");
}

#[tokio::test]
async fn typed_update_merges_fields_and_echoes_the_row() {
    let resolver = resolver_over(seeded_memory()).await;
    let dispatcher = resolver.dispatcher();

    let updated: Skill = dispatcher
        .put_as("/skills/2", json!({"level": "Advanced"}))
        .await
        .unwrap();

    // Untouched fields survive the update; the change is durable.
    assert_eq!(updated.id, 2);
    assert_eq!(updated.name, "SQL");
    assert_eq!(updated.level, "Advanced");

    let reread: Skill = dispatcher.get_as("/skills/2").await.unwrap();
    assert_eq!(reread.level, "Advanced");
}

// --- Credential Stamping ---

#[tokio::test]
async fn anonymous_requests_carry_no_credential() {
    let recording = RecordingProvider::new(json!([]));
    let resolver = resolver_over(recording.clone()).await;

    resolver.dispatcher().get("/jobs").await.unwrap();

    let envelopes = recording.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].method, HttpMethod::Get);
    assert_eq!(envelopes[0].credential, None);
}

#[tokio::test]
async fn authenticated_requests_carry_the_bearer_token() {
    let recording = RecordingProvider::new(json!({
        "token": "issued-token",
        "user": {"id": "7", "role": "student"},
    }));
    let resolver = resolver_over(recording.clone()).await;
    resolver
        .sign_in(Credentials::new("alex@uni.edu", "password123"))
        .await
        .unwrap();

    resolver.dispatcher().get("/applications").await.unwrap();

    let envelopes = recording.envelopes();
    let last = envelopes.last().unwrap();
    assert_eq!(last.path, "/applications");
    assert_eq!(
        last.credential,
        Some(Credential::Bearer("issued-token".to_string()))
    );

    // The login call itself went out without a credential.
    assert_eq!(envelopes[0].path, "/auth/login");
    assert_eq!(envelopes[0].credential, None);
}

#[tokio::test]
async fn demo_requests_carry_the_ownership_id() {
    let recording = RecordingProvider::new(json!([]));
    let resolver = resolver_over(recording.clone()).await;
    resolver.enter_demo_mode(Role::Recruiter).await;

    resolver.dispatcher().get("/jobs").await.unwrap();

    let envelopes = recording.envelopes();
    assert_eq!(
        envelopes[0].credential,
        Some(Credential::Owner(Uuid::nil().to_string()))
    );
}

#[tokio::test]
async fn login_email_is_normalized_before_transmission() {
    let recording = RecordingProvider::new(json!({
        "token": "issued-token",
        "user": {"id": "7", "role": "student"},
    }));
    let resolver = resolver_over(recording.clone()).await;

    resolver
        .sign_in(Credentials::new("  Alex@Uni.EDU ", "password123"))
        .await
        .unwrap();

    let body = recording.envelopes()[0].body.clone().unwrap();
    assert_eq!(body["email"], json!("alex@uni.edu"));
}
