#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use doorlist_api::app::{router, AppState};
use doorlist_api::auth::{issue_token, Claims};
use doorlist_api::store::models::{
    CheckInState, Event, EventStatus, Participant, Tenant, TenantStatus,
};
use doorlist_api::store::MemoryStore;

/// In-process app over the in-memory store, seeded with one active tenant
/// and one published event.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub tenant: Tenant,
    pub event: Event,
}

pub fn tenant(slug: &str) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: format!("{} inc", slug),
        status: TenantStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn published_event(tenant_id: Uuid, capacity: i64) -> Event {
    let now = Utc::now();
    Event {
        id: Uuid::new_v4(),
        tenant_id,
        name: "annual summit".into(),
        status: EventStatus::Published,
        capacity,
        registered_count: 0,
        checked_in_count: 0,
        waitlist_count: 0,
        waitlist_enabled: false,
        registration_opens_at: None,
        registration_closes_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn registered_participant(tenant_id: Uuid, event_id: Uuid, email: &str) -> Participant {
    let now = Utc::now();
    Participant {
        id: Uuid::new_v4(),
        tenant_id,
        event_id,
        email: email.to_string(),
        name: "Seeded".into(),
        phone: None,
        registration_number: 1,
        waitlisted: false,
        check_in_state: CheckInState::Registered,
        checked_in_at: None,
        checked_in_by: None,
        created_at: now,
    }
}

pub async fn test_app(capacity: i64) -> TestApp {
    let t = tenant("acme");
    let e = published_event(t.id, capacity);

    let store = Arc::new(MemoryStore::new());
    store.seed_tenant(t.clone()).await;
    store.seed_event(e.clone()).await;

    TestApp {
        app: router(AppState::new(store.clone())),
        store,
        tenant: t,
        event: e,
    }
}

/// Signed staff JWT for the given tenant, using the process dev secret.
pub fn staff_token(tenant_id: Uuid) -> String {
    issue_token(&Claims::new(tenant_id, "staff-test".into())).expect("issue staff token")
}

/// Fire one request at the in-process router and decode the JSON body.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &Value,
    bearer: Option<&str>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(serde_json::to_vec(body)?))?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

pub async fn get_json(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

/// Register a participant through the public endpoint, returning the
/// participant id and issued QR token.
pub async fn register(app: &Router, t: &Tenant, e: &Event, email: &str) -> Result<(Uuid, String)> {
    let (status, body) = post_json(
        app,
        "/register",
        &serde_json::json!({
            "event_id": e.id,
            "tenant_slug": t.slug,
            "email": email,
            "name": "Test Person",
        }),
        None,
    )
    .await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "registration failed: {} {}",
        status,
        body
    );

    let participant_id = body["data"]["participant_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("missing participant_id in {}", body))?;
    let token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing token in {}", body))?
        .to_string();
    Ok((participant_id, token))
}
