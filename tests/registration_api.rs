mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use doorlist_api::token;

#[tokio::test]
async fn register_returns_receipt_with_decodable_token() -> Result<()> {
    let t = common::test_app(10).await;

    let (status, body) = common::post_json(
        &t.app,
        "/register",
        &json!({
            "event_id": t.event.id,
            "tenant_slug": t.tenant.slug,
            "email": "alice@example.com",
            "name": "Alice",
            "phone": "+1-555-0100",
        }),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["registration_number"], json!(1));
    assert_eq!(body["data"]["status"], json!("registered"));

    let claims = token::decode(body["data"]["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.tenant_id, t.tenant.id);
    assert_eq!(claims.event_id, t.event.id);
    Ok(())
}

#[tokio::test]
async fn capacity_exhaustion_returns_409_capacity_full() -> Result<()> {
    let t = common::test_app(1).await;

    common::register(&t.app, &t.tenant, &t.event, "first@example.com").await?;

    let (status, body) = common::post_json(
        &t.app,
        "/register",
        &json!({
            "event_id": t.event.id,
            "tenant_slug": t.tenant.slug,
            "email": "second@example.com",
            "name": "Second",
        }),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("CAPACITY_FULL"));
    Ok(())
}

#[tokio::test]
async fn full_event_with_waitlist_returns_waitlisted_receipt() -> Result<()> {
    let t = common::tenant("acme");
    let mut e = common::published_event(t.id, 1);
    e.waitlist_enabled = true;

    let store = std::sync::Arc::new(doorlist_api::store::MemoryStore::new());
    store.seed_tenant(t.clone()).await;
    store.seed_event(e.clone()).await;
    let app = doorlist_api::app::router(doorlist_api::app::AppState::new(store.clone()));

    common::register(&app, &t, &e, "first@example.com").await?;

    let (status, body) = common::post_json(
        &app,
        "/register",
        &json!({
            "event_id": e.id,
            "tenant_slug": t.slug,
            "email": "second@example.com",
            "name": "Second",
        }),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], json!("waitlisted"));
    assert_eq!(body["data"]["registration_number"], json!(1));

    use doorlist_api::store::RegistrationStore;
    let stored = store.event_by_id(e.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 1);
    assert_eq!(stored.waitlist_count, 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_returns_409_already_registered() -> Result<()> {
    let t = common::test_app(10).await;

    common::register(&t.app, &t.tenant, &t.event, "alice@example.com").await?;

    let (status, body) = common::post_json(
        &t.app,
        "/register",
        &json!({
            "event_id": t.event.id,
            "tenant_slug": t.tenant.slug,
            "email": "Alice@Example.COM",
            "name": "Alice Again",
        }),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("ALREADY_REGISTERED"));
    Ok(())
}

#[tokio::test]
async fn registration_window_maps_to_410_codes() -> Result<()> {
    let tn = common::tenant("acme");

    let mut not_open = common::published_event(tn.id, 10);
    not_open.registration_opens_at = Some(Utc::now() + Duration::hours(2));
    let mut closed = common::published_event(tn.id, 10);
    closed.registration_closes_at = Some(Utc::now() - Duration::hours(2));

    let store = std::sync::Arc::new(doorlist_api::store::MemoryStore::new());
    store.seed_tenant(tn.clone()).await;
    store.seed_event(not_open.clone()).await;
    store.seed_event(closed.clone()).await;
    let app = doorlist_api::app::router(doorlist_api::app::AppState::new(store));

    let (status, body) = common::post_json(
        &app,
        "/register",
        &json!({
            "event_id": not_open.id,
            "tenant_slug": tn.slug,
            "email": "a@example.com",
            "name": "A",
        }),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], json!("REGISTRATION_NOT_OPEN"));

    let (status, body) = common::post_json(
        &app,
        "/register",
        &json!({
            "event_id": closed.id,
            "tenant_slug": tn.slug,
            "email": "a@example.com",
            "name": "A",
        }),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], json!("REGISTRATION_CLOSED"));
    Ok(())
}

#[tokio::test]
async fn unknown_tenant_slug_returns_404() -> Result<()> {
    let t = common::test_app(10).await;

    let (status, body) = common::post_json(
        &t.app,
        "/register",
        &json!({
            "event_id": t.event.id,
            "tenant_slug": "not-a-tenant",
            "email": "a@example.com",
            "name": "A",
        }),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn invalid_body_is_rejected_without_touching_counters() -> Result<()> {
    let t = common::test_app(10).await;

    let (status, _) = common::post_json(
        &t.app,
        "/register",
        &json!({
            "event_id": t.event.id,
            "tenant_slug": t.tenant.slug,
            "email": "not-an-email",
            "name": "A",
        }),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    use doorlist_api::store::RegistrationStore;
    let stored = t.store.event_by_id(t.event.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_count, 0);
    Ok(())
}

#[tokio::test]
async fn health_endpoint_reports_ok() -> Result<()> {
    let t = common::test_app(1).await;
    let (status, body) = common::get_json(&t.app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));
    Ok(())
}
