// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across the gateway, the local backend and sync.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a temp
//! avatar directory. Geocoding providers are stood in for by wiremock.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::watch;
use tower::ServiceExt;
use waypin_config::model::GeocodeConfig;
use waypin_core::{StorageAdapter, WaypinError};
use waypin_gateway::{GatewayState, router};
use waypin_geocode::GeocodeGateway;
use waypin_test_utils::TestHarness;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, mut ready: F)
where
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|v| ready(v)))
        .await
        .expect("timed out waiting for sync state")
        .expect("sync state sender dropped");
}

/// Primary answers 503, secondary answers with one Photon feature.
async fn degraded_providers() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-8.6291, 41.1579]},
                "properties": {"name": "Porto", "country": "Portugal"}
            }]
        })))
        .mount(&server)
        .await;
    server
}

fn geocode_config(server: &MockServer) -> GeocodeConfig {
    GeocodeConfig {
        primary_url: format!("{}/search", server.uri()),
        secondary_url: format!("{}/api/", server.uri()),
        user_agent: "waypin-test/1.0".to_string(),
        timeout_secs: 2,
        ..Default::default()
    }
}

// ---- Geocoding through the HTTP surface ----

#[tokio::test]
async fn http_geocode_normalizes_the_fallback_answer() {
    let server = degraded_providers().await;
    let gateway = GeocodeGateway::from_config(&geocode_config(&server)).unwrap();

    let response = router(GatewayState::new(gateway))
        .oneshot(
            Request::builder()
                .uri("/geocode?q=Porto")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        serde_json::json!([
            {"display_name": "Porto, Portugal", "lat": "41.1579", "lon": "-8.6291"}
        ])
    );
}

// ---- Add-pin flow: geocode, create profile, watchers see it ----

#[tokio::test]
async fn resolved_place_becomes_a_pin_for_other_members() {
    let server = degraded_providers().await;
    let gateway = GeocodeGateway::from_config(&geocode_config(&server)).unwrap();
    let harness = TestHarness::new().await.unwrap();

    let ana = harness.signed_in("ana@example.com").await.unwrap();
    let bob = harness.signed_in("bob@example.com").await.unwrap();
    let bob_view = harness.manager(bob.clone());
    bob_view.start().await.unwrap();
    assert!(bob_view.directory().is_empty());

    let place = gateway.resolve("Porto").await.unwrap().remove(0);
    let mut pins = bob_view.watch_directory();
    harness
        .add_profile(&ana, "ana", &place.label, place.latitude, place.longitude)
        .await
        .unwrap();

    wait_until(&mut pins, |pins| pins.len() == 1).await;
    let pin = &bob_view.directory()[0];
    assert_eq!(pin.name, "ana");
    assert_eq!(pin.latitude, 41.1579);
    assert_eq!(pin.longitude, -8.6291);
    bob_view.shutdown().await;
}

// ---- Messaging: unread badge and inbox ----

#[tokio::test]
async fn message_raises_badge_and_opening_inbox_clears_it() {
    let harness = TestHarness::new().await.unwrap();
    let ana = harness.signed_in("ana@example.com").await.unwrap();
    let bob = harness.signed_in("bob@example.com").await.unwrap();
    harness
        .add_profile(&bob, "bob", "Porto", 41.1579, -8.6291)
        .await
        .unwrap();

    let ana_view = harness.manager(ana.clone());
    ana_view.start().await.unwrap();
    ana_view.sync_session().await.unwrap();
    assert_eq!(ana_view.unread_count(), 0);

    let ana_id = ana.current_user_id().await.unwrap();
    let mut unread = ana_view.watch_unread();
    bob.send_message(&ana_id, "coffee on friday?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    bob.send_message(&ana_id, "or saturday").await.unwrap();
    wait_until(&mut unread, |n| *n == 2).await;

    let inbox = ana_view.open_inbox().await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].message.content, "or saturday");
    assert!(inbox.iter().all(|entry| entry.message.read));
    assert_eq!(inbox[0].sender.as_ref().unwrap().username, "bob");
    assert_eq!(ana_view.unread_count(), 0);
    assert_eq!(ana.load_unread_count(&ana_id).await, 0);
}

#[tokio::test]
async fn anonymous_send_is_rejected_without_a_write() {
    let harness = TestHarness::new().await.unwrap();
    let ana = harness.signed_in("ana@example.com").await.unwrap();
    let ana_id = ana.current_user_id().await.unwrap();

    let anonymous = harness.client();
    let err = anonymous.send_message(&ana_id, "hi").await.unwrap_err();
    assert!(matches!(err, WaypinError::Unauthenticated));
    assert!(
        harness
            .storage
            .get_messages_for_receiver(&ana_id)
            .await
            .unwrap()
            .is_empty()
    );
}

// ---- Session changes re-key the inbox ----

#[tokio::test]
async fn signing_out_stops_counting() {
    let harness = TestHarness::new().await.unwrap();
    let ana = harness.signed_in("ana@example.com").await.unwrap();
    let bob = harness.signed_in("bob@example.com").await.unwrap();
    let ana_id = ana.current_user_id().await.unwrap();

    let ana_view = harness.manager(ana.clone());
    ana_view.sync_session().await.unwrap();
    let subscribers = harness.bus.subscriber_count();

    ana.sign_out().await.unwrap();
    ana_view.sync_session().await.unwrap();
    assert_eq!(harness.bus.subscriber_count(), subscribers - 1);

    bob.send_message(&ana_id, "are you there?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ana_view.unread_count(), 0);
}
