//! Tests for the special offer page

use httpmock::prelude::*;
use prizma_miniapp::bridge::HostEvent;
use prizma_miniapp::offer::{OfferView, FALLBACK_TIME};
use prizma_miniapp::pages::{price_offer, PageOutcome, View};
use prizma_miniapp::storage::keys;
use prizma_miniapp::Page;
use serde_json::json;

use super::{user_path, Harness, USER};

fn profile_with_payment(server: &MockServer, payment: Option<&str>) {
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({
            "user": { "name": "Anna", "age": 29, "gender": "female" },
            "payment_status": payment
        }));
    });
}

#[tokio::test]
async fn test_paid_user_skips_the_offer() {
    let server = MockServer::start_async().await;
    profile_with_payment(&server, Some("completed"));
    let timer_mock = server.mock(|when, then| {
        when.method(GET).path(user_path("special-offer-timer"));
        then.status(200).json_body(json!({}));
    });
    let harness = Harness::new(&server);

    let outcome = price_offer::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Question));
    timer_mock.assert_calls(0);
}

#[tokio::test]
async fn test_pending_payment_goes_to_payment_page() {
    let server = MockServer::start_async().await;
    profile_with_payment(&server, Some("pending"));
    let harness = Harness::new(&server);

    let outcome = price_offer::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Payment));
}

#[tokio::test]
async fn test_unpaid_user_sees_timer_and_pricing() {
    let server = MockServer::start_async().await;
    profile_with_payment(&server, Some("failed"));
    server.mock(|when, then| {
        when.method(GET).path(user_path("special-offer-timer"));
        then.status(200).json_body(json!({
            "status": "success",
            "timer": { "remaining_seconds": 7200, "time_string": "02:00:00", "is_expired": false },
            "pricing": { "current_price": 1990, "original_price": 4999, "is_offer_active": true }
        }));
    });
    let harness = Harness::new(&server);

    let outcome = price_offer::load(&harness.session).await.unwrap();

    let PageOutcome::Stay(View::PriceOffer(Some(view))) = &outcome else {
        panic!("expected offer view, got {:?}", outcome);
    };
    assert_eq!(view.time, "02:00:00");
    let price = view.price.as_ref().unwrap();
    assert_eq!(price.current, "1,990р");
    assert_eq!(price.original.as_deref(), Some("4,999р"));
    assert!(harness.session.storage().flag(keys::WAS_ON_SPECIAL_OFFER));
    assert!(harness
        .session
        .storage()
        .get_i64(keys::SPECIAL_OFFER_TIMESTAMP)
        .is_some());
}

#[tokio::test]
async fn test_timer_failure_shows_fallback() {
    let server = MockServer::start_async().await;
    profile_with_payment(&server, None);
    server.mock(|when, then| {
        when.method(GET).path(user_path("special-offer-timer"));
        then.status(500).body("boom");
    });
    let harness = Harness::new(&server);

    let outcome = price_offer::load(&harness.session).await.unwrap();

    assert_eq!(
        outcome,
        PageOutcome::Stay(View::PriceOffer(Some(OfferView::fallback())))
    );
    assert_eq!(OfferView::fallback().time, FALLBACK_TIME);
}

#[tokio::test]
async fn test_free_download_opens_attachment_link() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({
            "status": "success",
            "free_report_status": { "status": "ready" }
        }));
    });
    let mut harness = Harness::new(&server);

    let outcome = price_offer::download_free_report(&harness.session)
        .await
        .unwrap();

    assert_eq!(outcome, PageOutcome::Unchanged);
    let events = harness.drain();
    let link = events
        .iter()
        .find_map(|event| match event {
            HostEvent::OpenLink { url } => Some(url.clone()),
            _ => None,
        })
        .expect("download link opened");
    assert!(link.contains(&format!("/api/download/report/{}?download=1&source=telegram&t=", USER)));
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::OpenPopup { message, .. } if message == price_offer::DOWNLOAD_STARTED
    )));
}

#[tokio::test]
async fn test_ready_free_available_report_opens_download() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({
            "status": "success",
            "available_report": { "status": "ready", "type": "free" }
        }));
    });
    let mut harness = Harness::new(&server);

    price_offer::download_free_report(&harness.session)
        .await
        .unwrap();

    let events = harness.drain();
    assert!(events
        .iter()
        .any(|event| matches!(event, HostEvent::OpenLink { .. })));
}

#[tokio::test]
async fn test_ready_premium_report_blocks_free_download() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({
            "status": "success",
            "available_report": { "status": "ready", "type": "premium" },
            "free_report_status": { "status": "ready" }
        }));
    });
    let mut harness = Harness::new(&server);

    let outcome = price_offer::download_free_report(&harness.session)
        .await
        .unwrap();

    assert_eq!(outcome, PageOutcome::Unchanged);
    let events = harness.drain();
    assert!(!events
        .iter()
        .any(|event| matches!(event, HostEvent::OpenLink { .. })));
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::OpenPopup { message, .. } if message == price_offer::PREMIUM_ONLY
    )));
}

#[tokio::test]
async fn test_free_download_not_ready_alerts() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({
            "status": "success",
            "free_report_status": { "status": "processing" }
        }));
    });
    let mut harness = Harness::new(&server);

    price_offer::download_free_report(&harness.session)
        .await
        .unwrap();

    assert_eq!(harness.alerts(), vec![price_offer::REPORT_NOT_READY.to_string()]);
}
