//! Tests for the page driver

use httpmock::prelude::*;
use prizma_miniapp::bridge::HostEvent;
use prizma_miniapp::pages::View;
use prizma_miniapp::{App, Error, Landing, Page};
use serde_json::json;

use super::{user_path, Harness};

#[tokio::test]
async fn test_start_param_redirects_before_the_first_page() {
    let server = MockServer::start_async().await;
    let status_mock = server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({ "status": "success" }));
    });
    let mut harness = Harness::with_start_param(&server, Some("payment_failed_77"));
    let mut app = App::new(harness.session.clone());

    let landing = app.start(Page::Index).await.unwrap();

    assert_eq!(
        landing,
        Landing::Shown {
            page: Page::UncompletePayment,
            view: View::Static
        }
    );
    status_mock.assert_calls(0);

    let events = harness.drain();
    assert_eq!(events[0], HostEvent::Ready);
    assert_eq!(events[1], HostEvent::Expand);
    assert!(events.contains(&HostEvent::SetupMainButton {
        is_visible: true,
        is_active: true,
        text: Some("Try again".into()),
    }));
}

#[tokio::test]
async fn test_redirect_cycle_is_cut_off() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200)
            .json_body(json!({ "status": "test_not_completed" }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("progress"));
        then.status(200)
            .json_body(json!({ "progress": { "answered": 5, "total": 15 } }));
    });
    // A started questionnaire with an incomplete profile bounces between
    // the question and login pages.
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({ "user": { "name": "" } }));
    });
    let harness = Harness::new(&server);
    let mut app = App::new(harness.session.clone()).with_max_redirects(6);

    let err = app.open(Page::Index).await.unwrap_err();

    assert!(matches!(err, Error::RedirectLoop(6)));
}

#[tokio::test]
async fn test_main_button_walks_to_price() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({ "user": { "name": "Anna" } }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("progress"));
        then.status(200)
            .json_body(json!({ "progress": { "answered": 0, "total": 15 } }));
    });
    let harness = Harness::new(&server);
    let mut app = App::new(harness.session.clone());

    app.open(Page::Steps).await.unwrap();
    let landing = app.press_main().await.unwrap();

    assert_eq!(
        landing,
        Landing::Shown {
            page: Page::Price,
            view: View::Price {
                premium_label: "Try"
            }
        }
    );

    let back = app.press_back().await.unwrap();
    assert_eq!(back.page(), Some(Page::Steps));
}

#[tokio::test]
async fn test_offer_close_button_closes_app() {
    let server = MockServer::start_async().await;
    let mut harness = Harness::new(&server);
    let mut app = App::new(harness.session.clone());

    app.open(Page::Answers).await.unwrap();
    assert_eq!(
        app.press_main().await.unwrap(),
        Landing::Unchanged {
            page: Page::Answers
        }
    );

    // Load failures on the offer page still render it.
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(503);
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("special-offer-timer"));
        then.status(503);
    });
    app.open(Page::PriceOffer).await.unwrap();
    harness.drain();

    assert_eq!(app.press_main().await.unwrap(), Landing::Closed);
    assert_eq!(harness.drain(), vec![HostEvent::Close]);
}

#[tokio::test]
async fn test_free_report_ready_lands_on_offer() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(json!({
            "status": "success",
            "available_report": { "status": "ready", "type": "free" }
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({ "user": { "name": "Anna" } }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("special-offer-timer"));
        then.status(200).json_body(json!({
            "status": "success",
            "timer": { "remaining_seconds": 60, "time_string": "00:01:00", "is_expired": false }
        }));
    });
    let harness = Harness::new(&server);
    let mut app = App::new(harness.session.clone());

    let landing = app.open(Page::Index).await.unwrap();

    assert_eq!(landing.page(), Some(Page::PriceOffer));
    assert_eq!(app.current(), Some(Page::PriceOffer));
}
