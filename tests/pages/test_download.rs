//! Tests for the download page

use httpmock::prelude::*;
use prizma_miniapp::bridge::HostEvent;
use prizma_miniapp::models::ReportTier;
use prizma_miniapp::pages::{download, PageOutcome, View};
use prizma_miniapp::Page;
use serde_json::json;

use super::{user_path, Harness, USER};

fn reports_status(server: &MockServer, body: serde_json::Value) {
    server.mock(|when, then| {
        when.method(GET).path(user_path("reports-status"));
        then.status(200).json_body(body);
    });
}

#[tokio::test]
async fn test_premium_ready_stays_on_download() {
    let server = MockServer::start_async().await;
    reports_status(
        &server,
        json!({
            "status": "success",
            "available_report": {
                "status": "ready",
                "type": "premium",
                "report_path": "/reports/premium_31.pdf"
            }
        }),
    );
    let harness = Harness::new(&server);

    let outcome = download::load(&harness.session).await.unwrap();

    assert_eq!(
        outcome,
        PageOutcome::Stay(View::Download {
            premium_ready: true
        })
    );
}

#[tokio::test]
async fn test_free_report_only_goes_to_offer() {
    let server = MockServer::start_async().await;
    reports_status(
        &server,
        json!({
            "status": "success",
            "free_report_status": { "status": "ready" },
            "premium_report_status": { "status": "not_started" }
        }),
    );
    let harness = Harness::new(&server);

    let outcome = download::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::PriceOffer));
}

#[tokio::test]
async fn test_nothing_ready_goes_to_loading() {
    let server = MockServer::start_async().await;
    reports_status(&server, json!({ "status": "success" }));
    let harness = Harness::new(&server);

    let outcome = download::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Loading));
}

#[tokio::test]
async fn test_premium_download_announces_file_name() {
    let server = MockServer::start_async().await;
    let mut harness = Harness::new(&server);

    let outcome = download::download_report(&harness.session, ReportTier::Premium)
        .await
        .unwrap();

    assert_eq!(outcome, PageOutcome::Unchanged);
    let events = harness.drain();
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::OpenPopup { message, .. }
            if message.contains(&format!("prizma-premium-report-{}.pdf", USER))
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::OpenLink { url }
            if url.contains(&format!("/api/download/premium-report/{}?download=1", USER))
    )));
}
