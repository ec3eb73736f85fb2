//! Tests for the questionnaire page

use httpmock::prelude::*;
use prizma_miniapp::pages::{question, PageOutcome, View};
use prizma_miniapp::storage::keys;
use prizma_miniapp::Page;
use serde_json::json;

use super::{user_path, Harness};

fn complete_profile(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({
            "status": "success",
            "user": { "name": "Anna", "age": 29, "gender": "female" }
        }));
    });
}

#[tokio::test]
async fn test_incomplete_profile_goes_to_login() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(user_path("profile"));
        then.status(200).json_body(json!({ "user": { "name": "Anna" } }));
    });
    let question_mock = server.mock(|when, then| {
        when.method(GET).path(user_path("current-question"));
        then.status(200).json_body(json!({}));
    });
    let harness = Harness::new(&server);

    let outcome = question::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Login));
    question_mock.assert_calls(0);
}

#[tokio::test]
async fn test_welcome_is_shown_once() {
    let server = MockServer::start_async().await;
    complete_profile(&server);
    server.mock(|when, then| {
        when.method(GET).path(user_path("current-question"));
        then.status(200).json_body(json!({
            "question": { "id": 7, "text": "What drains your energy?" },
            "progress": { "current": 3, "total": 15, "answered": 2 }
        }));
    });
    let harness = Harness::new(&server);

    let first = question::load(&harness.session).await.unwrap();
    let PageOutcome::Stay(View::Question(view)) = &first else {
        panic!("expected question view, got {:?}", first);
    };
    assert!(view.show_welcome);
    assert_eq!(view.id, 7);
    assert_eq!((view.current, view.total), (3, 15));
    assert!(harness.session.storage().flag(keys::WELCOME_SEEN));

    let second = question::load(&harness.session).await.unwrap();
    let PageOutcome::Stay(View::Question(view)) = &second else {
        panic!("expected question view, got {:?}", second);
    };
    assert!(!view.show_welcome);
}

#[tokio::test]
async fn test_completed_questionnaire_goes_to_loading() {
    let server = MockServer::start_async().await;
    complete_profile(&server);
    server.mock(|when, then| {
        when.method(GET).path(user_path("current-question"));
        then.status(400)
            .json_body(json!({ "detail": "Test already completed" }));
    });
    let harness = Harness::new(&server);

    let outcome = question::load(&harness.session).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Loading));
}

#[tokio::test]
async fn test_short_answer_is_rejected_locally() {
    let server = MockServer::start_async().await;
    let answer_mock = server.mock(|when, then| {
        when.method(POST).path(user_path("answer"));
        then.status(200).json_body(json!({ "status": "success" }));
    });
    let mut harness = Harness::new(&server);

    let empty = question::submit_answer(&harness.session, "   ").await.unwrap();
    let short = question::submit_answer(&harness.session, "too short").await.unwrap();

    assert_eq!(empty, PageOutcome::Unchanged);
    assert_eq!(short, PageOutcome::Unchanged);
    let alerts = harness.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0], question::EMPTY_ANSWER);
    assert!(alerts[1].contains("350"));
    answer_mock.assert_calls(0);
}

#[tokio::test]
async fn test_answer_reaching_free_limit_goes_to_loading() {
    let server = MockServer::start_async().await;
    let answer_mock = server.mock(|when, then| {
        when.method(POST)
            .path(user_path("answer"))
            .json_body(json!({ "text_answer": "a".repeat(400), "answer_type": "text" }));
        then.status(200).json_body(json!({ "status": "success" }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("progress"));
        then.status(200).json_body(json!({
            "user": { "is_paid": false },
            "progress": { "answered": 10, "total": 15, "free_questions_limit": 10 }
        }));
    });
    let harness = Harness::new(&server);

    let answer = "a".repeat(400);
    let outcome = question::submit_answer(&harness.session, &answer).await.unwrap();

    assert_eq!(outcome, PageOutcome::Redirect(Page::Loading));
    answer_mock.assert_calls(1);
}

#[tokio::test]
async fn test_answer_below_limit_reloads_question() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path(user_path("answer"));
        then.status(200).json_body(json!({ "status": "success" }));
    });
    server.mock(|when, then| {
        when.method(GET).path(user_path("progress"));
        then.status(200).json_body(json!({
            "user": { "is_paid": true },
            "progress": { "answered": 10, "total": 15, "free_questions_limit": 10 }
        }));
    });
    let harness = Harness::new(&server);

    let answer = "b".repeat(350);
    let outcome = question::submit_answer(&harness.session, &answer).await.unwrap();

    assert_eq!(outcome, PageOutcome::Reload);
}
