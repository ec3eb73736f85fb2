//! REST client for the PRIZMA backend.
//!
//! One method per endpoint. Every call fails on a non-2xx status and returns
//! the parsed JSON body; there is no caching or retry at this layer.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::metrics;
use crate::models::{
    ActionResponse, AnswerRequest, AnswerResponse, CurrentQuestion, PaymentLink, ProfileResponse,
    ProgressResponse, ReportTier, ReportsStatus, TimerResponse, UserProfile,
};
use crate::{Error, Result};

/// Header carrying the raw Telegram `initData` string.
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// Backend API client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    init_data: Option<String>,
}

impl BackendClient {
    /// Create client against a custom base URL (including the `/api` prefix).
    pub fn with_url(base_url: &str) -> Result<Self> {
        Self::build(base_url, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(&config.api_base_url, config.api_timeout())
    }

    fn build(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            init_data: None,
        })
    }

    /// Attach the signed launch data to every request.
    pub fn with_init_data(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        self.init_data = (!raw.is_empty()).then_some(raw);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response> {
        let request = match &self.init_data {
            Some(raw) => request.header(INIT_DATA_HEADER, raw),
            None => request,
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                metrics::record_api_request(endpoint, "network");
                warn!(endpoint, "Backend request failed: {}", err);
                return Err(err.into());
            }
        };

        let status = response.status();
        metrics::record_api_request(endpoint, status.as_str());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "Backend returned an error status");
            return Err(Error::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(endpoint, status = status.as_u16(), "Backend call succeeded");
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, path: &str) -> Result<T> {
        let response = self.send(endpoint, self.http.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, endpoint: &'static str, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(self.url(path));
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        let response = self.send(endpoint, request).await?;
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------------
    // Profile & progress
    // ------------------------------------------------------------------------

    pub async fn get_profile(&self, user_id: i64) -> Result<ProfileResponse> {
        self.get_json("profile", &format!("/user/{}/profile", user_id))
            .await
    }

    pub async fn save_profile(&self, user_id: i64, profile: &UserProfile) -> Result<ActionResponse> {
        self.post_json("save_profile", &format!("/user/{}/profile", user_id), Some(profile))
            .await
    }

    pub async fn get_progress(&self, user_id: i64) -> Result<ProgressResponse> {
        self.get_json("progress", &format!("/user/{}/progress", user_id))
            .await
    }

    // ------------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------------

    pub async fn get_current_question(&self, user_id: i64) -> Result<CurrentQuestion> {
        self.get_json(
            "current_question",
            &format!("/user/{}/current-question", user_id),
        )
        .await
    }

    pub async fn submit_answer(&self, user_id: i64, answer: &str) -> Result<AnswerResponse> {
        let body = AnswerRequest::text(answer);
        self.post_json("answer", &format!("/user/{}/answer", user_id), Some(&body))
            .await
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    pub async fn generate_report(&self, user_id: i64) -> Result<ActionResponse> {
        self.post_json::<(), _>(
            "generate_report",
            &format!("/user/{}/generate-report", user_id),
            None,
        )
        .await
    }

    pub async fn generate_premium_report(&self, user_id: i64) -> Result<ActionResponse> {
        self.post_json::<(), _>(
            "generate_premium_report",
            &format!("/user/{}/generate-premium-report", user_id),
            None,
        )
        .await
    }

    pub async fn reports_status(&self, user_id: i64) -> Result<ReportsStatus> {
        self.get_json("reports_status", &format!("/user/{}/reports-status", user_id))
            .await
    }

    pub async fn stop_report_generation(&self, user_id: i64) -> Result<ActionResponse> {
        self.post_json::<(), _>(
            "stop_report_generation",
            &format!("/user/{}/stop-report-generation", user_id),
            None,
        )
        .await
    }

    pub async fn reset_test(&self, user_id: i64) -> Result<ActionResponse> {
        self.post_json::<(), _>("reset_test", &format!("/user/{}/reset-test", user_id), None)
            .await
    }

    /// Download endpoint of a report tier.
    pub fn report_url(&self, user_id: i64, tier: ReportTier) -> String {
        let segment = match tier {
            ReportTier::Premium => "premium-report",
            _ => "report",
        };
        self.url(&format!("/download/{}/{}", segment, user_id))
    }

    /// Link handed to the host for an attachment download. `timestamp_ms`
    /// defeats intermediate caches.
    pub fn download_link(&self, user_id: i64, tier: ReportTier, timestamp_ms: i64) -> String {
        format!(
            "{}?download=1&source=telegram&t={}",
            self.report_url(user_id, tier),
            timestamp_ms
        )
    }

    /// Fetch the PDF bytes of a report.
    pub async fn fetch_report(&self, user_id: i64, tier: ReportTier) -> Result<Vec<u8>> {
        let endpoint = match tier {
            ReportTier::Premium => "download_premium_report",
            _ => "download_report",
        };
        let response = self
            .send(endpoint, self.http.get(self.report_url(user_id, tier)))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ------------------------------------------------------------------------
    // Payment & special offer
    // ------------------------------------------------------------------------

    pub async fn start_premium_payment(&self, user_id: i64) -> Result<PaymentLink> {
        self.post_json::<(), _>(
            "start_premium_payment",
            &format!("/user/{}/start-premium-payment", user_id),
            None,
        )
        .await
    }

    pub async fn special_offer_timer(&self, user_id: i64) -> Result<TimerResponse> {
        self.get_json(
            "special_offer_timer",
            &format!("/user/{}/special-offer-timer", user_id),
        )
        .await
    }

    pub async fn reset_special_offer_timer(&self, user_id: i64) -> Result<ActionResponse> {
        self.post_json::<(), _>(
            "reset_special_offer_timer",
            &format!("/user/{}/reset-special-offer-timer", user_id),
            None,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverallStatus, PaymentStatus, ReportState};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> BackendClient {
        BackendClient::with_url(&server.url("/api")).unwrap()
    }

    #[tokio::test]
    async fn get_profile_parses_user() {
        let server = MockServer::start_async().await;

        let profile_mock = server.mock(|when, then| {
            when.method(GET).path("/api/user/42/profile");
            then.status(200).json_body(json!({
                "status": "success",
                "user": { "telegram_id": 42, "name": "Anna", "age": 31, "gender": "female" },
                "payment_status": "completed"
            }));
        });

        let profile = client(&server).get_profile(42).await.unwrap();

        assert!(profile.is_complete());
        assert_eq!(profile.payment_status(), Some(PaymentStatus::Completed));
        profile_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn save_profile_posts_json_body() {
        let server = MockServer::start_async().await;

        let save_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/user/7/profile")
                .json_body(json!({ "name": "Ivan", "age": 40, "gender": "male" }));
            then.status(200).json_body(json!({ "status": "success" }));
        });

        let profile = UserProfile {
            name: "Ivan".into(),
            age: 40,
            gender: "male".into(),
        };
        let result = client(&server).save_profile(7, &profile).await.unwrap();

        assert_eq!(result.status.as_deref(), Some("success"));
        save_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn submit_answer_sends_text_payload() {
        let server = MockServer::start_async().await;

        let answer_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/user/7/answer")
                .json_body(json!({ "text_answer": "my answer", "answer_type": "text" }));
            then.status(200).json_body(json!({
                "status": "test_completed",
                "message": "done"
            }));
        });

        let response = client(&server).submit_answer(7, "my answer").await.unwrap();

        assert!(response.test_completed());
        answer_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn non_success_status_becomes_http_error() {
        let server = MockServer::start_async().await;

        let question_mock = server.mock(|when, then| {
            when.method(GET).path("/api/user/7/current-question");
            then.status(400)
                .json_body(json!({ "detail": "Test already completed" }));
        });

        let err = client(&server).get_current_question(7).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.is_test_completed());
        assert!(err.to_string().contains("HTTP error! status: 400"));
        question_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn reports_status_round_trip() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/user/9/reports-status");
            then.status(200).json_body(json!({
                "status": "success",
                "is_paid": false,
                "available_report": { "status": "processing", "type": "free" },
                "free_report_status": { "status": "processing" }
            }));
        });

        let status = client(&server).reports_status(9).await.unwrap();

        assert_eq!(status.status, Some(OverallStatus::Success));
        assert_eq!(status.free_state(), Some(ReportState::Processing));
        assert!(status.is_processing());
    }

    #[tokio::test]
    async fn init_data_header_is_forwarded() {
        let server = MockServer::start_async().await;

        let progress_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/user/5/progress")
                .header(INIT_DATA_HEADER, "query_id=abc&hash=def");
            then.status(200).json_body(json!({
                "user": { "is_paid": false },
                "progress": { "answered": 2, "total": 15 }
            }));
        });

        let progress = client(&server)
            .with_init_data("query_id=abc&hash=def")
            .get_progress(5)
            .await
            .unwrap();

        assert_eq!(progress.progress.answered, 2);
        progress_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn action_endpoints_use_post() {
        let server = MockServer::start_async().await;

        let mut mocks = Vec::new();
        for path in [
            "/api/user/3/generate-report",
            "/api/user/3/generate-premium-report",
            "/api/user/3/stop-report-generation",
            "/api/user/3/reset-test",
            "/api/user/3/reset-special-offer-timer",
        ] {
            mocks.push(server.mock(|when, then| {
                when.method(POST).path(path);
                then.status(200).json_body(json!({ "status": "success" }));
            }));
        }

        let api = client(&server);
        api.generate_report(3).await.unwrap();
        api.generate_premium_report(3).await.unwrap();
        api.stop_report_generation(3).await.unwrap();
        api.reset_test(3).await.unwrap();
        api.reset_special_offer_timer(3).await.unwrap();

        for mock in mocks {
            mock.assert_calls(1);
        }
    }

    #[tokio::test]
    async fn start_payment_returns_link() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/api/user/3/start-premium-payment");
            then.status(200).json_body(json!({
                "status": "success",
                "payment_link": "https://pay.example/abc"
            }));
        });

        let link = client(&server).start_premium_payment(3).await.unwrap();
        assert_eq!(link.link(), Some("https://pay.example/abc"));
    }

    #[tokio::test]
    async fn special_offer_timer_parses_pricing() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/user/3/special-offer-timer");
            then.status(200).json_body(json!({
                "status": "success",
                "timer": { "remaining_seconds": 3600, "time_string": "01:00:00", "is_expired": false },
                "pricing": { "current_price": 1, "original_price": 4999, "is_offer_active": true }
            }));
        });

        let timer = client(&server).special_offer_timer(3).await.unwrap();
        let pricing = timer.pricing.unwrap();
        assert_eq!(pricing.original_price, 4999);
        assert_eq!(timer.timer.unwrap().remaining_seconds, 3600);
    }

    #[tokio::test]
    async fn fetch_report_returns_bytes() {
        let server = MockServer::start_async().await;

        let download_mock = server.mock(|when, then| {
            when.method(GET).path("/api/download/premium-report/3");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4 fake");
        });

        let bytes = client(&server)
            .fetch_report(3, ReportTier::Premium)
            .await
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        download_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn connection_failure_is_connection_error() {
        let api = BackendClient::with_url("http://127.0.0.1:1/api").unwrap();
        let err = api.get_profile(1).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionError(_)));
    }

    #[test]
    fn download_link_has_cache_busting_query() {
        let api = BackendClient::with_url("https://prizma.example/api/").unwrap();

        assert_eq!(
            api.report_url(12, ReportTier::Free),
            "https://prizma.example/api/download/report/12"
        );
        assert_eq!(
            api.download_link(12, ReportTier::Premium, 1700000000000),
            "https://prizma.example/api/download/premium-report/12?download=1&source=telegram&t=1700000000000"
        );
    }
}
