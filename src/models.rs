//! Wire types for the backend REST API.
//!
//! The backend owns every entity; the client only reads these shapes. Enums
//! carry an `Unknown` catch-all so an unexpected server value never fails
//! deserialization of the whole payload.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// `null` reads as the type's default, the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 (offset converted to UTC) or a naive timestamp with a
/// `T` or space separator. Anything else reads as `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Report tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTier {
    Free,
    Premium,
    #[serde(other)]
    Unknown,
}

impl ReportTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTier::Free => "free",
            ReportTier::Premium => "premium",
            ReportTier::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(ReportTier::Free),
            "premium" => Some(ReportTier::Premium),
            _ => None,
        }
    }
}

/// Generation state of a single report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    NotStarted,
    Processing,
    Ready,
    Failed,
    PaymentRequired,
    NotAvailable,
    /// Reported on the free tier once the user has paid for premium.
    PremiumPaid,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Top-level `status` of the reports-status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    TestNotCompleted,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Body of `POST /user/{id}/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUser {
    #[serde(default)]
    pub telegram_id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub special_offer_started_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: Option<ProfileUser>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

impl ProfileResponse {
    /// Name, a positive age and a gender are all present.
    pub fn is_complete(&self) -> bool {
        self.user.as_ref().is_some_and(|user| {
            let has_name = user.name.as_deref().is_some_and(|n| !n.trim().is_empty());
            let has_age = user.age.is_some_and(|age| age > 0);
            let has_gender = user.gender.as_deref().is_some_and(|g| !g.is_empty());
            has_name && has_age && has_gender
        })
    }

    /// Payment status, from the top level or the nested user object.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status
            .or_else(|| self.user.as_ref().and_then(|u| u.payment_status))
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status() == Some(PaymentStatus::Completed)
    }
}

// ============================================================================
// Progress & questions
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub answered: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub free_questions_limit: Option<u32>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl Progress {
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.answered >= self.total
    }

    pub fn has_started(&self) -> bool {
        self.answered > 0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressUser {
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub test_completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub user: Option<ProgressUser>,
    #[serde(default)]
    pub progress: Progress,
}

impl ProgressResponse {
    /// Answers required before the report: the free limit for unpaid users,
    /// the full questionnaire otherwise.
    pub fn questions_limit(&self) -> u32 {
        let is_paid = self.user.is_some_and(|u| u.is_paid);
        if is_paid {
            self.progress.total
        } else {
            self.progress
                .free_questions_limit
                .unwrap_or(self.progress.total)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub order_number: Option<u32>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub allow_voice: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuestionProgress {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub answered: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentQuestion {
    #[serde(default)]
    pub question: Option<Question>,
    #[serde(default)]
    pub progress: Option<QuestionProgress>,
    #[serde(default)]
    pub user: Option<ProgressUser>,
}

/// Body of `POST /user/{id}/answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub text_answer: String,
    pub answer_type: String,
}

impl AnswerRequest {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            text_answer: answer.into(),
            answer_type: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub next_question: Option<Question>,
    #[serde(default)]
    pub progress: Option<QuestionProgress>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnswerResponse {
    pub fn test_completed(&self) -> bool {
        self.status.as_deref() == Some("test_completed")
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReportState,
    #[serde(default, rename = "type")]
    pub tier: Option<ReportTier>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReportState,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `GET /user/{id}/reports-status`.
///
/// `free_report`/`premium_report` are legacy spellings that some responses
/// carried; they are consulted only when the canonical key is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsStatus {
    #[serde(default)]
    pub status: Option<OverallStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub test_completed: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_paid: bool,
    #[serde(default)]
    pub available_report: Option<AvailableReport>,
    #[serde(default)]
    pub free_report_status: Option<TierStatus>,
    #[serde(default)]
    pub premium_report_status: Option<TierStatus>,
    #[serde(default, skip_serializing)]
    free_report: Option<TierStatus>,
    #[serde(default, skip_serializing)]
    premium_report: Option<TierStatus>,
}

impl ReportsStatus {
    pub fn free(&self) -> Option<&TierStatus> {
        self.free_report_status
            .as_ref()
            .or(self.free_report.as_ref())
    }

    pub fn premium(&self) -> Option<&TierStatus> {
        self.premium_report_status
            .as_ref()
            .or(self.premium_report.as_ref())
    }

    pub fn free_state(&self) -> Option<ReportState> {
        self.free().map(|s| s.status)
    }

    pub fn premium_state(&self) -> Option<ReportState> {
        self.premium().map(|s| s.status)
    }

    pub fn available_state(&self) -> Option<ReportState> {
        self.available_report.as_ref().map(|r| r.status)
    }

    pub fn available_tier(&self) -> Option<ReportTier> {
        self.available_report.as_ref().and_then(|r| r.tier)
    }

    /// Path of a generated PDF, if the backend has confirmed one.
    pub fn confirmed_pdf_path(&self) -> Option<&str> {
        let available = self
            .available_report
            .as_ref()
            .and_then(|r| r.report_path.as_deref());
        let premium = self.premium().and_then(|s| s.report_path.as_deref());

        available
            .into_iter()
            .chain(premium)
            .find(|path| path.to_ascii_lowercase().ends_with(".pdf"))
    }

    /// True if any tier reports a running generation.
    pub fn is_processing(&self) -> bool {
        [
            self.available_state(),
            self.free_state(),
            self.premium_state(),
        ]
        .contains(&Some(ReportState::Processing))
    }
}

/// Response of generate/reset/stop endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Payment & special offer
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentLink {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_link: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentLink {
    /// Link to follow, present only on a successful response.
    pub fn link(&self) -> Option<&str> {
        if self.status.as_deref() == Some("success") {
            self.payment_link.as_deref().filter(|l| !l.is_empty())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialOfferTimer {
    pub remaining_seconds: i64,
    #[serde(default)]
    pub time_string: String,
    #[serde(default)]
    pub is_expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub current_price: u64,
    pub original_price: u64,
    pub is_offer_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timer: Option<SpecialOfferTimer>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
}
