//! Questionnaire page: one question at a time with a minimum answer length.

use tracing::{debug, info, warn};

use super::{Controls, PageOutcome, View};
use crate::bridge::ImpactStyle;
use crate::error::Result;
use crate::models::{CurrentQuestion, PaymentStatus};
use crate::routing::Page;
use crate::session::Session;
use crate::storage::keys;

pub const LOAD_ERROR: &str = "Failed to load the question. Please try refreshing the page.";
pub const EMPTY_ANSWER: &str = "Please enter your answer.";
pub const SEND_ERROR: &str = "Failed to send the answer.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub current: u32,
    pub total: u32,
    /// First visit: show the welcome modal.
    pub show_welcome: bool,
    pub min_answer_length: usize,
}

impl QuestionView {
    fn from_current(current: &CurrentQuestion, show_welcome: bool, min_answer_length: usize) -> Option<Self> {
        let question = current.question.as_ref()?;
        let progress = current.progress.unwrap_or_default();
        Some(Self {
            id: question.id,
            text: question.text.clone(),
            current: progress.current,
            total: progress.total,
            show_welcome,
            min_answer_length,
        })
    }
}

/// Answer being typed, measured in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerDraft<'a> {
    text: &'a str,
    min_length: usize,
}

impl<'a> AnswerDraft<'a> {
    pub fn new(text: &'a str, min_length: usize) -> Self {
        Self {
            text: text.trim(),
            min_length,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.min_length.saturating_sub(self.len())
    }

    pub fn is_ready(&self) -> bool {
        self.remaining() == 0
    }

    /// Label of the submit button.
    pub fn button_label(&self) -> String {
        match self.remaining() {
            0 => "Next question".to_string(),
            n => format!("{} more characters", n),
        }
    }
}

pub fn controls() -> Controls {
    Controls::hidden().with_back(Page::Login)
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();
    let api = session.api();

    match api.get_profile(user_id).await {
        Ok(profile) if profile.is_complete() => {}
        Ok(_) => {
            debug!(user_id, "Profile incomplete");
            return Ok(PageOutcome::Redirect(Page::Login));
        }
        Err(err) => {
            warn!(user_id, "Profile check failed: {}", err);
            return Ok(PageOutcome::Redirect(Page::Login));
        }
    }

    let current = match api.get_current_question(user_id).await {
        Ok(current) => current,
        Err(err) if err.is_test_completed() => {
            info!(user_id, "Questionnaire already completed");
            return Ok(PageOutcome::Redirect(Page::Loading));
        }
        Err(err) => {
            warn!(user_id, "Question load failed: {}", err);
            if offer_if_unpaid(session).await == Some(true) {
                return Ok(PageOutcome::Redirect(Page::PriceOffer));
            }
            return Ok(PageOutcome::Stay(View::QuestionError(LOAD_ERROR.to_string())));
        }
    };

    let min_length = session.config().min_answer_length;
    match QuestionView::from_current(&current, !session.storage().flag(keys::WELCOME_SEEN), min_length) {
        Some(view) => {
            if view.show_welcome {
                show_welcome(session);
            }
            Ok(PageOutcome::Stay(View::Question(view)))
        }
        None => {
            // Out of questions for this tier.
            let page = if offer_if_unpaid(session).await == Some(true) {
                Page::PriceOffer
            } else {
                Page::Loading
            };
            Ok(PageOutcome::Redirect(page))
        }
    }
}

fn show_welcome(session: &Session) {
    session.bridge().haptic(ImpactStyle::Light);
    if let Err(err) = session.storage().set_flag(keys::WELCOME_SEEN) {
        warn!("Failed to store welcome flag: {}", err);
    }
}

/// Close the welcome modal.
pub fn dismiss_welcome(session: &Session) {
    session.bridge().haptic(ImpactStyle::Light);
}

/// `Some(true)` when the user has not paid, `None` when the profile is unavailable.
async fn offer_if_unpaid(session: &Session) -> Option<bool> {
    match session.api().get_profile(session.user_id()).await {
        Ok(profile) => Some(profile.payment_status() != Some(PaymentStatus::Completed)),
        Err(err) => {
            warn!("Payment status unavailable: {}", err);
            None
        }
    }
}

/// Send the current answer and move to the next question or the report.
pub async fn submit_answer(session: &Session, text: &str) -> Result<PageOutcome> {
    let bridge = session.bridge();
    let draft = AnswerDraft::new(text, session.config().min_answer_length);

    if draft.is_empty() {
        bridge.show_alert(EMPTY_ANSWER);
        return Ok(PageOutcome::Unchanged);
    }
    if !draft.is_ready() {
        bridge.show_alert(&format!(
            "The answer must contain at least {} characters.",
            session.config().min_answer_length
        ));
        return Ok(PageOutcome::Unchanged);
    }

    let user_id = session.user_id();
    let response = match session.api().submit_answer(user_id, draft.text()).await {
        Ok(response) => response,
        Err(err) if err.is_test_completed() => return Ok(PageOutcome::Redirect(Page::Loading)),
        Err(err) => {
            warn!(user_id, "Answer submit failed: {}", err);
            bridge.show_alert(SEND_ERROR);
            return Ok(PageOutcome::Unchanged);
        }
    };
    bridge.haptic(ImpactStyle::Medium);

    if response.test_completed() {
        return Ok(PageOutcome::Redirect(Page::Loading));
    }

    match session.api().get_progress(user_id).await {
        Ok(progress) => {
            let limit = progress.questions_limit();
            debug!(user_id, answered = progress.progress.answered, limit, "Answer accepted");
            if progress.progress.answered >= limit {
                Ok(PageOutcome::Redirect(Page::Loading))
            } else {
                Ok(PageOutcome::Reload)
            }
        }
        Err(err) => {
            warn!(user_id, "Progress check after answer failed: {}", err);
            Ok(PageOutcome::Reload)
        }
    }
}
