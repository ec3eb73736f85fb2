//! Page controllers.
//!
//! Each page module exposes `controls()` (what the host's main and back
//! buttons do on that page), `load(&Session)` (the on-open checks, which may
//! redirect) and the page's user actions. Everything returns a
//! [`PageOutcome`]; only [`crate::app::App`] turns outcomes into navigation.

pub mod answers;
pub mod complete_payment;
pub mod download;
pub mod index;
pub mod loading;
pub mod login;
pub mod payment;
pub mod price;
pub mod price_offer;
pub mod question;
pub mod steps;
pub mod uncomplete_payment;

use tracing::{debug, warn};

use crate::bridge::{HostBridge, ImpactStyle};
use crate::error::Result;
use crate::models::{ProfileResponse, ProgressResponse, ReportTier};
use crate::offer::OfferView;
use crate::routing::Page;
use crate::session::Session;

pub use login::{LoginView, ProfileForm};
pub use question::{AnswerDraft, QuestionView};

pub const PAYMENT_ERROR: &str = "Failed to create the payment. Please try again later.";

/// Result of loading a page or running one of its actions.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Stay(View),
    Redirect(Page),
    /// Leave the app for an external URL (checkout, file download).
    External(String),
    /// Re-run the current page's `load`.
    Reload,
    /// Action finished without changing what is shown.
    Unchanged,
    Closed,
}

/// Page-specific data to render.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Static,
    Login(LoginView),
    Question(QuestionView),
    QuestionError(String),
    Price { premium_label: &'static str },
    PriceOffer(Option<OfferView>),
    Download { premium_ready: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Navigate(Page),
    CloseApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainButton {
    pub text: &'static str,
    pub action: ButtonAction,
}

/// Host button wiring of a page. `None` hides the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub main: Option<MainButton>,
    pub back: Option<Page>,
}

impl Controls {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn with_main(mut self, text: &'static str, action: ButtonAction) -> Self {
        self.main = Some(MainButton { text, action });
        self
    }

    pub fn with_back(mut self, page: Page) -> Self {
        self.back = Some(page);
        self
    }

    pub fn apply(&self, bridge: &dyn HostBridge) {
        match &self.main {
            Some(button) => bridge.show_main_button(button.text),
            None => bridge.hide_main_button(),
        }
        match self.back {
            Some(_) => bridge.show_back_button(),
            None => bridge.hide_back_button(),
        }
    }
}

pub fn controls(page: Page) -> Controls {
    match page {
        Page::Index => index::controls(),
        Page::Steps => steps::controls(),
        Page::Login => login::controls(),
        Page::Question => question::controls(),
        Page::Loading => loading::controls(),
        Page::Answers => answers::controls(),
        Page::Price => price::controls(),
        Page::PriceOffer => price_offer::controls(),
        Page::Payment => payment::controls(),
        Page::Download => download::controls(),
        Page::CompletePayment => complete_payment::controls(),
        Page::UncompletePayment => uncomplete_payment::controls(),
    }
}

pub async fn load(page: Page, session: &Session) -> Result<PageOutcome> {
    debug!(page = page.name(), user_id = session.user_id(), "Loading page");
    match page {
        Page::Index => index::load(session).await,
        Page::Steps => steps::load(session).await,
        Page::Login => login::load(session).await,
        Page::Question => question::load(session).await,
        Page::Loading => loading::load(session).await,
        Page::Answers => answers::load(session).await,
        Page::Price => price::load(session).await,
        Page::PriceOffer => price_offer::load(session).await,
        Page::Payment => payment::load(session).await,
        Page::Download => download::load(session).await,
        Page::CompletePayment => complete_payment::load(session).await,
        Page::UncompletePayment => uncomplete_payment::load(session).await,
    }
}

/// Where progress sends a user: everything answered goes to the report,
/// a started questionnaire resumes.
pub(crate) fn progress_route(progress: &ProgressResponse) -> Option<Page> {
    let progress = progress.progress;
    if progress.is_finished() {
        Some(Page::Loading)
    } else if progress.has_started() {
        Some(Page::Question)
    } else {
        None
    }
}

/// Questions need a complete profile first.
pub(crate) fn profile_route(profile: &ProfileResponse) -> Page {
    if profile.is_complete() {
        Page::Question
    } else {
        Page::Login
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Suggested file name of a downloaded report.
pub fn report_filename(user_id: i64, tier: ReportTier) -> String {
    match tier {
        ReportTier::Premium => format!("prizma-premium-report-{}.pdf", user_id),
        _ => format!("prizma-report-{}.pdf", user_id),
    }
}

/// Ask the backend for a checkout link and leave the app for it.
pub(crate) async fn start_checkout(session: &Session) -> PageOutcome {
    let bridge = session.bridge();
    let user_id = session.user_id();

    match session.api().start_premium_payment(user_id).await {
        Ok(payment) => match payment.link() {
            Some(link) => {
                bridge.haptic(ImpactStyle::Light);
                PageOutcome::External(link.to_string())
            }
            None => {
                warn!(user_id, message = ?payment.message, "Payment link missing");
                bridge.show_alert(PAYMENT_ERROR);
                PageOutcome::Unchanged
            }
        },
        Err(err) => {
            warn!(user_id, "Failed to start payment: {}", err);
            bridge.show_alert(PAYMENT_ERROR);
            PageOutcome::Unchanged
        }
    }
}
