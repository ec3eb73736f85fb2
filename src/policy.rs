//! Report-readiness redirect policy.
//!
//! A single pure function from a [`ReportsStatus`] payload to the next step.
//! Rules are evaluated in a fixed order and the first match wins; an
//! unexpected payload yields [`Action::NoMatch`], never an error.

use std::time::Duration;

use crate::config::{Config, FAILED_REDIRECT_DELAY_MS};
use crate::models::{OverallStatus, ReportState, ReportTier, ReportsStatus};
use crate::routing::Page;

pub const PREMIUM_PROCESSING_NOTICE: &str =
    "Your premium report is already being generated. We will send it to you in the bot as soon as it is ready.";
pub const FREE_PROCESSING_NOTICE: &str =
    "Your report is being generated. We will send it to you in the bot as soon as it is ready.";
pub const FAILED_NOTICE: &str =
    "Report generation failed. Please go through the questions again.";

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    TestNotCompleted,
    PremiumReady,
    FreeReady,
    PremiumProcessing,
    PremiumPaid,
    PremiumPaymentRequired,
    FreeProcessing,
    NotAvailable,
    Failed,
    PaymentRequired,
    PremiumNotStarted,
    NoMatch,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::TestNotCompleted => "test_not_completed",
            Rule::PremiumReady => "premium_ready",
            Rule::FreeReady => "free_ready",
            Rule::PremiumProcessing => "premium_processing",
            Rule::PremiumPaid => "premium_paid",
            Rule::PremiumPaymentRequired => "premium_payment_required",
            Rule::FreeProcessing => "free_processing",
            Rule::NotAvailable => "not_available",
            Rule::Failed => "failed",
            Rule::PaymentRequired => "payment_required",
            Rule::PremiumNotStarted => "premium_not_started",
            Rule::NoMatch => "no_match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(Page),
    /// Show `alert`, wait `delay`, then navigate.
    NavigateAfter {
        page: Page,
        delay: Duration,
        alert: String,
    },
    /// Show the notice and close the app.
    CloseWithNotice(String),
    /// Start premium generation, then keep polling.
    GeneratePremium,
    KeepPolling,
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub rule: Rule,
    pub action: Action,
    /// Tier to remember under `last_report_type`.
    pub remember_tier: Option<ReportTier>,
}

impl Decision {
    fn new(rule: Rule, action: Action) -> Self {
        Self {
            rule,
            action,
            remember_tier: None,
        }
    }

    fn remembering(mut self, tier: ReportTier) -> Self {
        self.remember_tier = Some(tier);
        self
    }

    /// Page this decision leads to, immediate or delayed.
    pub fn target(&self) -> Option<Page> {
        match &self.action {
            Action::Navigate(page) | Action::NavigateAfter { page, .. } => Some(*page),
            _ => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.rule != Rule::NoMatch
    }
}

/// Tunables of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub failed_redirect_delay: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            failed_redirect_delay: Duration::from_millis(FAILED_REDIRECT_DELAY_MS),
        }
    }
}

impl Policy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            failed_redirect_delay: config.failed_redirect_delay(),
        }
    }

    pub fn decide(&self, status: &ReportsStatus) -> Decision {
        let available = status.available_state();
        let tier = status.available_tier();
        let free = status.free_state();
        let premium = status.premium_state();

        if status.status == Some(OverallStatus::TestNotCompleted) {
            return Decision::new(Rule::TestNotCompleted, Action::Navigate(Page::Question));
        }

        if available == Some(ReportState::Ready) && tier == Some(ReportTier::Premium) {
            let action = if status.confirmed_pdf_path().is_some() {
                Action::Navigate(Page::Download)
            } else {
                Action::KeepPolling
            };
            return Decision::new(Rule::PremiumReady, action).remembering(ReportTier::Premium);
        }

        if available == Some(ReportState::Ready) && tier == Some(ReportTier::Free) {
            return Decision::new(Rule::FreeReady, Action::Navigate(Page::PriceOffer))
                .remembering(ReportTier::Free);
        }

        if premium == Some(ReportState::Processing) {
            return Decision::new(
                Rule::PremiumProcessing,
                Action::CloseWithNotice(PREMIUM_PROCESSING_NOTICE.to_string()),
            );
        }

        if free == Some(ReportState::PremiumPaid) {
            return Decision::new(Rule::PremiumPaid, Action::GeneratePremium);
        }

        if premium == Some(ReportState::PaymentRequired) {
            return Decision::new(Rule::PremiumPaymentRequired, Action::Navigate(Page::Price));
        }

        if free == Some(ReportState::Processing) {
            return Decision::new(
                Rule::FreeProcessing,
                Action::CloseWithNotice(FREE_PROCESSING_NOTICE.to_string()),
            );
        }

        match available {
            Some(ReportState::NotAvailable) => {
                Decision::new(Rule::NotAvailable, Action::Navigate(Page::Question))
            }
            Some(ReportState::Failed) => Decision::new(
                Rule::Failed,
                Action::NavigateAfter {
                    page: Page::Question,
                    delay: self.failed_redirect_delay,
                    alert: FAILED_NOTICE.to_string(),
                },
            ),
            Some(ReportState::PaymentRequired) => {
                Decision::new(Rule::PaymentRequired, Action::Navigate(Page::Price))
            }
            Some(ReportState::NotStarted) if tier == Some(ReportTier::Premium) => {
                Decision::new(Rule::PremiumNotStarted, Action::GeneratePremium)
            }
            _ => Decision::new(Rule::NoMatch, Action::NoMatch),
        }
    }
}

/// [`Policy::decide`] with default tunables.
pub fn decide(status: &ReportsStatus) -> Decision {
    Policy::default().decide(status)
}
