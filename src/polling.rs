//! Polling loops: report readiness and payment confirmation.
//!
//! Both loops are sequential: one request, then a sleep. Nothing runs
//! concurrently and the only cancellation is the payment monitor's timeout.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics;
use crate::models::PaymentStatus;
use crate::policy::{Action, Decision, Policy};
use crate::routing::Page;
use crate::session::Session;
use crate::storage::keys;

/// Effect of carrying out a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Navigate(Page),
    Closed,
    /// The decision points at the page already shown.
    Stay,
    Continue,
    Unmatched,
}

/// Perform the side effects of a policy decision on behalf of `current`.
pub async fn apply_decision(
    session: &Session,
    decision: &Decision,
    current: Option<Page>,
) -> Result<Step> {
    metrics::record_policy_decision(decision.rule.as_str());

    if let Some(tier) = decision.remember_tier {
        if let Err(err) = session.storage().set(keys::LAST_REPORT_TYPE, tier.as_str()) {
            warn!("Failed to remember report type: {}", err);
        }
    }

    let navigate = |page: Page| {
        if Some(page) == current {
            Step::Stay
        } else {
            Step::Navigate(page)
        }
    };

    let step = match &decision.action {
        Action::Navigate(page) => navigate(*page),
        Action::NavigateAfter { page, delay, alert } => {
            session.bridge().show_alert(alert);
            sleep(*delay).await;
            navigate(*page)
        }
        Action::CloseWithNotice(notice) => {
            session.bridge().show_alert(notice);
            session.bridge().close();
            Step::Closed
        }
        Action::GeneratePremium => {
            let user_id = session.user_id();
            match session.api().generate_premium_report(user_id).await {
                Ok(_) => info!(user_id, "Premium report generation started"),
                Err(err) => warn!(user_id, "Failed to start premium generation: {}", err),
            }
            Step::Continue
        }
        Action::KeepPolling => Step::Continue,
        Action::NoMatch => {
            debug!("No report rule matched");
            Step::Unmatched
        }
    };

    Ok(step)
}

/// What the poller does when no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Navigated(Page),
    Closed,
    /// Round limit reached without a terminal decision.
    Exhausted,
    /// Unmatched payload under [`UnmatchedPolicy::Stop`], or a redirect to
    /// the page being polled from.
    Stopped,
}

/// Re-checks `reports-status` until the policy reaches a terminal branch.
pub struct ReportPoller<'a> {
    session: &'a Session,
    policy: Policy,
    interval: Duration,
    error_retry: Duration,
    unmatched: UnmatchedPolicy,
    max_rounds: Option<usize>,
    current: Option<Page>,
}

impl<'a> ReportPoller<'a> {
    pub fn new(session: &'a Session) -> Self {
        let config = session.config();
        Self {
            session,
            policy: Policy::from_config(config),
            interval: config.report_poll_interval(),
            error_retry: config.error_retry(),
            unmatched: UnmatchedPolicy::Continue,
            max_rounds: None,
            current: None,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn error_retry(mut self, retry: Duration) -> Self {
        self.error_retry = retry;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn on_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn from_page(mut self, page: Page) -> Self {
        self.current = Some(page);
        self
    }

    pub async fn run(&self) -> Result<PollOutcome> {
        let user_id = self.session.user_id();
        let mut round = 0usize;

        loop {
            if self.max_rounds.is_some_and(|max| round >= max) {
                info!(user_id, rounds = round, "Report polling gave up");
                return Ok(PollOutcome::Exhausted);
            }
            round += 1;

            let status = match self.session.api().reports_status(user_id).await {
                Ok(status) => status,
                Err(err) => {
                    warn!(user_id, round, "Report status check failed: {}", err);
                    sleep(self.error_retry).await;
                    continue;
                }
            };

            let decision = self.policy.decide(&status);
            debug!(user_id, round, rule = decision.rule.as_str(), "Report status checked");

            match apply_decision(self.session, &decision, self.current).await? {
                Step::Navigate(page) => return Ok(PollOutcome::Navigated(page)),
                Step::Closed => return Ok(PollOutcome::Closed),
                Step::Stay => return Ok(PollOutcome::Stopped),
                Step::Unmatched if self.unmatched == UnmatchedPolicy::Stop => {
                    return Ok(PollOutcome::Stopped)
                }
                Step::Continue | Step::Unmatched => sleep(self.interval).await,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed,
    Failed,
    TimedOut,
}

impl PaymentOutcome {
    pub fn page(&self) -> Option<Page> {
        match self {
            PaymentOutcome::Completed => Some(Page::CompletePayment),
            PaymentOutcome::Failed => Some(Page::UncompletePayment),
            PaymentOutcome::TimedOut => None,
        }
    }
}

/// Watches the profile's payment status after the user left for checkout.
pub struct PaymentMonitor<'a> {
    session: &'a Session,
    interval: Duration,
    timeout: Duration,
}

impl<'a> PaymentMonitor<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            interval: session.config().payment_poll_interval(),
            timeout: session.config().payment_timeout(),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self) -> PaymentOutcome {
        let user_id = self.session.user_id();
        let deadline = Instant::now() + self.timeout;

        loop {
            match self.session.api().get_profile(user_id).await {
                Ok(profile) => match profile.payment_status() {
                    Some(PaymentStatus::Completed) => {
                        info!(user_id, "Payment completed");
                        return PaymentOutcome::Completed;
                    }
                    Some(PaymentStatus::Failed) => {
                        info!(user_id, "Payment failed");
                        return PaymentOutcome::Failed;
                    }
                    status => debug!(user_id, ?status, "Payment still pending"),
                },
                Err(err) => warn!(user_id, "Payment status check failed: {}", err),
            }

            if Instant::now() + self.interval > deadline {
                info!(user_id, "Payment monitoring timed out");
                return PaymentOutcome::TimedOut;
            }
            sleep(self.interval).await;
        }
    }
}
