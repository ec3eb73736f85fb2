//! Tier selection: free report or premium checkout.

use tracing::{debug, warn};

use super::{profile_route, start_checkout, Controls, PageOutcome, View};
use crate::bridge::ImpactStyle;
use crate::error::Result;
use crate::models::PaymentStatus;
use crate::routing::Page;
use crate::session::Session;

pub const START_ERROR: &str = "Something went wrong. Please try again.";

pub fn controls() -> Controls {
    Controls::hidden().with_back(Page::Steps)
}

/// Label of the premium button for a user's payment and progress state.
pub fn premium_label(is_paid: bool, answered: u32) -> &'static str {
    match (is_paid, answered) {
        (true, n) if n > 0 => "Continue",
        (true, _) => "Start",
        _ => "Try",
    }
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();

    let profile = match session.api().get_profile(user_id).await {
        Ok(profile) => Some(profile),
        Err(err) => {
            warn!(user_id, "Profile unavailable on price page: {}", err);
            None
        }
    };

    if let Some(profile) = &profile {
        match profile.payment_status() {
            Some(PaymentStatus::Completed) => {
                return Ok(PageOutcome::Redirect(profile_route(profile)));
            }
            Some(PaymentStatus::Pending) => return Ok(PageOutcome::Redirect(Page::Payment)),
            _ => {}
        }
    }

    let answered = match session.api().get_progress(user_id).await {
        Ok(progress) => progress.progress.answered,
        Err(err) => {
            debug!(user_id, "Progress unavailable on price page: {}", err);
            0
        }
    };
    let is_paid = profile.as_ref().is_some_and(|p| p.is_paid());

    Ok(PageOutcome::Stay(View::Price {
        premium_label: premium_label(is_paid, answered),
    }))
}

/// Free tier: straight into the questionnaire, via the profile form if needed.
pub async fn start_free_report(session: &Session) -> Result<PageOutcome> {
    let bridge = session.bridge();
    bridge.haptic(ImpactStyle::Light);

    match session.api().get_profile(session.user_id()).await {
        Ok(profile) => Ok(PageOutcome::Redirect(profile_route(&profile))),
        Err(err) => {
            warn!("Failed to start free report: {}", err);
            bridge.show_alert(START_ERROR);
            Ok(PageOutcome::Unchanged)
        }
    }
}

/// Premium tier: paid users continue, everyone else goes to checkout.
pub async fn start_premium(session: &Session) -> Result<PageOutcome> {
    if let Ok(profile) = session.api().get_profile(session.user_id()).await {
        if profile.is_paid() {
            return Ok(PageOutcome::Redirect(profile_route(&profile)));
        }
    }
    Ok(start_checkout(session).await)
}
