//! Special offer shown after the free report: countdown, pricing, free
//! download and premium checkout.

use tracing::{debug, info, warn};

use super::{now_ms, start_checkout, ButtonAction, Controls, PageOutcome, View};
use crate::bridge::ImpactStyle;
use crate::error::Result;
use crate::models::{PaymentStatus, ReportState, ReportTier, ReportsStatus};
use crate::offer::{self, OfferView};
use crate::routing::Page;
use crate::session::Session;

pub const DOWNLOAD_STARTED: &str = "The report download has started.";
pub const REPORT_NOT_READY: &str = "The report is not ready yet. Please try again later.";
pub const DOWNLOAD_ERROR: &str = "Failed to download the report.";
pub const PREMIUM_ONLY: &str = "Only the premium report is available.";

pub fn controls() -> Controls {
    Controls::hidden().with_main("Close", ButtonAction::CloseApp)
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();
    let storage = session.storage();
    let returning = offer::restore_offer_return(storage, now_ms());

    match session.api().get_profile(user_id).await {
        Ok(profile) => match profile.payment_status() {
            Some(PaymentStatus::Completed) => return Ok(PageOutcome::Redirect(Page::Question)),
            Some(PaymentStatus::Pending) => return Ok(PageOutcome::Redirect(Page::Payment)),
            status => {
                debug!(user_id, ?status, "Keeping user on the offer");
                offer::remember_offer_return(storage, now_ms());
            }
        },
        Err(err) => warn!(user_id, "Payment status unavailable: {}", err),
    }

    let view = match session.api().special_offer_timer(user_id).await {
        Ok(timer) => OfferView::from_timer(&timer, returning.was_on_offer),
        Err(err) => {
            warn!(user_id, "Offer timer unavailable: {}", err);
            Some(OfferView::fallback())
        }
    };

    Ok(PageOutcome::Stay(View::PriceOffer(view)))
}

pub async fn download_free_report(session: &Session) -> Result<PageOutcome> {
    let bridge = session.bridge();
    let user_id = session.user_id();
    bridge.haptic(ImpactStyle::Medium);

    match session.api().reports_status(user_id).await {
        Ok(status) if free_report_ready(&status) => {
            let link = session
                .api()
                .download_link(user_id, ReportTier::Free, now_ms());
            bridge.open_link(&link);
            bridge.haptic(ImpactStyle::Light);
            bridge.show_alert(DOWNLOAD_STARTED);
            info!(user_id, "Free report download opened");
        }
        Ok(status) if status.available_state() == Some(ReportState::Ready) => {
            debug!(user_id, tier = ?status.available_tier(), "Ready report is not the free one");
            bridge.show_alert(PREMIUM_ONLY);
        }
        Ok(status) => {
            debug!(user_id, state = ?status.free_state(), "Free report not ready");
            bridge.show_alert(REPORT_NOT_READY);
        }
        Err(err) => {
            warn!(user_id, "Free report status failed: {}", err);
            bridge.show_alert(DOWNLOAD_ERROR);
        }
    }
    Ok(PageOutcome::Unchanged)
}

/// A ready available report decides by its tier. Otherwise the free tier
/// status is consulted.
fn free_report_ready(status: &ReportsStatus) -> bool {
    if status.available_state() == Some(ReportState::Ready) {
        return status.available_tier() == Some(ReportTier::Free);
    }
    status.free_state() == Some(ReportState::Ready)
}

pub async fn start_payment(session: &Session) -> Result<PageOutcome> {
    Ok(start_checkout(session).await)
}
