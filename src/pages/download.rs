//! Premium report download page.

use tracing::{debug, info, warn};

use super::{now_ms, report_filename, Controls, PageOutcome, View, PAYMENT_ERROR};
use crate::bridge::ImpactStyle;
use crate::error::Result;
use crate::models::{ReportState, ReportTier};
use crate::policy::Policy;
use crate::polling::{apply_decision, Step};
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden()
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();

    let status = match session.api().reports_status(user_id).await {
        Ok(status) => status,
        Err(err) => {
            warn!(user_id, "Reports status unavailable: {}", err);
            return Ok(PageOutcome::Redirect(Page::Loading));
        }
    };

    let decision = Policy::from_config(session.config()).decide(&status);
    let step = apply_decision(session, &decision, Some(Page::Download)).await?;
    debug!(user_id, rule = decision.rule.as_str(), ?step, "Download routing");

    Ok(match step {
        Step::Stay => PageOutcome::Stay(View::Download {
            premium_ready: true,
        }),
        Step::Navigate(page) => PageOutcome::Redirect(page),
        Step::Closed => PageOutcome::Closed,
        Step::Unmatched if status.free_state() == Some(ReportState::Ready) => {
            PageOutcome::Redirect(Page::PriceOffer)
        }
        Step::Continue | Step::Unmatched => PageOutcome::Redirect(Page::Loading),
    })
}

pub async fn download_report(session: &Session, tier: ReportTier) -> Result<PageOutcome> {
    let bridge = session.bridge();
    let user_id = session.user_id();

    if tier == ReportTier::Premium {
        bridge.show_alert(&format!(
            "Your premium report will be downloaded as {}",
            report_filename(user_id, tier)
        ));
    }

    let link = session.api().download_link(user_id, tier, now_ms());
    bridge.open_link(&link);
    bridge.haptic(match tier {
        ReportTier::Premium => ImpactStyle::Heavy,
        _ => ImpactStyle::Light,
    });
    info!(user_id, tier = tier.as_str(), "Report download opened");

    Ok(PageOutcome::Unchanged)
}

/// Opens checkout in the host instead of leaving the page.
pub async fn start_payment(session: &Session) -> Result<PageOutcome> {
    let bridge = session.bridge();
    let user_id = session.user_id();

    match session.api().start_premium_payment(user_id).await {
        Ok(payment) => match payment.link() {
            Some(link) => bridge.open_link(link),
            None => bridge.show_alert(PAYMENT_ERROR),
        },
        Err(err) => {
            warn!(user_id, "Failed to start payment: {}", err);
            bridge.show_alert(PAYMENT_ERROR);
        }
    }
    Ok(PageOutcome::Unchanged)
}
