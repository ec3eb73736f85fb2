//! Landing page. Sends returning users to wherever their report state says.

use tracing::{debug, warn};

use super::{progress_route, ButtonAction, Controls, PageOutcome, View};
use crate::error::Result;
use crate::models::OverallStatus;
use crate::policy::Policy;
use crate::polling::{apply_decision, Step};
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden().with_main("Decode me", ButtonAction::Navigate(Page::Steps))
}

/// Failures leave the user on the landing page.
pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();

    let status = match session.api().reports_status(user_id).await {
        Ok(status) => status,
        Err(err) => {
            warn!(user_id, "Reports status unavailable: {}", err);
            return Ok(PageOutcome::Stay(View::Static));
        }
    };

    if status.status == Some(OverallStatus::TestNotCompleted) {
        return Ok(match session.api().get_progress(user_id).await {
            Ok(progress) => match progress_route(&progress) {
                Some(page) => PageOutcome::Redirect(page),
                None => PageOutcome::Stay(View::Static),
            },
            Err(err) => {
                warn!(user_id, "Progress unavailable: {}", err);
                PageOutcome::Stay(View::Static)
            }
        });
    }

    let decision = Policy::from_config(session.config()).decide(&status);
    let step = apply_decision(session, &decision, Some(Page::Index)).await?;
    debug!(user_id, rule = decision.rule.as_str(), ?step, "Index routing");

    Ok(match step {
        Step::Navigate(page) => PageOutcome::Redirect(page),
        Step::Closed => PageOutcome::Closed,
        Step::Stay => PageOutcome::Stay(View::Static),
        // The loading page owns the polling.
        Step::Continue => PageOutcome::Redirect(Page::Loading),
        Step::Unmatched if status.status == Some(OverallStatus::Success) => {
            PageOutcome::Redirect(Page::Loading)
        }
        Step::Unmatched => PageOutcome::Stay(View::Static),
    })
}
