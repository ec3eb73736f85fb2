//! Report generation page: starts the free report and polls until the
//! report-readiness policy leads somewhere.

use tracing::{info, warn};

use super::{Controls, PageOutcome, View};
use crate::error::Result;
use crate::polling::{PollOutcome, ReportPoller, UnmatchedPolicy};
use crate::routing::Page;
use crate::session::Session;

pub const GENERATION_ERROR: &str = "Failed to start report generation.";

pub fn controls() -> Controls {
    Controls::hidden()
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();

    if let Err(err) = session.api().generate_report(user_id).await {
        warn!(user_id, "Report generation request failed: {}", err);
        session.bridge().show_alert(GENERATION_ERROR);
        return Ok(PageOutcome::Stay(View::Static));
    }
    info!(user_id, "Report generation requested");

    let outcome = ReportPoller::new(session)
        .from_page(Page::Loading)
        .on_unmatched(UnmatchedPolicy::Continue)
        .run()
        .await?;

    Ok(match outcome {
        PollOutcome::Navigated(page) => PageOutcome::Redirect(page),
        PollOutcome::Closed => PageOutcome::Closed,
        PollOutcome::Exhausted | PollOutcome::Stopped => PageOutcome::Stay(View::Static),
    })
}
