//! Shown after a successful payment; sends the user back into the questionnaire.

use tracing::warn;

use super::{progress_route, ButtonAction, Controls, PageOutcome};
use crate::error::Result;
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden().with_main("Continue", ButtonAction::Navigate(Page::Question))
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();
    match session.api().get_progress(user_id).await {
        Ok(progress) => Ok(PageOutcome::Redirect(
            progress_route(&progress).unwrap_or(Page::Question),
        )),
        Err(err) => {
            warn!(user_id, "Progress check failed after payment: {}", err);
            Ok(PageOutcome::Redirect(Page::Index))
        }
    }
}
