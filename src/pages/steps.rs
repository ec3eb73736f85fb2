//! Onboarding steps page.

use super::{ButtonAction, Controls, PageOutcome, View};
use crate::error::Result;
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden()
        .with_main("Continue", ButtonAction::Navigate(Page::Price))
        .with_back(Page::Index)
}

pub async fn load(_session: &Session) -> Result<PageOutcome> {
    Ok(PageOutcome::Stay(View::Static))
}
