//! Shown when the bot reports a failed payment.

use super::{ButtonAction, Controls, PageOutcome, View};
use crate::error::Result;
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden().with_main("Try again", ButtonAction::Navigate(Page::PriceOffer))
}

pub async fn load(_session: &Session) -> Result<PageOutcome> {
    Ok(PageOutcome::Stay(View::Static))
}
